use super::model::{RowMatch, SimilarityModel};
use super::neighbors::is_closer;
use super::table::TrackTable;
use crate::error::{MatchError, MatchResult};
use serde::{Deserialize, Serialize};

/// The best match between the listener's tracks and the playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub favourite_song: String,
    pub most_similar_song: String,
    pub distance: f64,
}

/// A per-row match resolved to display names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPrediction {
    pub favourite_song: String,
    pub most_similar_song: String,
    pub distance: f64,
}

/// Every query row's nearest reference track, in query table order
pub fn predict_rows(
    model: &SimilarityModel,
    query: &TrackTable,
    reference: &TrackTable,
) -> MatchResult<Vec<RowPrediction>> {
    ensure_not_empty(query, reference)?;
    model
        .query(query)?
        .into_iter()
        .map(|m| {
            let (favourite_song, most_similar_song) = resolve(&m, query, reference)?;
            Ok(RowPrediction {
                favourite_song,
                most_similar_song,
                distance: m.distance,
            })
        })
        .collect()
}

/// The single closest (query, reference) pair across the whole query table.
/// Equal distances keep the earliest query row.
pub fn predict(
    model: &SimilarityModel,
    query: &TrackTable,
    reference: &TrackTable,
) -> MatchResult<PredictionResult> {
    ensure_not_empty(query, reference)?;
    let matches = model.query(query)?;

    let best = matches
        .iter()
        .copied()
        .reduce(|best, m| if is_closer(m.distance, best.distance) { m } else { best })
        .ok_or_else(|| MatchError::InsufficientData("no matches produced".to_string()))?;

    let (favourite_song, most_similar_song) = resolve(&best, query, reference)?;
    log::info!(
        "Best match: '{}' -> '{}' (distance {:.4})",
        favourite_song,
        most_similar_song,
        best.distance
    );

    Ok(PredictionResult {
        favourite_song,
        most_similar_song,
        distance: best.distance,
    })
}

fn ensure_not_empty(query: &TrackTable, reference: &TrackTable) -> MatchResult<()> {
    if query.is_empty() {
        return Err(MatchError::InsufficientData(
            "query table has no tracks".to_string(),
        ));
    }
    if reference.is_empty() {
        return Err(MatchError::InsufficientData(
            "reference table has no tracks".to_string(),
        ));
    }
    Ok(())
}

fn resolve(
    m: &RowMatch,
    query: &TrackTable,
    reference: &TrackTable,
) -> MatchResult<(String, String)> {
    let favourite = query.get(m.query_index).ok_or_else(|| {
        MatchError::InsufficientData(format!("query row {} out of range", m.query_index))
    })?;
    let similar = reference.get(m.reference_index).ok_or_else(|| {
        MatchError::InsufficientData(format!(
            "reference row {} out of range; model was fitted on a different table",
            m.reference_index
        ))
    })?;
    Ok((favourite.display_name(), similar.display_name()))
}
