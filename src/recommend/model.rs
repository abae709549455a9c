use super::features::SELECTED_FEATURES;
use super::neighbors::NearestNeighbors;
use super::scaler::MinMaxScaler;
use super::table::TrackTable;
use crate::error::{MatchError, MatchResult};

/// Nearest reference row for one query row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMatch {
    pub query_index: usize,
    pub reference_index: usize,
    pub distance: f64,
}

/// Min-max scaler plus 1-NN index fitted on a reference table.
/// Immutable once fitted; lives for a single query.
#[derive(Debug, Clone)]
pub struct SimilarityModel {
    scaler: MinMaxScaler,
    index: NearestNeighbors,
}

impl SimilarityModel {
    pub fn fit(reference: &TrackTable) -> MatchResult<Self> {
        let rows = reference.feature_rows();
        let scaler = MinMaxScaler::fit(&rows).ok_or_else(|| {
            MatchError::InsufficientData("reference table has no tracks".to_string())
        })?;
        let scaled = rows.iter().map(|row| scaler.transform(row)).collect();

        log::debug!(
            "Fitted similarity model on {} reference tracks using {}",
            rows.len(),
            SELECTED_FEATURES.join(", ")
        );
        log::trace!("Column minima {:?}, maxima {:?}", scaler.min(), scaler.max());

        Ok(Self {
            scaler,
            index: NearestNeighbors::new(scaled),
        })
    }

    /// Nearest reference row for every query row, in query table order
    pub fn query(&self, query: &TrackTable) -> MatchResult<Vec<RowMatch>> {
        if query.is_empty() {
            return Err(MatchError::InsufficientData(
                "query table has no tracks".to_string(),
            ));
        }

        query
            .feature_rows()
            .iter()
            .enumerate()
            .map(|(query_index, row)| {
                let neighbor = self
                    .index
                    .nearest(&self.scaler.transform(row))
                    .ok_or_else(|| {
                        MatchError::InsufficientData("reference index is empty".to_string())
                    })?;
                Ok(RowMatch {
                    query_index,
                    reference_index: neighbor.index,
                    distance: neighbor.distance,
                })
            })
            .collect()
    }

    #[cfg(test)]
    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    #[cfg(test)]
    pub fn reference_len(&self) -> usize {
        self.index.len()
    }
}
