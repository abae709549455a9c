use super::key::TrackSetKey;
use crate::client::{MAX_FEATURE_IDS, MAX_TOP_TRACKS, MusicApi};
use crate::error::{MatchError, MatchResult};
use crate::models::Term;
use crate::recommend::{AudioFeatures, Track, TrackRecord, TrackTable};

/// Audio features for `track_ids`, one bulk call per batch of at most
/// `MAX_FEATURE_IDS`. The result is aligned with the input ids.
pub fn fetch_features(
    api: &dyn MusicApi,
    track_ids: &[String],
) -> MatchResult<Vec<Option<AudioFeatures>>> {
    let mut features = Vec::with_capacity(track_ids.len());

    for (batch, ids) in track_ids.chunks(MAX_FEATURE_IDS).enumerate() {
        let response = api.audio_features(ids)?;
        if response.len() != ids.len() {
            return Err(MatchError::Upstream(format!(
                "audio features batch {} returned {} records for {} ids",
                batch + 1,
                response.len(),
                ids.len()
            )));
        }
        log::debug!("Audio features batch {}: {} ids", batch + 1, ids.len());
        features.extend(response);
    }

    Ok(features)
}

/// Join records with their features by position. Tracks without a complete
/// feature record are dropped, so every row reaching the model is usable.
pub fn attach_features(
    records: Vec<TrackRecord>,
    features: Vec<Option<AudioFeatures>>,
) -> TrackTable {
    let mut tracks = Vec::with_capacity(records.len());

    for (record, features) in records.into_iter().zip(features) {
        match features {
            Some(f) if f.is_complete() => tracks.push(Track::new(record, f)),
            _ => log::warn!(
                "Dropping '{}' ({}): no audio features available",
                record.name,
                record.id
            ),
        }
    }

    TrackTable::new(tracks)
}

fn with_features(api: &dyn MusicApi, records: Vec<TrackRecord>) -> MatchResult<TrackTable> {
    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    let features = fetch_features(api, &ids)?;
    Ok(attach_features(records, features))
}

/// The listener's top tracks with features
pub fn fetch_top_tracks(api: &dyn MusicApi, term: Term) -> MatchResult<TrackTable> {
    let records = api.top_tracks(term, MAX_TOP_TRACKS)?;
    log::info!("Fetched {} top tracks for {term}", records.len());
    with_features(api, records)
}

/// A playlist's tracks with features
pub fn fetch_playlist_tracks(api: &dyn MusicApi, playlist_id: &str) -> MatchResult<TrackTable> {
    let records = api.playlist_tracks(playlist_id)?;
    with_features(api, records)
}

pub fn fetch_track_set(api: &dyn MusicApi, key: &TrackSetKey) -> MatchResult<TrackTable> {
    match key {
        TrackSetKey::TopTracks(term) => fetch_top_tracks(api, *term),
        TrackSetKey::Playlist(id) => fetch_playlist_tracks(api, id),
    }
}
