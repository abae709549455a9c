use crate::error::{MatchError, MatchResult};
use crate::models::Term;
use std::fmt;

/// Identifies a track set and names its cache file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackSetKey {
    TopTracks(Term),
    Playlist(String),
}

impl TrackSetKey {
    /// Playlist key. Ids are Spotify base62 strings; anything else
    /// can never resolve and is rejected as not found.
    pub fn playlist(playlist_id: &str) -> MatchResult<Self> {
        let id = playlist_id.trim();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MatchError::TrackSetNotFound(format!(
                "invalid playlist id '{playlist_id}'"
            )));
        }
        Ok(TrackSetKey::Playlist(id.to_string()))
    }

    pub fn cache_file_name(&self) -> String {
        match self {
            TrackSetKey::TopTracks(term) => format!("user_tracks_{term}.csv"),
            TrackSetKey::Playlist(id) => format!("tracks_{id}.csv"),
        }
    }
}

impl fmt::Display for TrackSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackSetKey::TopTracks(term) => write!(f, "top tracks ({term})"),
            TrackSetKey::Playlist(id) => write!(f, "playlist {id}"),
        }
    }
}
