use super::cache::read_table;
use super::key::TrackSetKey;
use crate::error::{MatchError, MatchResult};
use crate::recommend::TrackTable;
use std::path::PathBuf;

const DEFAULT_USER_TRACKS: &str = include_str!("../../assets/default_user_tracks.csv");
const DEFAULT_PLAYLIST_TRACKS: &str = include_str!("../../assets/default_playlist_tracks.csv");

/// Fallback tables served when no session is available
#[derive(Debug, Clone)]
pub struct DefaultDatasets {
    user_tracks: TrackTable,
    playlist_tracks: TrackTable,
}

impl DefaultDatasets {
    pub fn new(user_tracks: TrackTable, playlist_tracks: TrackTable) -> Self {
        Self {
            user_tracks,
            playlist_tracks,
        }
    }

    /// The tables compiled into the binary
    pub fn bundled() -> MatchResult<Self> {
        Ok(Self::new(
            parse_bundled("default_user_tracks.csv", DEFAULT_USER_TRACKS)?,
            parse_bundled("default_playlist_tracks.csv", DEFAULT_PLAYLIST_TRACKS)?,
        ))
    }

    /// Top tracks fall back to the user table for every term,
    /// playlists to the playlist table for every id.
    pub fn for_key(&self, key: &TrackSetKey) -> &TrackTable {
        match key {
            TrackSetKey::TopTracks(_) => &self.user_tracks,
            TrackSetKey::Playlist(_) => &self.playlist_tracks,
        }
    }
}

fn parse_bundled(name: &str, content: &str) -> MatchResult<TrackTable> {
    read_table(content.as_bytes()).map_err(|e| MatchError::CacheCorrupt {
        path: PathBuf::from("assets").join(name),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Term;

    #[test]
    fn test_bundled_tables_parse() {
        let defaults = DefaultDatasets::bundled().unwrap();

        let user = defaults.for_key(&TrackSetKey::TopTracks(Term::MediumTerm));
        let playlist = defaults.for_key(&TrackSetKey::Playlist("anything".to_string()));
        assert_eq!(user.len(), 12);
        assert_eq!(playlist.len(), 12);
        assert!(user.iter().all(|t| t.features.is_complete()));
        assert!(playlist.iter().all(|t| t.features.is_complete()));
    }

    #[test]
    fn test_same_defaults_for_every_term() {
        let defaults = DefaultDatasets::bundled().unwrap();
        assert_eq!(
            defaults.for_key(&TrackSetKey::TopTracks(Term::ShortTerm)),
            defaults.for_key(&TrackSetKey::TopTracks(Term::LongTerm))
        );
    }

    #[test]
    fn test_multi_artist_names_survive_quoting() {
        let defaults = DefaultDatasets::bundled().unwrap();
        let user = defaults.for_key(&TrackSetKey::TopTracks(Term::ShortTerm));
        let get_lucky = user.iter().find(|t| t.record.name == "Get Lucky").unwrap();
        assert_eq!(
            get_lucky.record.artists,
            "Daft Punk, Pharrell Williams, Nile Rodgers"
        );
    }
}
