use crate::recommend::{AudioFeatures, TrackRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Listening-history window used by the top tracks endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Term {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl Term {
    pub fn as_str(&self) -> &'static str {
        match self {
            Term::ShortTerm => "short_term",
            Term::MediumTerm => "medium_term",
            Term::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artist object as embedded in track responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(dead_code)]
pub struct ApiArtist {
    pub name: String,
    pub id: Option<String>,
}

/// Track object returned by the Web API. Local files have no id.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_local: bool,
}

impl ApiTrack {
    /// Convert into a track record, skipping episodes and local files
    pub fn into_record(self) -> Option<TrackRecord> {
        if self.is_local || self.kind.as_deref().is_some_and(|k| k != "track") {
            return None;
        }
        let id = self.id?;
        Some(TrackRecord {
            id,
            name: self.name,
            artists: parse_artist_names(&self.artists),
        })
    }
}

/// Join artist display names with ", ", keeping the API order
pub fn parse_artist_names(artists: &[ApiArtist]) -> String {
    artists
        .iter()
        .map(|artist| artist.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Response structure for the top tracks endpoint
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct TopTracksResponse {
    pub items: Vec<ApiTrack>,
    pub next: Option<String>,
}

/// One page of playlist items
#[derive(Debug, Deserialize)]
pub struct PlaylistItemsPage {
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    /// Null when the track was removed from the catalog
    pub track: Option<ApiTrack>,
}

/// Response structure for the bulk audio features endpoint
#[derive(Debug, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeatures>>,
}

/// Response structure for the current user endpoint
#[derive(Debug, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Error body returned by the Web API on failures
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct ApiErrorBody {
    pub status: u16,
    pub message: String,
}
