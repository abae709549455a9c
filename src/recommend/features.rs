use serde::{Deserialize, Serialize};

/// Number of audio features used for fitting and querying
pub const FEATURE_COUNT: usize = 9;

/// Selected audio features, in the fixed column order used everywhere
pub const SELECTED_FEATURES: [&str; FEATURE_COUNT] = [
    "danceability",
    "energy",
    "loudness",
    "speechiness",
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
];

/// A point in feature space, columns ordered as `SELECTED_FEATURES`
pub type FeatureRow = [f64; FEATURE_COUNT];

/// The audio descriptors of one track.
///
/// Deserializing an API audio-features object keeps only these nine fields;
/// everything else in the payload (key, mode, duration_ms, ...) is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: f64,
    pub energy: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
}

impl AudioFeatures {
    pub fn to_row(&self) -> FeatureRow {
        [
            self.danceability,
            self.energy,
            self.loudness,
            self.speechiness,
            self.acousticness,
            self.instrumentalness,
            self.liveness,
            self.valence,
            self.tempo,
        ]
    }

    pub fn from_row(row: FeatureRow) -> Self {
        let [
            danceability,
            energy,
            loudness,
            speechiness,
            acousticness,
            instrumentalness,
            liveness,
            valence,
            tempo,
        ] = row;
        AudioFeatures {
            danceability,
            energy,
            loudness,
            speechiness,
            acousticness,
            instrumentalness,
            liveness,
            valence,
            tempo,
        }
    }

    /// All nine values are finite numbers
    pub fn is_complete(&self) -> bool {
        self.to_row().iter().all(|v| v.is_finite())
    }
}
