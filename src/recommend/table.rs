use super::features::{AudioFeatures, FeatureRow};
use serde::{Deserialize, Serialize};

/// Display metadata of a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: String,
    pub name: String,
    /// Artist display names joined with ", "
    pub artists: String,
}

/// One row of a track table: a record with its audio features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(flatten)]
    pub record: TrackRecord,
    pub features: AudioFeatures,
}

impl Track {
    pub fn new(record: TrackRecord, features: AudioFeatures) -> Self {
        Self { record, features }
    }

    /// "name - artists", the way results are shown to the listener
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.record.name, self.record.artists)
    }
}

/// Ordered collection of tracks, in API response or cache file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackTable {
    tracks: Vec<Track>,
}

impl TrackTable {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    /// Feature columns of every row, in table order
    pub fn feature_rows(&self) -> Vec<FeatureRow> {
        self.tracks.iter().map(|t| t.features.to_row()).collect()
    }

    /// A window of the table, used for paged listings
    pub fn page(&self, offset: usize, limit: Option<usize>) -> TrackTable {
        let end = match limit {
            Some(limit) => offset.saturating_add(limit).min(self.tracks.len()),
            None => self.tracks.len(),
        };
        let start = offset.min(end);
        TrackTable::new(self.tracks[start..end].to_vec())
    }
}

impl From<Vec<Track>> for TrackTable {
    fn from(tracks: Vec<Track>) -> Self {
        TrackTable::new(tracks)
    }
}

impl<'a> IntoIterator for &'a TrackTable {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}
