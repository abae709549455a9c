use super::key::TrackSetKey;
use crate::error::{MatchError, MatchResult};
use crate::recommend::{AudioFeatures, Track, TrackRecord, TrackTable};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// One CSV row: id, name, artists, then the nine features in fixed order
#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    id: String,
    name: String,
    artists: String,
    danceability: f64,
    energy: f64,
    loudness: f64,
    speechiness: f64,
    acousticness: f64,
    instrumentalness: f64,
    liveness: f64,
    valence: f64,
    tempo: f64,
}

impl From<&Track> for CacheRow {
    fn from(track: &Track) -> Self {
        let f = &track.features;
        CacheRow {
            id: track.record.id.clone(),
            name: track.record.name.clone(),
            artists: track.record.artists.clone(),
            danceability: f.danceability,
            energy: f.energy,
            loudness: f.loudness,
            speechiness: f.speechiness,
            acousticness: f.acousticness,
            instrumentalness: f.instrumentalness,
            liveness: f.liveness,
            valence: f.valence,
            tempo: f.tempo,
        }
    }
}

impl From<CacheRow> for Track {
    fn from(row: CacheRow) -> Self {
        Track::new(
            TrackRecord {
                id: row.id,
                name: row.name,
                artists: row.artists,
            },
            AudioFeatures {
                danceability: row.danceability,
                energy: row.energy,
                loudness: row.loudness,
                speechiness: row.speechiness,
                acousticness: row.acousticness,
                instrumentalness: row.instrumentalness,
                liveness: row.liveness,
                valence: row.valence,
                tempo: row.tempo,
            },
        )
    }
}

/// Parse a track table from CSV
pub fn read_table<R: Read>(reader: R) -> Result<TrackTable, csv::Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let tracks = csv_reader
        .deserialize::<CacheRow>()
        .map(|row| row.map(Track::from))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TrackTable::new(tracks))
}

/// Serialize a track table as CSV, header included
pub fn write_table<W: Write>(writer: W, table: &TrackTable) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for track in table {
        csv_writer.serialize(CacheRow::from(track))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Directory of per-key cache files. Files are never refreshed or expired.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &TrackSetKey) -> PathBuf {
        self.dir.join(key.cache_file_name())
    }

    /// The cached table for `key`, or `None` if no cache file exists.
    /// An existing file that fails to parse, or holds a NaN or infinite
    /// feature, is `CacheCorrupt`.
    pub fn read(&self, key: &TrackSetKey) -> MatchResult<Option<TrackTable>> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(None);
        }

        let file = std::fs::File::open(&path).map_err(|e| MatchError::CacheCorrupt {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let table = read_table(file).map_err(|e| MatchError::CacheCorrupt {
            path: path.clone(),
            message: e.to_string(),
        })?;
        if let Some(track) = table.iter().find(|t| !t.features.is_complete()) {
            return Err(MatchError::CacheCorrupt {
                path,
                message: format!("non-finite audio features for '{}'", track.record.id),
            });
        }

        log::debug!("Read {} tracks from {}", table.len(), path.display());
        Ok(Some(table))
    }

    /// Persist `table` for `key`. The file is written next to its final
    /// location and renamed into place, so readers never see a partial file.
    pub fn write(&self, key: &TrackSetKey, table: &TrackTable) -> MatchResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        let mut temp = NamedTempFile::new_in(&self.dir)?;
        write_table(temp.as_file_mut(), table).map_err(|e| std::io::Error::other(e.to_string()))?;
        temp.persist(&path).map_err(|e| e.error)?;

        log::info!("Cached {} tracks for {key} at {}", table.len(), path.display());
        Ok(path)
    }
}
