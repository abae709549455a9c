use super::cache::CacheStore;
use super::defaults::DefaultDatasets;
use super::fetcher::fetch_track_set;
use super::key::TrackSetKey;
use crate::client::MusicApi;
use crate::error::{MatchError, MatchResult};
use crate::recommend::TrackTable;
use serde::Serialize;
use std::fmt;

/// Where a track table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Cached,
    Fetched,
    Default,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provenance::Cached => "cache",
            Provenance::Fetched => "live API",
            Provenance::Default => "default data",
        })
    }
}

/// A track table tagged with the source that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub table: TrackTable,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy)]
enum Source {
    CacheFile,
    LiveApi,
    Bundled,
}

/// Sources tried in order; the first one that yields a table wins
const FALLBACK_CHAIN: [Source; 3] = [Source::CacheFile, Source::LiveApi, Source::Bundled];

/// Cache-or-fetch reader for track sets
pub struct TrackSetReader<'a> {
    cache: &'a CacheStore,
    api: Option<&'a dyn MusicApi>,
    defaults: &'a DefaultDatasets,
}

impl<'a> TrackSetReader<'a> {
    /// `api` is `None` when no session is available
    pub fn new(
        cache: &'a CacheStore,
        api: Option<&'a dyn MusicApi>,
        defaults: &'a DefaultDatasets,
    ) -> Self {
        Self {
            cache,
            api,
            defaults,
        }
    }

    pub fn read(&self, key: &TrackSetKey) -> MatchResult<LoadedTable> {
        for source in FALLBACK_CHAIN {
            if let Some(loaded) = self.try_source(source, key)? {
                log::info!(
                    "Loaded {} tracks for {key} from {}",
                    loaded.table.len(),
                    loaded.provenance
                );
                return Ok(loaded);
            }
        }
        Err(MatchError::InsufficientData(format!(
            "no source produced a track table for {key}"
        )))
    }

    fn try_source(&self, source: Source, key: &TrackSetKey) -> MatchResult<Option<LoadedTable>> {
        match source {
            Source::CacheFile => Ok(self.cache.read(key)?.map(|table| LoadedTable {
                table,
                provenance: Provenance::Cached,
            })),
            Source::LiveApi => {
                let Some(api) = self.api else {
                    log::debug!("No session, skipping live fetch for {key}");
                    return Ok(None);
                };
                let table = match fetch_track_set(api, key) {
                    Ok(table) => table,
                    Err(MatchError::AuthenticationUnavailable(reason)) => {
                        log::warn!("Session rejected while fetching {key}: {reason}");
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };
                self.cache.write(key, &table)?;
                Ok(Some(LoadedTable {
                    table,
                    provenance: Provenance::Fetched,
                }))
            }
            Source::Bundled => Ok(Some(LoadedTable {
                table: self.defaults.for_key(key).clone(),
                provenance: Provenance::Default,
            })),
        }
    }
}
