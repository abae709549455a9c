use crate::auth::authenticate;
use crate::client::{MusicApi, SpotifyClient};
use crate::config::Config;
use crate::error::{MatchError, MatchResult};
use crate::models::Term;
use crate::recommend::{PredictionResult, RowPrediction, SimilarityModel, predict, predict_rows};
use crate::tracks::{
    CacheStore, DefaultDatasets, LoadedTable, Provenance, TrackSetKey, TrackSetReader,
};
use serde::Serialize;

/// How the startup step should try to obtain a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Use cached or refreshable tokens only
    Cached,
    /// Allow the interactive authorization prompt
    Interactive,
    /// Never authenticate
    Offline,
}

/// Prediction plus where its inputs came from
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub user_tracks_source: Provenance,
    pub playlist_source: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_track: Option<Vec<RowPrediction>>,
}

impl PredictionReport {
    /// True when default data stood in for at least one input
    pub fn is_degraded(&self) -> bool {
        self.user_tracks_source == Provenance::Default
            || self.playlist_source == Provenance::Default
    }
}

/// Application context built once at startup and passed to every operation
pub struct Recommender {
    cache: CacheStore,
    defaults: DefaultDatasets,
    api: Option<Box<dyn MusicApi>>,
}

impl Recommender {
    pub fn new(
        cache: CacheStore,
        defaults: DefaultDatasets,
        api: Option<Box<dyn MusicApi>>,
    ) -> Self {
        Self {
            cache,
            defaults,
            api,
        }
    }

    /// Build the context from configuration, authenticating if possible.
    /// Authentication failures degrade to default data and never fail.
    pub fn connect(config: &Config, mode: AuthMode) -> MatchResult<Self> {
        let api = match mode {
            AuthMode::Offline => {
                log::info!("Offline mode, using cached and default data only");
                None
            }
            AuthMode::Cached | AuthMode::Interactive => {
                match open_session(config, mode == AuthMode::Interactive) {
                    Ok(client) => {
                        log::info!("Successfully connected to the Spotify API.");
                        Some(Box::new(client) as Box<dyn MusicApi>)
                    }
                    Err(e) => {
                        log::warn!("{e}");
                        log::warn!("Not able to authenticate, continue with default data.");
                        None
                    }
                }
            }
        };

        Ok(Self::new(
            CacheStore::new(&config.data_dir),
            DefaultDatasets::bundled()?,
            api,
        ))
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.is_some()
    }

    fn reader(&self) -> TrackSetReader<'_> {
        TrackSetReader::new(&self.cache, self.api.as_deref(), &self.defaults)
    }

    /// The listener's top tracks for `term`, windowed by `offset`/`limit`
    pub fn top_tracks(
        &self,
        term: Term,
        limit: Option<usize>,
        offset: usize,
    ) -> MatchResult<LoadedTable> {
        let loaded = self.reader().read(&TrackSetKey::TopTracks(term))?;
        Ok(LoadedTable {
            table: loaded.table.page(offset, limit),
            provenance: loaded.provenance,
        })
    }

    pub fn playlist_tracks(&self, playlist_id: &str) -> MatchResult<LoadedTable> {
        self.reader().read(&TrackSetKey::playlist(playlist_id)?)
    }

    /// Fit on the playlist, query with the listener's top tracks
    pub fn predict(
        &self,
        term: Term,
        playlist_id: &str,
        include_per_track: bool,
    ) -> MatchResult<PredictionReport> {
        let playlist_key = TrackSetKey::playlist(playlist_id)?;
        let reader = self.reader();
        let playlist = reader.read(&playlist_key)?;
        let user_tracks = reader.read(&TrackSetKey::TopTracks(term))?;

        let model = SimilarityModel::fit(&playlist.table)?;
        let result = predict(&model, &user_tracks.table, &playlist.table)?;
        let per_track = if include_per_track {
            Some(predict_rows(&model, &user_tracks.table, &playlist.table)?)
        } else {
            None
        };

        Ok(PredictionReport {
            result,
            user_tracks_source: user_tracks.provenance,
            playlist_source: playlist.provenance,
            per_track,
        })
    }
}

fn open_session(config: &Config, interactive: bool) -> MatchResult<SpotifyClient> {
    let session = authenticate(config, interactive)?;
    let client = SpotifyClient::new(config, session);
    match client.ping() {
        Ok(user) => {
            log::debug!("Authenticated as {}", user.display_name.unwrap_or(user.id));
            Ok(client)
        }
        Err(e @ MatchError::AuthenticationUnavailable(_)) => Err(e),
        Err(e) => Err(MatchError::AuthenticationUnavailable(format!(
            "could not verify session: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockMusicApi;
    use crate::recommend::{AudioFeatures, Track, TrackRecord, TrackTable};

    fn one_track_table(id: &str, name: &str, artists: &str, value: f64) -> TrackTable {
        vec![Track::new(
            TrackRecord {
                id: id.to_string(),
                name: name.to_string(),
                artists: artists.to_string(),
            },
            AudioFeatures::from_row([value; 9]),
        )]
        .into()
    }

    fn offline_recommender(dir: &std::path::Path) -> Recommender {
        Recommender::new(
            CacheStore::new(dir),
            DefaultDatasets::new(
                one_track_table("b", "Song B", "Artist Y", 0.5),
                one_track_table("a", "Song A", "Artist X", 0.5),
            ),
            None,
        )
    }

    #[test]
    fn test_unauthenticated_prediction_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let recommender = offline_recommender(dir.path());
        assert!(!recommender.is_authenticated());

        let report = recommender
            .predict(Term::ShortTerm, "37i9dQZF1DXb5BKLTO7ULa", false)
            .unwrap();

        assert!(report.is_degraded());
        assert_eq!(report.result.favourite_song, "Song B - Artist Y");
        assert_eq!(report.result.most_similar_song, "Song A - Artist X");
        assert_eq!(report.result.distance, 0.0);
        assert!(report.per_track.is_none());
    }

    #[test]
    fn test_unknown_playlist_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut api = MockMusicApi::new();
        api.expect_playlist_tracks()
            .returning(|id| Err(MatchError::TrackSetNotFound(format!("playlist '{id}'"))));

        let recommender = Recommender::new(
            CacheStore::new(dir.path()),
            DefaultDatasets::new(TrackTable::default(), TrackTable::default()),
            Some(Box::new(api)),
        );

        let err = recommender
            .predict(Term::ShortTerm, "0000000000000000000000", false)
            .unwrap_err();
        assert!(err.is_not_found());

        let err = recommender.playlist_tracks("0000000000000000000000").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_malformed_playlist_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let recommender = offline_recommender(dir.path());
        assert!(recommender.predict(Term::ShortTerm, "../../x", false).unwrap_err().is_not_found());
    }

    #[test]
    fn test_empty_defaults_are_insufficient_data() {
        let dir = tempfile::tempdir().unwrap();
        let recommender = Recommender::new(
            CacheStore::new(dir.path()),
            DefaultDatasets::new(TrackTable::default(), one_track_table("a", "A", "X", 0.1)),
            None,
        );

        let err = recommender.predict(Term::LongTerm, "abc", false).unwrap_err();
        assert!(matches!(err, MatchError::InsufficientData(_)));
    }

    #[test]
    fn test_per_track_matches_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let recommender = offline_recommender(dir.path());
        let report = recommender.predict(Term::MediumTerm, "abc", true).unwrap();

        let rows = report.per_track.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].most_similar_song, "Song A - Artist X");
    }

    #[test]
    fn test_top_tracks_are_paged() {
        let dir = tempfile::tempdir().unwrap();
        let recommender = Recommender::new(
            CacheStore::new(dir.path()),
            DefaultDatasets::bundled().unwrap(),
            None,
        );

        let page = recommender.top_tracks(Term::ShortTerm, Some(5), 10).unwrap();
        assert_eq!(page.provenance, Provenance::Default);
        assert_eq!(page.table.len(), 2);
        assert_eq!(page.table.get(0).unwrap().record.id, "demouser11");
    }

    #[test]
    fn test_report_serializes_flat() {
        let dir = tempfile::tempdir().unwrap();
        let report = offline_recommender(dir.path())
            .predict(Term::ShortTerm, "abc", false)
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["favourite_song"], "Song B - Artist Y");
        assert_eq!(json["most_similar_song"], "Song A - Artist X");
        assert_eq!(json["distance"], 0.0);
        assert_eq!(json["playlist_source"], "default");
        assert!(json.get("per_track").is_none());
    }
}
