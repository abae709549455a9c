use crate::auth::Session;
use crate::config::Config;
use crate::error::{MatchError, MatchResult};
use crate::models::{
    ApiErrorResponse, ApiTrack, AudioFeaturesResponse, CurrentUser, PlaylistItemsPage, Term,
    TopTracksResponse,
};
use crate::recommend::{AudioFeatures, TrackRecord};
use serde::de::DeserializeOwned;
use ureq::Agent;
use urlencoding::encode;

/// Largest page the top tracks endpoint serves
pub const MAX_TOP_TRACKS: u32 = 50;
/// Largest number of ids the audio features endpoint accepts per call
pub const MAX_FEATURE_IDS: usize = 100;
const PLAYLIST_PAGE_SIZE: u32 = 100;

/// The streaming API calls the pipeline depends on
#[cfg_attr(test, mockall::automock)]
pub trait MusicApi {
    /// The listener's top tracks for a term
    fn top_tracks(&self, term: Term, limit: u32) -> MatchResult<Vec<TrackRecord>>;

    /// Every track in a playlist, following pagination
    fn playlist_tracks(&self, playlist_id: &str) -> MatchResult<Vec<TrackRecord>>;

    fn audio_features(&self, track_ids: &[String]) -> MatchResult<Vec<Option<AudioFeatures>>>;
}

/// A blocking Spotify Web API client authorized by a session token
pub struct SpotifyClient {
    agent: Agent,
    base_url: String,
    session: Session,
}

impl SpotifyClient {
    pub fn new(config: &Config, session: Session) -> Self {
        SpotifyClient {
            agent: Agent::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    /// Check the session token with a lightweight call
    pub fn ping(&self) -> MatchResult<CurrentUser> {
        let url = format!("{}/me", self.base_url);
        self.get_json(&url, "current user")
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> MatchResult<T> {
        log::debug!("GET {url}");
        let response = self
            .agent
            .get(url)
            .set(
                "Authorization",
                &format!("Bearer {}", self.session.access_token()),
            )
            .call()
            .map_err(|e| map_api_error(e, what))?;

        response
            .into_json::<T>()
            .map_err(|e| MatchError::Upstream(format!("failed to parse {what} response: {e}")))
    }
}

impl MusicApi for SpotifyClient {
    fn top_tracks(&self, term: Term, limit: u32) -> MatchResult<Vec<TrackRecord>> {
        let url = format!(
            "{}/me/top/tracks?time_range={}&limit={}",
            self.base_url,
            term.as_str(),
            limit.clamp(1, MAX_TOP_TRACKS)
        );
        let response: TopTracksResponse = self.get_json(&url, "top tracks")?;

        Ok(response
            .items
            .into_iter()
            .filter_map(ApiTrack::into_record)
            .collect())
    }

    fn playlist_tracks(&self, playlist_id: &str) -> MatchResult<Vec<TrackRecord>> {
        let mut next = Some(format!(
            "{}/playlists/{}/tracks?limit={}",
            self.base_url,
            encode(playlist_id),
            PLAYLIST_PAGE_SIZE
        ));
        let mut records = Vec::new();
        let mut pages = 0;

        while let Some(url) = next {
            let page: PlaylistItemsPage =
                self.get_json(&url, &format!("playlist '{playlist_id}'"))?;
            pages += 1;

            let before = records.len();
            records.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| item.track)
                    .filter_map(ApiTrack::into_record),
            );
            log::debug!(
                "Playlist {playlist_id} page {pages}: {} tracks",
                records.len() - before
            );
            next = page.next;
        }

        log::info!(
            "Fetched {} tracks from playlist {playlist_id} in {pages} page(s)",
            records.len()
        );
        Ok(records)
    }

    fn audio_features(&self, track_ids: &[String]) -> MatchResult<Vec<Option<AudioFeatures>>> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = track_ids.iter().map(|id| encode(id).into_owned()).collect();
        let url = format!("{}/audio-features?ids={}", self.base_url, ids.join(","));
        let response: AudioFeaturesResponse = self.get_json(&url, "audio features")?;
        Ok(response.audio_features)
    }
}

/// Follow `next` links from `first_url` until the pages run out, keeping
/// the playable tracks in playlist order
fn collect_playlist_pages<F>(
    playlist_id: &str,
    first_url: String,
    mut fetch_page: F,
) -> MatchResult<Vec<TrackRecord>>
where
    F: FnMut(&str) -> MatchResult<PlaylistItemsPage>,
{
    let mut next = Some(first_url);
    let mut records = Vec::new();
    let mut pages = 0;

    while let Some(url) = next {
        let page = fetch_page(&url)?;
        pages += 1;

        let before = records.len();
        records.extend(
            page.items
                .into_iter()
                .filter_map(|item| item.track)
                .filter_map(ApiTrack::into_record),
        );
        log::debug!(
            "Playlist {playlist_id} page {pages}: {} tracks",
            records.len() - before
        );
        next = page.next;
    }

    log::info!(
        "Fetched {} tracks from playlist {playlist_id} in {pages} page(s)",
        records.len()
    );
    Ok(records)
}

/// Translate a ureq failure into the pipeline's error taxonomy
fn map_api_error(error: ureq::Error, what: &str) -> MatchError {
    match error {
        ureq::Error::Status(code, response) => {
            let message = response
                .into_json::<ApiErrorResponse>()
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "no error details".to_string());
            status_error(code, what, &message)
        }
        ureq::Error::Transport(transport) => {
            MatchError::Upstream(format!("{what}: request failed: {transport}"))
        }
    }
}

fn status_error(code: u16, what: &str, message: &str) -> MatchError {
    match code {
        404 => MatchError::TrackSetNotFound(format!("{what}: {message}")),
        401 => MatchError::AuthenticationUnavailable(format!("{what}: {message}")),
        _ => MatchError::Upstream(format!("{what}: HTTP {code}: {message}")),
    }
}
