//! Obtaining a session token through Spotify's authorization code flow.
//!
//! Tokens are cached in a small JSON file so the interactive step only
//! happens once; expired tokens are refreshed with the stored refresh token.
//! Every failure here maps to `AuthenticationUnavailable`, which callers
//! recover from by serving bundled default data.

use crate::config::{Config, SCOPE};
use crate::error::{MatchError, MatchResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::path::Path;
use ureq::Agent;
use urlencoding::{decode, encode};

/// Seconds of slack before expiry at which a token counts as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An authorized session. Constructed once and handed to the API client.
#[derive(Debug, Clone)]
pub struct Session {
    access_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

/// Token as persisted in the token cache file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
}

impl CachedToken {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_MARGIN_SECS <= now
    }
}

/// Response body of the accounts token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    scope: Option<String>,
    expires_in: i64,
}

/// Authenticate with cached, refreshed or (if `interactive`) freshly
/// authorized credentials.
pub fn authenticate(config: &Config, interactive: bool) -> MatchResult<Session> {
    let (client_id, client_secret) = config.credentials().ok_or_else(|| {
        MatchError::AuthenticationUnavailable(
            "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET are not set".to_string(),
        )
    })?;
    let flow = AuthCodeFlow::new(config, client_id, client_secret);
    let now = Utc::now().timestamp();

    if let Some(cached) = load_cached_token(&config.token_cache) {
        if !cached.is_expired(now) {
            log::debug!("Using cached access token");
            return Ok(Session::new(cached.access_token));
        }
        if let Some(refresh_token) = &cached.refresh_token {
            log::info!("Cached access token expired, refreshing");
            match flow.refresh(refresh_token) {
                Ok(mut token) => {
                    // the refresh grant may omit the refresh token
                    if token.refresh_token.is_none() {
                        token.refresh_token = Some(refresh_token.clone());
                    }
                    save_cached_token(&config.token_cache, &token);
                    return Ok(Session::new(token.access_token));
                }
                Err(e) => log::warn!("Token refresh failed: {e}"),
            }
        }
    }

    if !interactive {
        return Err(MatchError::AuthenticationUnavailable(
            "no usable cached token; run with --login to authorize".to_string(),
        ));
    }

    let token = flow.authorize_interactively()?;
    save_cached_token(&config.token_cache, &token);
    Ok(Session::new(token.access_token))
}

struct AuthCodeFlow<'a> {
    agent: Agent,
    accounts_url: &'a str,
    redirect_uri: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

impl<'a> AuthCodeFlow<'a> {
    fn new(config: &'a Config, client_id: &'a str, client_secret: &'a str) -> Self {
        Self {
            agent: Agent::new(),
            accounts_url: config.accounts_url.trim_end_matches('/'),
            redirect_uri: &config.redirect_uri,
            client_id,
            client_secret,
        }
    }

    fn authorize_interactively(&self) -> MatchResult<CachedToken> {
        let state = Alphanumeric.sample_string(&mut rand::thread_rng(), 16);
        let url = authorize_url(self.accounts_url, self.client_id, self.redirect_uri, &state);

        eprintln!("Open this URL in your browser to authorize access:\n\n    {url}\n");
        eprint!("Paste the URL you were redirected to: ");
        io::stderr().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        let code = parse_redirect(line.trim(), &state)?;

        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", &code),
            ("redirect_uri", self.redirect_uri),
        ])
    }

    fn refresh(&self, refresh_token: &str) -> MatchResult<CachedToken> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
    }

    fn request_token(&self, form: &[(&str, &str)]) -> MatchResult<CachedToken> {
        let basic = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .agent
            .post(&format!("{}/api/token", self.accounts_url))
            .set("Authorization", &format!("Basic {basic}"))
            .send_form(form)
            .map_err(|e| {
                MatchError::AuthenticationUnavailable(format!("token request failed: {e}"))
            })?;

        let token: TokenResponse = response.into_json().map_err(|e| {
            MatchError::AuthenticationUnavailable(format!("invalid token response: {e}"))
        })?;

        Ok(CachedToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            scope: token.scope,
            expires_at: Utc::now().timestamp() + token.expires_in,
        })
    }
}

/// URL the listener opens to grant access
pub fn authorize_url(
    accounts_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> String {
    format!(
        "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}",
        accounts_url.trim_end_matches('/'),
        encode(client_id),
        encode(redirect_uri),
        encode(SCOPE),
        encode(state)
    )
}

/// Extract the authorization code from the redirect URL, checking `state`
pub fn parse_redirect(redirected: &str, expected_state: &str) -> MatchResult<String> {
    let query = redirected
        .split_once('?')
        .map(|(_, q)| q)
        .unwrap_or(redirected);
    let query = query.split('#').next().unwrap_or_default();

    let mut code = None;
    let mut state = None;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        match key {
            "code" => code = Some(value),
            "state" => state = Some(value),
            "error" => {
                return Err(MatchError::AuthenticationUnavailable(format!(
                    "authorization denied: {value}"
                )));
            }
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Err(MatchError::AuthenticationUnavailable(
            "state mismatch in redirect URL".to_string(),
        ));
    }
    code.filter(|c| !c.is_empty()).ok_or_else(|| {
        MatchError::AuthenticationUnavailable("redirect URL has no authorization code".to_string())
    })
}

/// Read the token cache. A missing or unreadable file means no token.
pub fn load_cached_token(path: &Path) -> Option<CachedToken> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(token) => Some(token),
        Err(e) => {
            log::warn!("Ignoring unreadable token cache {}: {e}", path.display());
            None
        }
    }
}

fn save_cached_token(path: &Path, token: &CachedToken) {
    let result = serde_json::to_string_pretty(token)
        .map_err(io::Error::other)
        .and_then(|json| std::fs::write(path, json));
    if let Err(e) = result {
        log::warn!("Could not write token cache {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_in(dir: &Path, with_credentials: bool) -> Config {
        let mut config = Config::from_lookup(|_| None);
        config.token_cache = dir.join("token.json");
        if with_credentials {
            config.client_id = Some("client".to_string());
            config.client_secret = Some("secret".to_string());
        }
        config
    }

    #[test]
    fn test_missing_credentials_are_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = authenticate(&config_in(dir.path(), false), false).unwrap_err();
        assert!(matches!(err, MatchError::AuthenticationUnavailable(_)));
    }

    #[test]
    fn test_valid_cached_token_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), true);
        save_cached_token(
            &config.token_cache,
            &CachedToken {
                access_token: "cached-token".to_string(),
                refresh_token: None,
                scope: Some(SCOPE.to_string()),
                expires_at: Utc::now().timestamp() + 3600,
            },
        );

        let session = authenticate(&config, false).unwrap();
        assert_eq!(session.access_token(), "cached-token");
    }

    #[test]
    fn test_no_token_without_login_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = authenticate(&config_in(dir.path(), true), false).unwrap_err();
        assert!(matches!(err, MatchError::AuthenticationUnavailable(_)));
    }

    #[test]
    fn test_corrupt_token_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("token.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_cached_token(&path).is_none());
    }

    #[test]
    fn test_expiry_margin() {
        let token = CachedToken {
            access_token: "t".to_string(),
            refresh_token: None,
            scope: None,
            expires_at: 1_000,
        };
        assert!(!token.is_expired(900));
        assert!(token.is_expired(950));
        assert!(token.is_expired(2_000));
    }

    #[test]
    fn test_authorize_url_encodes_parameters() {
        let url = authorize_url(
            "https://accounts.spotify.com/",
            "my id",
            "http://localhost:9000",
            "abc",
        );
        assert!(url.starts_with("https://accounts.spotify.com/authorize?client_id=my%20id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A9000"));
        assert!(url.contains("scope=playlist-modify-public%20user-library-read"));
        assert!(url.ends_with("&state=abc"));
    }

    #[test]
    fn test_parse_redirect_extracts_code() {
        let code = parse_redirect("http://localhost:9000/?code=AQB%2Fxyz&state=s1", "s1").unwrap();
        assert_eq!(code, "AQB/xyz");
    }

    #[test]
    fn test_parse_redirect_rejects_bad_state_and_denial() {
        let err = parse_redirect("http://localhost:9000/?code=abc&state=other", "s1").unwrap_err();
        assert!(matches!(err, MatchError::AuthenticationUnavailable(_)));

        let err = parse_redirect("http://localhost:9000/?error=access_denied&state=s1", "s1")
            .unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }
}
