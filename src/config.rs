use anyhow::Result;
use std::path::PathBuf;

/// Scope requested during the authorization code flow
pub const SCOPE: &str = "playlist-modify-public user-library-read user-follow-read \
user-top-read playlist-read-private user-read-recently-played";

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:9000";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub api_url: String,
    pub accounts_url: String,
    pub data_dir: PathBuf,
    pub token_cache: PathBuf,
}

impl Config {
    /// Build a configuration from any key lookup.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Config {
            client_id: get("SPOTIFY_CLIENT_ID"),
            client_secret: get("SPOTIFY_CLIENT_SECRET"),
            redirect_uri: get("SPOTIFY_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            api_url: get("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            accounts_url: get("SPOTIFY_ACCOUNTS_URL")
                .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
            data_dir: get("PLAYLIST_MATCH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            token_cache: get("PLAYLIST_MATCH_TOKEN_CACHE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".cache")),
        }
    }

    /// Client id and secret, if both are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    Ok(Config::from_lookup(|key| std::env::var(key).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::from_lookup(|_| None);

        assert!(config.credentials().is_none());
        assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.token_cache, PathBuf::from(".cache"));
    }

    #[test]
    fn test_credentials_require_both_values() {
        let only_id = Config::from_lookup(lookup_from(&[("SPOTIFY_CLIENT_ID", "abc")]));
        assert!(only_id.credentials().is_none());

        let both = Config::from_lookup(lookup_from(&[
            ("SPOTIFY_CLIENT_ID", "abc"),
            ("SPOTIFY_CLIENT_SECRET", "xyz"),
        ]));
        assert_eq!(both.credentials(), Some(("abc", "xyz")));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = Config::from_lookup(lookup_from(&[
            ("SPOTIFY_CLIENT_ID", "  "),
            ("PLAYLIST_MATCH_DATA_DIR", ""),
        ]));

        assert!(config.client_id.is_none());
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_overrides_are_used() {
        let config = Config::from_lookup(lookup_from(&[
            ("SPOTIFY_REDIRECT_URI", "http://127.0.0.1:8888/callback"),
            ("PLAYLIST_MATCH_DATA_DIR", "/tmp/cache"),
        ]));

        assert_eq!(config.redirect_uri, "http://127.0.0.1:8888/callback");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cache"));
    }
}
