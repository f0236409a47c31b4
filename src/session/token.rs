use crate::config::{AuthConfig, TOKEN_PLACEHOLDER, TOKEN_STORAGE_KEY};
use crate::storage::KeyValueStore;

/// Parsed URL query parameters, the credential-handoff surface for
/// OAuth-style redirects. Keys keep their first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    pairs: Vec<(String, String)>,
}

impl UrlParams {
    /// Parse a raw query string, with or without the leading '?'.
    /// Undecodable entries are skipped rather than failing the whole parse.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut pairs = Vec::new();
        for piece in query.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = piece.split_once('=').unwrap_or((piece, ""));
            let (Ok(k), Ok(v)) = (urlencoding::decode(k), urlencoding::decode(v)) else { continue };
            pairs.push((k.into_owned(), v.into_owned()));
        }
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Remove a parameter, mirroring the URL-bar strip after a token handoff.
    pub fn strip(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Url,
    Storage,
    Fallback,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: Option<String>,
    pub source: TokenSource,
}

impl ResolvedToken {
    fn none() -> Self { Self { token: None, source: TokenSource::None } }
}

/// Three-tier credential resolution: URL handoff, then persisted token, then
/// the configured development fallback. Pure over its inputs; stripping a
/// consumed URL token is the caller's move.
pub struct TokenResolver;

impl TokenResolver {
    pub fn from_url(params: &UrlParams) -> Option<String> {
        params.get("token").filter(|t| !t.is_empty()).map(str::to_string)
    }

    pub fn from_storage(store: &dyn KeyValueStore) -> Option<String> {
        store
            .get(TOKEN_STORAGE_KEY)
            .filter(|t| !t.is_empty() && t != TOKEN_PLACEHOLDER)
    }

    pub fn from_fallback(config: &AuthConfig) -> Option<String> {
        config.fallback_token.clone().filter(|t| !t.is_empty())
    }

    pub fn resolve(params: &UrlParams, store: &dyn KeyValueStore, config: &AuthConfig) -> ResolvedToken {
        if let Some(token) = Self::from_url(params) {
            return ResolvedToken { token: Some(token), source: TokenSource::Url };
        }
        if let Some(token) = Self::from_storage(store) {
            return ResolvedToken { token: Some(token), source: TokenSource::Storage };
        }
        if let Some(token) = Self::from_fallback(config) {
            return ResolvedToken { token: Some(token), source: TokenSource::Fallback };
        }
        ResolvedToken::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn cfg_with_fallback(token: Option<&str>) -> AuthConfig {
        let cfg = AuthConfig::new("http://localhost:9/verify");
        match token {
            Some(t) => cfg.with_fallback_token(t),
            None => cfg,
        }
    }

    #[test]
    fn query_string_parsing() {
        let p = UrlParams::parse("?token=abc%20def&next=%2Fhome&flag");
        assert_eq!(p.get("token"), Some("abc def"));
        assert_eq!(p.get("next"), Some("/home"));
        assert_eq!(p.get("flag"), Some(""));
        assert_eq!(p.get("missing"), None);
    }

    #[test]
    fn url_token_wins_over_everything() {
        let store = MemoryStore::new();
        store.set(TOKEN_STORAGE_KEY, "stored").unwrap();
        let params = UrlParams::parse("token=from-url");
        let cfg = cfg_with_fallback(Some("dev"));
        let r = TokenResolver::resolve(&params, &store, &cfg);
        assert_eq!(r.source, TokenSource::Url);
        assert_eq!(r.token.as_deref(), Some("from-url"));
    }

    #[test]
    fn storage_beats_fallback() {
        let store = MemoryStore::new();
        store.set(TOKEN_STORAGE_KEY, "stored").unwrap();
        let r = TokenResolver::resolve(&UrlParams::default(), &store, &cfg_with_fallback(Some("dev")));
        assert_eq!(r.source, TokenSource::Storage);
        assert_eq!(r.token.as_deref(), Some("stored"));
    }

    #[test]
    fn placeholder_storage_value_is_absent() {
        let store = MemoryStore::new();
        store.set(TOKEN_STORAGE_KEY, TOKEN_PLACEHOLDER).unwrap();
        let r = TokenResolver::resolve(&UrlParams::default(), &store, &cfg_with_fallback(Some("dev")));
        assert_eq!(r.source, TokenSource::Fallback);
        assert_eq!(r.token.as_deref(), Some("dev"));
    }

    #[test]
    fn nothing_anywhere_resolves_to_none() {
        let store = MemoryStore::new();
        let r = TokenResolver::resolve(&UrlParams::default(), &store, &cfg_with_fallback(None));
        assert_eq!(r.source, TokenSource::None);
        assert_eq!(r.token, None);
    }

    #[test]
    fn empty_url_token_is_ignored() {
        let store = MemoryStore::new();
        let params = UrlParams::parse("token=");
        let r = TokenResolver::resolve(&params, &store, &cfg_with_fallback(None));
        assert_eq!(r.source, TokenSource::None);
    }

    #[test]
    fn stripped_url_token_is_single_use() {
        let mut params = UrlParams::parse("token=abc&page=1");
        assert_eq!(TokenResolver::from_url(&params).as_deref(), Some("abc"));
        params.strip("token");
        assert_eq!(TokenResolver::from_url(&params), None);
        assert_eq!(params.get("page"), Some("1"));
    }
}
