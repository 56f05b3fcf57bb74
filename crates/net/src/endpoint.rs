//! Server endpoint addressing
//!
//! One server hosts both persistent channels and the rating endpoint:
//!
//! - discussion: `ws[s]://<host>/ws/chat/<room>?username=..&password=..`
//! - directory:  `ws[s]://<host>/roomUpdates`
//! - ratings:    `http[s]://<host>/rate/final?username=..`

use reqwest::Url;

use crate::error::{Error, Result};

/// Default server address
pub const DEFAULT_HOST: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// `host[:port]`, no scheme
    pub host: String,
    /// Use `wss`/`https` instead of `ws`/`http`
    pub secure: bool,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            secure: false,
        }
    }
}

impl Endpoint {
    pub fn new(host: impl Into<String>, secure: bool) -> Self {
        Self {
            host: host.into(),
            secure,
        }
    }

    fn base(&self, ws: bool) -> Result<Url> {
        let scheme = match (ws, self.secure) {
            (true, false) => "ws",
            (true, true) => "wss",
            (false, false) => "http",
            (false, true) => "https",
        };
        let host = self.host.trim().trim_end_matches('/');
        if host.is_empty() || host.contains("://") {
            return Err(Error::Address(format!("expected host[:port], got '{}'", self.host)));
        }
        Url::parse(&format!("{}://{}/", scheme, host))
            .map_err(|e| Error::Address(format!("{}: {}", self.host, e)))
    }

    /// Discussion channel for a room; credentials travel as query parameters
    pub fn chat_url(&self, room_id: &str, username: &str, password: &str) -> Result<Url> {
        let mut url = self.base(true)?;
        url.path_segments_mut()
            .map_err(|_| Error::Address(self.host.clone()))?
            .pop_if_empty()
            .extend(["ws", "chat", room_id]);
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("password", password);
        Ok(url)
    }

    pub fn directory_url(&self) -> Result<Url> {
        let mut url = self.base(true)?;
        url.set_path("/roomUpdates");
        Ok(url)
    }

    pub fn rating_url(&self, username: &str) -> Result<Url> {
        let mut url = self.base(false)?;
        url.set_path("/rate/final");
        url.query_pairs_mut().append_pair("username", username);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_escapes_credentials() {
        let endpoint = Endpoint::default();
        let url = endpoint.chat_url("12", "anna maria", "p&ss=1").unwrap();
        assert_eq!(
            url.as_str(),
            "ws://127.0.0.1:8080/ws/chat/12?username=anna+maria&password=p%26ss%3D1"
        );
    }

    #[test]
    fn test_secure_schemes() {
        let endpoint = Endpoint::new("debate.example.org", true);
        assert_eq!(
            endpoint.directory_url().unwrap().as_str(),
            "wss://debate.example.org/roomUpdates"
        );
        assert_eq!(
            endpoint.rating_url("bob").unwrap().as_str(),
            "https://debate.example.org/rate/final?username=bob"
        );
    }

    #[test]
    fn test_host_with_scheme_rejected() {
        let endpoint = Endpoint::new("http://127.0.0.1:8080", false);
        assert!(endpoint.directory_url().is_err());
        assert!(Endpoint::new("  ", false).directory_url().is_err());
    }
}
