use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};

pub const YTM_ORIGIN: &str = "https://music.youtube.com";

/// Request headers copied from a signed-in music.youtube.com browser tab.
#[derive(Debug, Clone)]
pub struct BrowserHeaders {
    headers: BTreeMap<String, String>,
    sapisid: String,
}

impl BrowserHeaders {
    /// Parses `name: value` lines as copied from the browser's network tab.
    pub fn parse(raw: &str) -> Result<Self> {
        let headers: BTreeMap<String, String> = raw
            .lines()
            .map(str::trim)
            // HTTP/2 pseudo headers (":authority: ...") are not forwarded
            .filter(|line| !line.starts_with(':'))
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_lowercase(), value.trim().to_string()))
            .filter(|(name, _)| !name.is_empty())
            .collect();

        let cookie = headers
            .get("cookie")
            .ok_or_else(|| AppError::Config("YouTube Music headers contain no cookie".into()))?;

        let sapisid = cookie_value(cookie, "__Secure-3PAPISID")
            .or_else(|| cookie_value(cookie, "SAPISID"))
            .ok_or_else(|| {
                AppError::Config(
                    "YouTube Music cookie has no SAPISID, copy the headers from a signed-in session"
                        .into(),
                )
            })?
            .to_string();

        Ok(Self { headers, sapisid })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn cookie(&self) -> &str {
        self.headers.get("cookie").map(String::as_str).unwrap_or_default()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get("user-agent").map(String::as_str)
    }

    pub fn auth_user(&self) -> &str {
        self.headers
            .get("x-goog-authuser")
            .map(String::as_str)
            .unwrap_or("0")
    }

    /// `SAPISIDHASH` authorization value for a request made at `timestamp` (unix seconds).
    pub fn authorization(&self, timestamp: i64) -> String {
        let digest = Sha1::digest(format!("{} {} {}", timestamp, self.sapisid, YTM_ORIGIN));
        format!("SAPISIDHASH {}_{:x}", timestamp, digest)
    }
}

fn cookie_value<'a>(cookie: &'a str, name: &str) -> Option<&'a str> {
    cookie
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
:authority: music.youtube.com
accept: */*
Cookie: YSC=abc; SAPISID=AbCdEf/GhIjKl; PREF=f6=40000000
User-Agent: Mozilla/5.0 (X11; Linux x86_64)
X-Goog-AuthUser: 1
";

    #[test]
    fn test_parse_browser_headers() {
        let headers = BrowserHeaders::parse(RAW).unwrap();

        assert!(headers.cookie().contains("SAPISID=AbCdEf/GhIjKl"));
        assert_eq!(headers.user_agent(), Some("Mozilla/5.0 (X11; Linux x86_64)"));
        assert_eq!(headers.auth_user(), "1");
    }

    #[test]
    fn test_authorization_hash() {
        let headers = BrowserHeaders::parse(RAW).unwrap();
        assert_eq!(
            headers.authorization(1700000000),
            "SAPISIDHASH 1700000000_f94604cfaeaf93ea9ec7b9c6f2a6dd01e13d0e1c"
        );
    }

    #[test]
    fn test_secure_sapisid_preferred() {
        let headers = BrowserHeaders::parse(
            "cookie: SAPISID=old; __Secure-3PAPISID=AbCdEf/GhIjKl",
        )
        .unwrap();
        assert_eq!(
            headers.authorization(1700000000),
            "SAPISIDHASH 1700000000_f94604cfaeaf93ea9ec7b9c6f2a6dd01e13d0e1c"
        );
    }

    #[test]
    fn test_signed_out_headers_rejected() {
        assert!(BrowserHeaders::parse("accept: */*").is_err());
        assert!(BrowserHeaders::parse("cookie: YSC=abc").is_err());
    }
}
