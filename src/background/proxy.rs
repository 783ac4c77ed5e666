//! URL rewrite for the external resize service.
//!
//! The service answers `GET <base>/<token>?url=<image>&size=<W>x<H>&quality=<Q>`
//! with the image cover-cropped to the requested size, so a 6000px photo
//! arrives already scaled to the window.

use url::Url;

use crate::{warn, DEBUG_NAME};

pub const DEFAULT_QUALITY: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProxy {
    pub base_url: String,
    pub token: String,
    pub quality: u8,
}

impl ImageProxy {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, quality: u8) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            quality: quality.clamp(1, 100),
        }
    }

    /// Rewrites `url` to go through the service. A zero-sized viewport or an
    /// unusable base URL leaves `url` untouched.
    pub fn rewrite(&self, url: &str, width: u32, height: u32) -> String {
        if width == 0 || height == 0 {
            return url.to_string();
        }

        let mut proxied = match Url::parse(&self.base_url) {
            Ok(base) if !base.cannot_be_a_base() => base,
            _ => {
                warn!(
                    "[{}][PROXY] Invalid proxy base URL '{}'; using images directly",
                    DEBUG_NAME,
                    self.base_url
                );
                return url.to_string();
            }
        };

        if let Ok(mut segments) = proxied.path_segments_mut() {
            segments.pop_if_empty();
            segments.push(&self.token);
        }

        proxied
            .query_pairs_mut()
            .clear()
            .append_pair("url", url)
            .append_pair("size", &format!("{width}x{height}"))
            .append_pair("quality", &self.quality.clamp(1, 100).to_string());

        proxied.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_service_request() {
        let proxy = ImageProxy::new("https://resize.example.com", "s3cret", 80);
        let rewritten = proxy.rewrite("https://img.example.com/a b.png?x=1", 1920, 1080);

        let parsed = Url::parse(&rewritten).unwrap();
        assert_eq!(parsed.host_str(), Some("resize.example.com"));
        assert_eq!(parsed.path(), "/s3cret");

        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("url".to_string(), "https://img.example.com/a b.png?x=1".to_string()),
                ("size".to_string(), "1920x1080".to_string()),
                ("quality".to_string(), "80".to_string()),
            ]
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let proxy = ImageProxy::new("http://host:8080/proxy/", "tok", DEFAULT_QUALITY);
        let rewritten = proxy.rewrite("http://a", 800, 600);
        assert!(rewritten.starts_with("http://host:8080/proxy/tok?url="));
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(ImageProxy::new("http://h", "t", 0).quality, 1);
        assert_eq!(ImageProxy::new("http://h", "t", 250).quality, 100);
    }

    #[test]
    fn unusable_inputs_pass_through() {
        let proxy = ImageProxy::new("not a url", "t", 90);
        assert_eq!(proxy.rewrite("http://a", 100, 100), "http://a");

        let proxy = ImageProxy::new("http://h", "t", 90);
        assert_eq!(proxy.rewrite("http://a", 0, 100), "http://a");
    }
}
