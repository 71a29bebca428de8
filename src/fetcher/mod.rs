//! HTTP fetch abstraction and the `ureq`-backed implementation.

pub mod ureq_fetcher;

/// Interface implemented by concrete page/image downloaders.
pub trait HttpFetcher {
    /// Downloads an HTML page as text.
    fn fetch_text(&self, url: &str) -> Result<String, String>;
    /// Downloads raw bytes, sending `referer` as the `Referer` header.
    fn fetch_bytes(&self, url: &str, referer: &str) -> Result<Vec<u8>, String>;
}
