//! Opening script URLs in the default browser.

use log::{debug, warn};
use url::Url;

/// Parses `url` as an absolute `http`/`https` URL with a host.
pub fn web_url(url: &str) -> Option<Url> {
    let parsed = Url::parse(url.trim()).ok()?;
    let has_host = parsed.host_str().is_some_and(|host| !host.is_empty());

    (matches!(parsed.scheme(), "http" | "https") && has_host).then_some(parsed)
}

/// Whether `url` is an absolute web URL that is safe to hand to the browser.
pub fn is_web_url(url: &str) -> bool {
    web_url(url).is_some()
}

/// Opens `url` in the default browser, ignoring anything that is not an
/// absolute `http`/`https` URL.
pub fn open_url(url: &str) {
    let Some(parsed) = web_url(url) else {
        debug!("Not opening `{}`: not an http(s) URL", url);
        return;
    };

    if let Err(e) = open::that(parsed.as_str()) {
        warn!("Failed to open URL `{}`: {}", parsed, e);
    }
}
