//! Turning whatever the user pasted into a playable URL and a video id.

use url::{Url, form_urlencoded};

/// Prefix of the private scheme the desktop launcher hands us.
pub const CUSTOM_SCHEME: &str = "ytdlp://";

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const SHORT_LINK_HOST: &str = "youtu.be";

/// Rewrites `ytdlp://<id>` into the watch-page URL; anything else is returned as is.
pub fn normalize(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_prefix(CUSTOM_SCHEME) {
        Some(id) => format!("{WATCH_URL}{id}"),
        None => raw.to_string(),
    }
}

/// Extracts the video id from a short link (`youtu.be/<id>`) or from the
/// first `v` query parameter. Malformed input simply yields `None`.
pub fn extract_video_id(url: &str) -> Option<String> {
    let Ok(parsed) = Url::parse(url) else {
        return query_video_id(url);
    };

    let id = if parsed
        .host_str()
        .is_some_and(|host| host.contains(SHORT_LINK_HOST))
    {
        parsed.path().trim_start_matches('/').to_string()
    } else {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?
    };

    if id.is_empty() { None } else { Some(id) }
}

/// Fallback for text `Url` rejects, e.g. `www.youtube.com/watch?v=<id>`
/// pasted without a scheme: reads `v` from whatever follows the first `?`.
/// Without a host there is no short-link form to recognise.
fn query_video_id(text: &str) -> Option<String> {
    let (_, rest) = text.split_once('?')?;
    let query = rest.split('#').next().unwrap_or_default();
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_scheme_becomes_watch_url() {
        assert_eq!(
            normalize("ytdlp://abc123"),
            "https://www.youtube.com/watch?v=abc123"
        );
        assert_eq!(
            normalize("  ytdlp://abc123\n"),
            "https://www.youtube.com/watch?v=abc123"
        );
    }

    #[test]
    fn other_urls_pass_through() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://example.com/some/page",
            "not a url",
        ] {
            assert_eq!(normalize(url), url);
        }
    }

    #[test]
    fn watch_url_uses_first_v_parameter() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=PL1&v=abc&v=def&t=42").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn short_link_uses_path() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://youtu.be//xyz").as_deref(),
            Some("xyz")
        );
    }

    #[test]
    fn schemeless_watch_url_still_yields_id() {
        assert_eq!(
            extract_video_id("www.youtube.com/watch?v=abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_video_id("youtube.com/watch?t=10&v=abc123#comments").as_deref(),
            Some("abc123")
        );
        assert_eq!(extract_video_id("www.youtube.com/watch?v=&t=3"), None);
        // A short link needs a host to be recognised.
        assert_eq!(extract_video_id("youtu.be/abc123"), None);
    }

    #[test]
    fn normalized_custom_scheme_yields_its_id() {
        let url = normalize("ytdlp://abc123");
        assert_eq!(extract_video_id(&url).as_deref(), Some("abc123"));
    }

    #[test]
    fn unmatched_input_yields_none() {
        assert_eq!(extract_video_id("https://www.youtube.com/feed/trending"), None);
        assert_eq!(extract_video_id("https://youtu.be/"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(extract_video_id("just some text"), None);
        assert_eq!(extract_video_id(""), None);
    }
}
