//! Rewriting of video links into their embeddable form.

use thiserror::Error;

const EMBED_BASE: &str = "https://www.youtube.com/embed/";

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("No video id could be extracted from recognized video url: {0}")]
pub struct VideoIdExtractionError(String);

/// Rewrites a recognized video host url into its embeddable form.
///
/// Returns `Ok(Some(embed_url))` when the url belongs to a recognized host
/// and a video id could be extracted, `Ok(None)` for urls of unrecognized
/// hosts (callers pass those through unchanged), and an error when the url
/// looks like a recognized host but no id could be extracted (callers log
/// and fall back to the original url).
pub fn embed_url(url: &str) -> Result<Option<String>, VideoIdExtractionError> {
    if !url.contains("youtube.com") && !url.contains("youtu.be") {
        return Ok(None);
    }

    let video_id = if let Some((_, after)) = url.split_once("v=") {
        after.split(['&', '#']).next().unwrap_or("")
    } else if let Some((_, after)) = url.split_once("youtu.be/") {
        after.split(['?', '&', '#']).next().unwrap_or("")
    } else {
        ""
    };

    if video_id.is_empty() {
        return Err(VideoIdExtractionError(url.to_owned()));
    }

    Ok(Some(format!("{EMBED_BASE}{video_id}")))
}

#[cfg(test)]
mod tests {
    use crate::video::embed_url;

    #[test]
    fn short_youtube_links_are_rewritten() {
        assert_eq!(
            embed_url("https://youtu.be/abc123").unwrap().as_deref(),
            Some("https://www.youtube.com/embed/abc123")
        );
        assert_eq!(
            embed_url("https://youtu.be/abc123?t=42").unwrap().as_deref(),
            Some("https://www.youtube.com/embed/abc123")
        );
    }

    #[test]
    fn watch_links_extract_the_query_parameter() {
        assert_eq!(
            embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
                .unwrap()
                .as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
        assert_eq!(
            embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123")
                .unwrap()
                .as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn unrecognized_hosts_pass_through() {
        assert_eq!(embed_url("https://vimeo.com/12345").unwrap(), None);
        assert_eq!(embed_url("not a url at all").unwrap(), None);
    }

    #[test]
    fn recognized_hosts_without_an_id_are_an_error() {
        assert!(embed_url("https://www.youtube.com/feed/subscriptions").is_err());
        assert!(embed_url("https://youtu.be/").is_err());
        assert!(embed_url("https://www.youtube.com/watch?v=").is_err());
    }
}
