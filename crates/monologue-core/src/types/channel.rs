//! Channel type representing a parsed podcast feed.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::Episode;

/// A parsed podcast feed.
///
/// Field absence mirrors the feed: every sub-element of `<channel>` is
/// optional. `items` and `images` are always present, possibly empty, and
/// keep document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    /// Internal identifier tagging the feed's source. Not part of the feed
    /// itself; assigned by the caller after parsing.
    pub short_name: Option<String>,
    /// Feed title.
    pub title: Option<String>,
    /// Feed description.
    pub description: Option<String>,
    /// Publication date, stored verbatim.
    pub pub_date: Option<String>,
    /// Episodes in document order.
    pub items: Vec<Episode>,
    /// Feed artwork in document order.
    pub images: Vec<Image>,
}

impl Channel {
    /// Tag the channel with the identifier of the feed it came from.
    #[must_use]
    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    /// First artwork URL, if the feed supplied any.
    pub fn artwork_url(&self) -> Option<&str> {
        self.images.iter().find_map(|i| i.url.as_deref())
    }

    /// Publication instant, parsed lazily from `pub_date`.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        self.pub_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
    }
}

/// Feed-level artwork (`<image>` or `<itunes:image>`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    /// Image URL.
    pub url: Option<String>,
    /// Image title.
    pub title: Option<String>,
    /// Link target for the image.
    pub link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_short_name() {
        let channel = Channel::default().with_short_name("night-static");
        assert_eq!(channel.short_name.as_deref(), Some("night-static"));
    }

    #[test]
    fn test_artwork_url_skips_urlless_images() {
        let channel = Channel {
            images: vec![
                Image {
                    title: Some("cover".into()),
                    ..Image::default()
                },
                Image {
                    url: Some("https://example.com/cover.jpg".into()),
                    ..Image::default()
                },
            ],
            ..Channel::default()
        };
        assert_eq!(channel.artwork_url(), Some("https://example.com/cover.jpg"));
        assert!(Channel::default().artwork_url().is_none());
    }

    #[test]
    fn test_published_at() {
        let channel = Channel {
            pub_date: Some("Mon, 01 Jan 2024 08:00:00 GMT".into()),
            ..Channel::default()
        };
        assert!(channel.published_at().is_some());
        assert!(Channel::default().published_at().is_none());
    }
}
