//! Episode type representing one playable unit within a channel.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single episode of a podcast channel.
///
/// Every field is optional: feeds omit elements freely, and an absent
/// element is distinct from one present with empty text. Values are stored
/// verbatim; nothing is validated at parse time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Episode {
    /// Episode title.
    pub title: Option<String>,
    /// Show notes / description.
    pub description: Option<String>,
    /// Web page for the episode.
    pub link: Option<String>,
    /// Feed-supplied unique identifier.
    pub guid: Option<String>,
    /// Publication date, stored verbatim (usually RFC 2822).
    pub pub_date: Option<String>,
    /// Running time as supplied by the feed (`itunes:duration`).
    pub duration: Option<String>,
    /// The playable media attachment, if the feed supplied one.
    pub enclosure: Option<Enclosure>,
}

impl Episode {
    /// Create an episode carrying only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// The playable media URL, if any.
    ///
    /// Not validated here; the player checks it at play time.
    pub fn media_url(&self) -> Option<&str> {
        self.enclosure.as_ref().map(|e| e.url.as_str())
    }

    /// Title for display, falling back to the guid.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.guid.as_deref())
            .unwrap_or("(untitled)")
    }

    /// Publication instant, parsed lazily from `pub_date`.
    ///
    /// Returns `None` when the date is absent or not RFC 2822; the stored
    /// string is kept as-is either way.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        self.pub_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
    }
}

/// Media attachment of an episode (`<enclosure>`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enclosure {
    /// Media URL, stored as an opaque string.
    pub url: String,
    /// MIME type, e.g. `audio/mpeg`.
    pub mime_type: Option<String>,
    /// Size in bytes, when the feed supplied a usable value.
    pub length_bytes: Option<u64>,
}

impl Enclosure {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: None,
            length_bytes: None,
        }
    }
}
