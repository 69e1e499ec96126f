//! RSS parser for podcast feeds.

use monologue_core::{Channel, Enclosure, Episode, Error, Image, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

/// Parse a podcast feed document into a [`Channel`].
///
/// The document must contain a `channel` element, either bare or wrapped in
/// the usual `<rss>` root. Every sub-element is optional and independently
/// absent-tolerant; `item` and `image` elements are collected in document
/// order. Unknown elements are skipped. Only a structurally malformed
/// document or a missing `channel` yields an error.
pub fn parse_channel(xml: &str) -> Result<Channel> {
    let mut reader = Reader::from_str(xml);
    // Feed fields do not depend on surrounding whitespace.
    reader.config_mut().trim_text(true);

    let mut channel: Option<Channel> = None;
    let mut in_channel = false;
    let mut current_item: Option<Episode> = None;
    let mut current_image: Option<Image> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();
    // Depth of the unknown subtree currently being skipped, 0 when not
    // skipping.
    let mut skip_depth = 0usize;

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if skip_depth > 0 {
                    skip_depth += 1;
                } else if field.is_some() {
                    // Markup embedded in a text field is flattened to its
                    // text content.
                } else {
                    let name = e.name();
                    let name_str = std::str::from_utf8(name.as_ref()).unwrap_or("");

                    if !in_channel {
                        if name_str == "channel" && channel.is_none() {
                            channel = Some(Channel::default());
                            in_channel = true;
                        } else if name_str == "channel" {
                            // A second channel element; the first one wins.
                            debug!("ignoring extra channel element");
                            skip_depth = 1;
                        }
                        // Anything else out here is a wrapper such as
                        // <rss>; keep descending until a channel shows up.
                    } else if let Some(item) = current_item.as_mut() {
                        if let Some(f) = Field::for_item(name_str) {
                            field = Some(f);
                            text.clear();
                        } else if name_str == "enclosure" {
                            item.enclosure = parse_enclosure(&e);
                            skip_depth = 1;
                        } else {
                            skip_depth = 1;
                        }
                    } else if current_image.is_some() {
                        if let Some(f) = Field::for_image(name_str) {
                            field = Some(f);
                            text.clear();
                        } else {
                            skip_depth = 1;
                        }
                    } else if let Some(f) = Field::for_channel(name_str) {
                        field = Some(f);
                        text.clear();
                    } else if name_str == "item" {
                        current_item = Some(Episode::default());
                    } else if name_str == "image" {
                        current_image = Some(Image::default());
                    } else if name_str == "itunes:image" {
                        if let (Some(ch), Some(image)) =
                            (channel.as_mut(), parse_itunes_image(&e))
                        {
                            ch.images.push(image);
                        }
                        skip_depth = 1;
                    } else {
                        debug!("skipping unknown element <{name_str}>");
                        skip_depth = 1;
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if skip_depth > 0 || field.is_some() {
                    // Ignored: inside a skipped subtree or flattened into a
                    // text field.
                } else {
                    let name = e.name();
                    let name_str = std::str::from_utf8(name.as_ref()).unwrap_or("");

                    if !in_channel {
                        if name_str == "channel" && channel.is_none() {
                            // A self-closed channel is a valid, empty feed.
                            channel = Some(Channel::default());
                        }
                    } else if current_item.is_some() {
                        if name_str == "enclosure" {
                            if let Some(item) = current_item.as_mut() {
                                item.enclosure = parse_enclosure(&e);
                            }
                        } else if let Some(f) = Field::for_item(name_str) {
                            commit_field(
                                f,
                                String::new(),
                                &mut channel,
                                &mut current_item,
                                &mut current_image,
                            );
                        }
                    } else if current_image.is_some() {
                        if let Some(f) = Field::for_image(name_str) {
                            commit_field(
                                f,
                                String::new(),
                                &mut channel,
                                &mut current_item,
                                &mut current_image,
                            );
                        }
                    } else if let Some(f) = Field::for_channel(name_str) {
                        commit_field(
                            f,
                            String::new(),
                            &mut channel,
                            &mut current_item,
                            &mut current_image,
                        );
                    } else if let Some(ch) = channel.as_mut() {
                        if name_str == "item" {
                            ch.items.push(Episode::default());
                        } else if name_str == "image" {
                            ch.images.push(Image::default());
                        } else if name_str == "itunes:image" {
                            if let Some(image) = parse_itunes_image(&e) {
                                ch.images.push(image);
                            }
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if skip_depth == 0 && field.is_some() {
                    text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::CData(e)) => {
                if skip_depth == 0 && field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                } else {
                    let name = e.name();
                    let name_str = std::str::from_utf8(name.as_ref()).unwrap_or("");

                    if let Some(f) = field {
                        if name_str == f.tag() {
                            commit_field(
                                f,
                                std::mem::take(&mut text),
                                &mut channel,
                                &mut current_item,
                                &mut current_image,
                            );
                            field = None;
                        }
                        // Other end tags close markup embedded in the text.
                    } else if name_str == "item" {
                        if let (Some(ch), Some(item)) = (channel.as_mut(), current_item.take()) {
                            ch.items.push(item);
                        }
                    } else if name_str == "image" {
                        if let (Some(ch), Some(image)) = (channel.as_mut(), current_image.take()) {
                            ch.images.push(image);
                        }
                    } else if name_str == "channel" && in_channel {
                        in_channel = false;
                    }
                }
            }
            Ok(Event::Eof) => {
                if in_channel {
                    return Err(Error::Parse(
                        "unexpected end of document inside <channel>".into(),
                    ));
                }
                break;
            }
            Err(e) => return Err(Error::Parse(format!("invalid XML: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    let channel = channel.ok_or_else(|| Error::Parse("feed has no <channel> element".into()))?;
    debug!(
        items = channel.items.len(),
        images = channel.images.len(),
        "parsed feed"
    );
    Ok(channel)
}

/// Parse a feed from its raw byte stream.
///
/// The bytes are converted lossily to UTF-8 first; garbled text ends up as
/// replacement characters in the stored strings rather than failing the
/// parse.
pub fn parse_channel_bytes(xml: &[u8]) -> Result<Channel> {
    parse_channel(&String::from_utf8_lossy(xml))
}

/// Text-bearing element currently being read, by owner scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ChannelTitle,
    ChannelDescription,
    ChannelPubDate,
    ItemTitle,
    ItemDescription,
    ItemLink,
    ItemGuid,
    ItemPubDate,
    ItemDuration,
    ImageUrl,
    ImageTitle,
    ImageLink,
}

impl Field {
    fn for_channel(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::ChannelTitle),
            "description" => Some(Self::ChannelDescription),
            "pubDate" => Some(Self::ChannelPubDate),
            _ => None,
        }
    }

    fn for_item(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::ItemTitle),
            "description" => Some(Self::ItemDescription),
            "link" => Some(Self::ItemLink),
            "guid" => Some(Self::ItemGuid),
            "pubDate" => Some(Self::ItemPubDate),
            "itunes:duration" => Some(Self::ItemDuration),
            _ => None,
        }
    }

    fn for_image(name: &str) -> Option<Self> {
        match name {
            "url" => Some(Self::ImageUrl),
            "title" => Some(Self::ImageTitle),
            "link" => Some(Self::ImageLink),
            _ => None,
        }
    }

    /// Element name this field was opened by.
    const fn tag(self) -> &'static str {
        match self {
            Self::ChannelTitle | Self::ItemTitle | Self::ImageTitle => "title",
            Self::ChannelDescription | Self::ItemDescription => "description",
            Self::ChannelPubDate | Self::ItemPubDate => "pubDate",
            Self::ItemLink | Self::ImageLink => "link",
            Self::ItemGuid => "guid",
            Self::ItemDuration => "itunes:duration",
            Self::ImageUrl => "url",
        }
    }
}

/// Store a completed field value on whichever of channel, item, or image it
/// belongs to. An element present with empty text is stored as `Some("")`,
/// distinct from an absent element.
fn commit_field(
    field: Field,
    value: String,
    channel: &mut Option<Channel>,
    item: &mut Option<Episode>,
    image: &mut Option<Image>,
) {
    // Fields are only ever opened inside a channel.
    let Some(channel) = channel.as_mut() else {
        return;
    };
    let slot: &mut Option<String> = match field {
        Field::ChannelTitle => &mut channel.title,
        Field::ChannelDescription => &mut channel.description,
        Field::ChannelPubDate => &mut channel.pub_date,
        Field::ItemTitle => match item.as_mut() {
            Some(i) => &mut i.title,
            None => return,
        },
        Field::ItemDescription => match item.as_mut() {
            Some(i) => &mut i.description,
            None => return,
        },
        Field::ItemLink => match item.as_mut() {
            Some(i) => &mut i.link,
            None => return,
        },
        Field::ItemGuid => match item.as_mut() {
            Some(i) => &mut i.guid,
            None => return,
        },
        Field::ItemPubDate => match item.as_mut() {
            Some(i) => &mut i.pub_date,
            None => return,
        },
        Field::ItemDuration => match item.as_mut() {
            Some(i) => &mut i.duration,
            None => return,
        },
        Field::ImageUrl => match image.as_mut() {
            Some(i) => &mut i.url,
            None => return,
        },
        Field::ImageTitle => match image.as_mut() {
            Some(i) => &mut i.title,
            None => return,
        },
        Field::ImageLink => match image.as_mut() {
            Some(i) => &mut i.link,
            None => return,
        },
    };
    *slot = Some(value);
}

/// Media attachment from an `<enclosure>` tag. An enclosure without a `url`
/// attribute is treated as absent; a garbage `length` is dropped while the
/// enclosure itself is kept.
fn parse_enclosure(e: &BytesStart<'_>) -> Option<Enclosure> {
    let mut url = None;
    let mut mime_type = None;
    let mut length_bytes = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
        let value = attr.unescape_value().unwrap_or_default();
        match key {
            "url" => url = Some(value.into_owned()),
            "type" => mime_type = Some(value.into_owned()),
            "length" => length_bytes = value.trim().parse().ok(),
            _ => {}
        }
    }

    Some(Enclosure {
        url: url?,
        mime_type,
        length_bytes,
    })
}

/// Channel artwork from an `<itunes:image href="..."/>` tag.
fn parse_itunes_image(e: &BytesStart<'_>) -> Option<Image> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"href" {
            let url = attr.unescape_value().unwrap_or_default().into_owned();
            return Some(Image {
                url: Some(url),
                title: None,
                link: None,
            });
        }
    }
    None
}
