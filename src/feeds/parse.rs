//! Feed document parsing.
//!
//! One forward pass over an RSS 2.0 or Atom document, collecting the handful
//! of per-item fields the pipeline cares about into [`RawEntry`] values.
//! Field text is captured verbatim (entity references resolved, CDATA taken
//! literally); whitespace normalization and HTML stripping happen later in
//! the pipeline.

use crate::models::RawEntry;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::error::Error;

/// Which entry field open-tag routing selected for incoming text.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Summary,
    Content,
    Published,
    Updated,
}

/// The field a qualified element name feeds, if any.
///
/// Names are matched with their prefix so `media:content` attachments do not
/// collide with Atom `content` or RSS `content:encoded` bodies.
fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"description" | b"summary" => Some(Field::Summary),
        b"content:encoded" | b"encoded" | b"content" => Some(Field::Content),
        b"pubDate" | b"published" | b"dc:date" | b"date" => Some(Field::Published),
        b"updated" => Some(Field::Updated),
        _ => None,
    }
}

/// Decode raw XML text bytes, resolving character and entity references.
fn decode_text(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    html_escape::decode_html_entities(text.as_ref()).into_owned()
}

fn append(current: &mut Option<RawEntry>, field: Option<Field>, text: &str) {
    let Some(entry) = current.as_mut() else {
        return;
    };
    let Some(field) = field else {
        return;
    };
    let slot = match field {
        Field::Title => &mut entry.title,
        Field::Link => &mut entry.link,
        Field::Summary => &mut entry.summary,
        Field::Content => &mut entry.content,
        Field::Published => &mut entry.published,
        Field::Updated => &mut entry.updated,
    };
    slot.push_str(text);
}

/// Parse one feed document into raw entries.
///
/// Both RSS 2.0 (`<item>`) and Atom (`<entry>`) items are recognized. Within
/// an item the first occurrence of each field wins; Atom `<link>` elements
/// prefer the `rel="alternate"` target, falling back to the first link seen.
/// Nested markup inside a field (xhtml content) contributes its text.
///
/// # Arguments
///
/// * `xml` - The full response body of a feed endpoint.
///
/// # Returns
///
/// The items in document order. Feed-level elements outside any item are
/// ignored.
///
/// # Errors
///
/// Returns an error when the document is not well formed; callers treat that
/// as a failed source and move on.
pub fn parse_feed(xml: &str) -> Result<Vec<RawEntry>, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);
    let mut entries: Vec<RawEntry> = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    current = Some(RawEntry::default());
                    field = None;
                }
                name => {
                    let Some(entry) = current.as_mut() else {
                        continue;
                    };
                    match field_for(name) {
                        Some(Field::Link) => {
                            let mut href: Option<String> = None;
                            let mut rel: Option<String> = None;
                            for attr in e.attributes().flatten() {
                                let value = decode_text(&attr.value);
                                match attr.key.as_ref() {
                                    b"href" => href = Some(value),
                                    b"rel" => rel = Some(value),
                                    _ => {}
                                }
                            }
                            if let Some(href) = href {
                                // Atom-style link: the target is an attribute.
                                let rel = rel.as_deref().unwrap_or("alternate");
                                if rel == "alternate" || entry.link.is_empty() {
                                    entry.link = href;
                                }
                                field = None;
                            } else if entry.link.is_empty() {
                                field = Some(Field::Link);
                            } else {
                                field = None;
                            }
                        }
                        Some(target) => {
                            let slot_empty = match target {
                                Field::Title => entry.title.is_empty(),
                                Field::Link => unreachable!(),
                                Field::Summary => entry.summary.is_empty(),
                                Field::Content => entry.content.is_empty(),
                                Field::Published => entry.published.is_empty(),
                                Field::Updated => entry.updated.is_empty(),
                            };
                            field = if slot_empty { Some(target) } else { None };
                        }
                        // Unknown markup nested inside a field keeps feeding
                        // text to that field (xhtml content bodies).
                        None => {}
                    }
                }
            },
            Event::End(e) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                    field = None;
                }
                name => {
                    if field.is_some() && field_for(name) == field {
                        field = None;
                    }
                }
            },
            Event::Text(e) => {
                let text = decode_text(&e);
                append(&mut current, field, &text);
            }
            Event::GeneralRef(e) => {
                // Entity references inside text arrive as their own events;
                // reassemble and decode so `&amp;` lands as a plain `&`.
                let text = decode_text(format!("&{};", String::from_utf8_lossy(&e)).as_bytes());
                append(&mut current, field, &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                append(&mut current, field, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}

/// Parse a timestamp string in the formats feeds actually use.
///
/// RFC 2822 (RSS `pubDate`) and RFC 3339 (Atom) are tried first, then two
/// naive fallbacks that are assumed to be UTC.
fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Best publication timestamp for an entry: `published` first, `updated` as
/// the fallback, `None` when neither parses.
pub fn entry_datetime(entry: &RawEntry) -> Option<DateTime<Utc>> {
    parse_datetime(&entry.published).or_else(|| parse_datetime(&entry.updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Feed Title Not An Item</title>
    <link>https://feed.example/</link>
    <item>
      <title>Patch Tuesday fixes &amp; fallout</title>
      <link>https://feed.example/a?x=1&amp;y=2</link>
      <description><![CDATA[<p>Sixty bugs, two &amp; counting exploited.</p>]]></description>
      <media:content url="https://feed.example/a.jpg"/>
      <content:encoded><![CDATA[<p>The full story body.</p>]]></content:encoded>
      <pubDate>Fri, 06 Jun 2025 09:00:00 +0000</pubDate>
    </item>
    <item>
      <title>Second story</title>
      <link>https://feed.example/b</link>
      <description>Short take.</description>
      <pubDate>Thu, 05 Jun 2025 18:30:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM_DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Feed Title Not An Entry</title>
  <link href="https://feed.example/" rel="self"/>
  <entry>
    <title>It&#8217;s patched upstream</title>
    <link rel="enclosure" href="https://feed.example/audio.mp3"/>
    <link rel="alternate" href="https://feed.example/post/1"/>
    <summary>One-line teaser.</summary>
    <content type="xhtml"><div>Hello <b>world</b> content</div></content>
    <published>2025-06-06T09:00:00Z</published>
    <updated>2025-06-06T10:00:00Z</updated>
  </entry>
  <entry>
    <title>Only an enclosure link</title>
    <link rel="enclosure" href="https://feed.example/file.pdf"/>
    <updated>2025-06-05T12:00:00+02:00</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items() {
        let entries = parse_feed(RSS_DOC).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title, "Patch Tuesday fixes & fallout");
        assert_eq!(first.link, "https://feed.example/a?x=1&y=2");
        assert_eq!(
            first.summary,
            "<p>Sixty bugs, two &amp; counting exploited.</p>"
        );
        assert_eq!(first.content.trim(), "<p>The full story body.</p>");
        assert_eq!(first.published, "Fri, 06 Jun 2025 09:00:00 +0000");

        assert_eq!(entries[1].title, "Second story");
        assert_eq!(entries[1].summary, "Short take.");
    }

    #[test]
    fn test_parse_atom_entries() {
        let entries = parse_feed(ATOM_DOC).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title, "It’s patched upstream");
        // The alternate link wins over the enclosure.
        assert_eq!(first.link, "https://feed.example/post/1");
        assert_eq!(first.summary, "One-line teaser.");
        assert!(first.content.contains("Hello "));
        assert!(first.content.contains("world"));
        assert!(first.content.contains("content"));
        assert_eq!(first.published, "2025-06-06T09:00:00Z");
        assert_eq!(first.updated, "2025-06-06T10:00:00Z");

        // With no alternate, the first link seen is kept.
        assert_eq!(entries[1].link, "https://feed.example/file.pdf");
        assert!(entries[1].published.is_empty());
    }

    #[test]
    fn test_feed_level_elements_are_ignored() {
        let entries = parse_feed(RSS_DOC).unwrap();
        assert!(entries.iter().all(|e| !e.title.contains("Feed Title")));
        let entries = parse_feed(ATOM_DOC).unwrap();
        assert!(entries.iter().all(|e| e.link != "https://feed.example/"));
    }

    #[test]
    fn test_parse_feed_rejects_malformed_xml() {
        assert!(parse_feed("<rss><channel><item><title>broken<").is_err());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let rfc2822 = parse_datetime("Fri, 06 Jun 2025 09:00:00 +0000").unwrap();
        assert_eq!(rfc2822.to_rfc3339(), "2025-06-06T09:00:00+00:00");

        let rfc3339 = parse_datetime("2025-06-06T09:00:00+02:00").unwrap();
        assert_eq!(rfc3339.to_rfc3339(), "2025-06-06T07:00:00+00:00");

        let naive = parse_datetime("2025-06-06 09:00:00").unwrap();
        assert_eq!(naive.to_rfc3339(), "2025-06-06T09:00:00+00:00");

        let naive_t = parse_datetime("2025-06-06T09:00:00").unwrap();
        assert_eq!(naive_t.to_rfc3339(), "2025-06-06T09:00:00+00:00");

        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("next tuesday").is_none());
    }

    #[test]
    fn test_entry_datetime_prefers_published() {
        let entry = RawEntry {
            published: "2025-06-06T09:00:00Z".to_string(),
            updated: "2025-06-06T11:00:00Z".to_string(),
            ..Default::default()
        };
        let dt = entry_datetime(&entry).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-06-06T09:00:00+00:00");

        let entry = RawEntry {
            published: "garbage".to_string(),
            updated: "2025-06-06T11:00:00Z".to_string(),
            ..Default::default()
        };
        let dt = entry_datetime(&entry).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-06-06T11:00:00+00:00");

        assert!(entry_datetime(&RawEntry::default()).is_none());
    }
}
