// src/ingest/entry.rs
// Extracts the single most-recent entry from the feed document with a
// streaming tag scanner. The upstream feed is append-newest-first, so the
// first <item> is the one to process. The body HTML arrives either under
// <content:encoded> (richer, preferred) or <description>.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub publish_date_raw: Option<String>,
    pub link: String,
    pub body_html: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    Content,
    Description,
}

#[derive(Default)]
struct RawEntry {
    title: String,
    link: String,
    pub_date: String,
    content: String,
    description: String,
}

impl RawEntry {
    fn slot(&mut self, f: Field) -> &mut String {
        match f {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::Content => &mut self.content,
            Field::Description => &mut self.description,
        }
    }
}

/// Parse the first entry element out of the raw feed document.
///
/// The scanner is deliberately tolerant: mismatched end tags and undeclared
/// namespace prefixes never abort the scan, and a low-level reader error is
/// treated as end-of-document rather than propagated.
pub fn parse_latest_entry(doc: &str) -> Result<FeedEntry, PipelineError> {
    let mut reader = Reader::from_str(doc);
    reader.config_mut().check_end_names = false;

    let mut in_entry = false;
    let mut entry_seen = false;
    let mut raw = RawEntry::default();
    let mut current: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                match name.as_ref() {
                    b"item" | b"entry" if !entry_seen => {
                        in_entry = true;
                        entry_seen = true;
                    }
                    b"title" if in_entry => current = Some(Field::Title),
                    b"link" if in_entry => current = Some(Field::Link),
                    b"pubDate" if in_entry => current = Some(Field::PubDate),
                    b"content:encoded" if in_entry => current = Some(Field::Content),
                    b"description" | b"summary" if in_entry => current = Some(Field::Description),
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(f) = current {
                    raw.slot(f).push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(f) = current {
                    raw.slot(f).push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" | b"entry" if in_entry => break,
                b"title" | b"link" | b"pubDate" | b"content:encoded" | b"description"
                | b"summary" => current = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!(error = ?e, "feed scan stopped on malformed markup");
                break;
            }
            Ok(_) => {}
        }
    }

    if !entry_seen {
        return Err(PipelineError::NoEntryFound);
    }

    // Richer content wins; an empty body field counts as absent.
    let body = if !raw.content.trim().is_empty() {
        raw.content
    } else if !raw.description.trim().is_empty() {
        raw.description
    } else {
        return Err(PipelineError::NoBodyContent);
    };

    let pub_date = decode_field(&raw.pub_date);
    Ok(FeedEntry {
        title: decode_field(&raw.title),
        publish_date_raw: if pub_date.is_empty() {
            None
        } else {
            Some(pub_date)
        },
        link: decode_field(&raw.link),
        body_html: decode_field(&body),
    })
}

/// Strip stray CDATA markers and decode HTML character entities
/// (`&lt; &gt; &amp; &quot; &#39;` plus named entities) once per field.
fn decode_field(s: &str) -> String {
    let stripped = s.replace("<![CDATA[", "").replace("]]>", "");
    html_escape::decode_html_entities(&stripped)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cdata_wrapped_fields() {
        let xml = r#"<rss><channel>
            <title>channel title</title>
            <item>
              <title><![CDATA[2026-02-06日刊]]></title>
              <link>https://example.test/daily/2026-02-06</link>
              <pubDate>Fri, 06 Feb 2026 01:00:00 GMT</pubDate>
              <content:encoded><![CDATA[<ol><li>hello world item</li></ol>]]></content:encoded>
            </item>
        </channel></rss>"#;
        let entry = parse_latest_entry(xml).unwrap();
        assert_eq!(entry.title, "2026-02-06日刊");
        assert_eq!(entry.link, "https://example.test/daily/2026-02-06");
        assert_eq!(
            entry.publish_date_raw.as_deref(),
            Some("Fri, 06 Feb 2026 01:00:00 GMT")
        );
        assert_eq!(entry.body_html, "<ol><li>hello world item</li></ol>");
    }

    #[test]
    fn content_encoded_wins_over_description() {
        let xml = r#"<rss><channel><item>
            <title>t</title>
            <description><![CDATA[<p>thin</p>]]></description>
            <content:encoded><![CDATA[<p>rich</p>]]></content:encoded>
        </item></channel></rss>"#;
        let entry = parse_latest_entry(xml).unwrap();
        assert_eq!(entry.body_html, "<p>rich</p>");
    }

    #[test]
    fn escaped_body_entities_are_decoded() {
        let xml = r#"<rss><channel><item>
            <title>Tom &amp; Jerry &#39;daily&#39;</title>
            <description>&lt;ul&gt;&lt;li&gt;a &quot;quoted&quot; headline here&lt;/li&gt;&lt;/ul&gt;</description>
        </item></channel></rss>"#;
        let entry = parse_latest_entry(xml).unwrap();
        assert_eq!(entry.title, "Tom & Jerry 'daily'");
        assert_eq!(
            entry.body_html,
            r#"<ul><li>a "quoted" headline here</li></ul>"#
        );
    }

    #[test]
    fn no_item_is_fatal() {
        let xml = "<rss><channel><title>empty feed</title></channel></rss>";
        assert!(matches!(
            parse_latest_entry(xml),
            Err(PipelineError::NoEntryFound)
        ));
    }

    #[test]
    fn empty_body_field_is_fatal() {
        let xml = r#"<rss><channel><item>
            <title>t</title>
            <description><![CDATA[]]></description>
        </item></channel></rss>"#;
        assert!(matches!(
            parse_latest_entry(xml),
            Err(PipelineError::NoBodyContent)
        ));
    }

    #[test]
    fn only_first_item_is_consumed() {
        let xml = r#"<rss><channel>
            <item><title>first</title><description>first body text</description></item>
            <item><title>second</title><description>second body text</description></item>
        </channel></rss>"#;
        let entry = parse_latest_entry(xml).unwrap();
        assert_eq!(entry.title, "first");
        assert_eq!(entry.body_html, "first body text");
    }
}
