//! Sitemap parser
//!
//! Detects the sitemap format and normalizes entries:
//!
//! - JSON: `{ "urls": [{ "url": ..., "lastmod"?, "changefreq"?, "priority"? }] }`
//! - XML: `<urlset><url><loc/><lastmod/><changefreq/><priority/></url></urlset>`
//!
//! JSON is attempted first; anything that is not a JSON object is read as XML.
//! Entries without an absolute `loc`/`url` are dropped. Optional JSON fields
//! of the wrong type are ignored per entry, and XML fields are only taken
//! from direct children of `<url>` so extension elements such as
//! `<image:loc>` never leak into the page's location.

use crate::sitemap::SitemapEntry;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Sitemap content could not be read as JSON nor as well-formed XML
#[derive(Debug, Error)]
#[error("Malformed sitemap at position {position}: {message}")]
pub struct ParseError {
    pub position: u64,
    pub message: String,
}

/// Detected sitemap format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapFormat {
    Json,
    Xml,
}

/// Parses sitemap content into normalized entries
///
/// # Returns
///
/// * `Ok((SitemapFormat, Vec<SitemapEntry>))` - Detected format and entries, possibly empty
/// * `Err(ParseError)` - Content is neither a JSON sitemap nor well-formed XML
///
/// # Example
///
/// ```
/// use sumi_lens::sitemap::parse_sitemap;
///
/// let xml = "<urlset><url><loc>https://x.test/a</loc><priority>0.8</priority></url></urlset>";
/// let (_, entries) = parse_sitemap(xml).unwrap();
/// assert_eq!(entries[0].slug, "a");
/// assert_eq!(entries[0].priority, Some(0.8));
/// ```
pub fn parse_sitemap(content: &str) -> Result<(SitemapFormat, Vec<SitemapEntry>), ParseError> {
    if let Ok(Value::Object(sitemap)) = serde_json::from_str::<Value>(content) {
        let entries = match sitemap.get("urls") {
            Some(Value::Array(urls)) => urls.iter().filter_map(json_entry).collect(),
            _ => Vec::new(),
        };
        return Ok((SitemapFormat::Json, entries));
    }

    parse_xml(content).map(|entries| (SitemapFormat::Xml, entries))
}

/// Reads one `urls` element; anything but an object with a string `url` is skipped
fn json_entry(raw: &Value) -> Option<SitemapEntry> {
    let url = match raw.get("url") {
        Some(Value::String(url)) => url,
        _ => {
            tracing::debug!("Skipping JSON sitemap entry without a url: {}", raw);
            return None;
        }
    };

    let priority = match raw.get("priority") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    build_entry(
        url,
        json_text(raw.get("lastmod")),
        json_text(raw.get("changefreq")),
        priority,
    )
}

/// Strings pass through and numbers are rendered; other types are ignored
fn json_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Fields collected while inside one `<url>` element
#[derive(Default)]
struct RawXmlUrl {
    loc: Option<String>,
    lastmod: Option<String>,
    changefreq: Option<String>,
    priority: Option<String>,
}

impl RawXmlUrl {
    fn set(&mut self, tag: &str, text: String) {
        let slot = match tag {
            "loc" => &mut self.loc,
            "lastmod" => &mut self.lastmod,
            "changefreq" => &mut self.changefreq,
            "priority" => &mut self.priority,
            _ => return,
        };
        slot.get_or_insert_with(String::new).push_str(&text);
    }

    fn into_entry(self) -> Option<SitemapEntry> {
        let loc = self.loc?;
        let priority = self.priority.and_then(|p| p.trim().parse::<f64>().ok());
        build_entry(&loc, self.lastmod, self.changefreq, priority)
    }
}

fn parse_xml(content: &str) -> Result<Vec<SitemapEntry>, ParseError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<RawXmlUrl> = None;
    // Nesting below the open <url>; fields live at depth 1
    let mut depth = 0usize;
    let mut field: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| ParseError {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(e) => {
                if current.is_some() {
                    depth += 1;
                    field = (depth == 1)
                        .then(|| String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                } else if e.local_name().as_ref() == b"url" {
                    current = Some(RawXmlUrl::default());
                    depth = 0;
                }
            }
            Event::Text(e) => {
                if let (Some(raw), Some(tag)) = (current.as_mut(), field.as_deref()) {
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    raw.set(tag, text);
                }
            }
            Event::CData(e) => {
                if let (Some(raw), Some(tag)) = (current.as_mut(), field.as_deref()) {
                    raw.set(tag, String::from_utf8_lossy(&e).into_owned());
                }
            }
            Event::End(_) => {
                if current.is_some() {
                    if depth == 0 {
                        if let Some(entry) = current.take().and_then(RawXmlUrl::into_entry) {
                            entries.push(entry);
                        }
                    } else {
                        depth -= 1;
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Builds an entry from raw fields, skipping locations that are not absolute URLs
fn build_entry(
    loc: &str,
    lastmod: Option<String>,
    changefreq: Option<String>,
    priority: Option<f64>,
) -> Option<SitemapEntry> {
    let url = match Url::parse(loc.trim()) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Skipping sitemap entry with invalid URL '{}': {}", loc, e);
            return None;
        }
    };

    let mut entry = SitemapEntry::from_url(&url);
    entry.last_modified = non_empty(lastmod);
    entry.change_frequency = non_empty(changefreq);
    entry.priority = priority.filter(|p| (0.0..=1.0).contains(p));
    Some(entry)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
