use std::io::Cursor;

use quick_xml::events::Event;
use quick_xml::Reader;
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use sitemap::structs::{SiteMapEntry, UrlEntry};
use sitemap::writer::SiteMapWriter;

use super::paginate::{IndexEntry, SitemapDocument};
use super::urlset::ChangeFreq;
use crate::error::FetchError;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Markers of an HTML error page or a client-side app shell served where
/// XML was expected. Matched against the lowercased body.
const BLACKLIST: &[&str] = &[
    "<!doctype html",
    "<html",
    "<script",
    "__next_data__",
    "/_next/static/",
    "webpackchunk",
    "__webpack_require__",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootElement {
    UrlSet,
    SitemapIndex,
}

impl RootElement {
    pub fn name(self) -> &'static str {
        match self {
            RootElement::UrlSet => "urlset",
            RootElement::SitemapIndex => "sitemapindex",
        }
    }
}

fn change_freq(freq: ChangeFreq) -> sitemap::structs::ChangeFreq {
    match freq {
        ChangeFreq::Daily => sitemap::structs::ChangeFreq::Daily,
        ChangeFreq::Weekly => sitemap::structs::ChangeFreq::Weekly,
        ChangeFreq::Monthly => sitemap::structs::ChangeFreq::Monthly,
    }
}

pub fn render_urlset(document: &SitemapDocument) -> Result<Vec<u8>, sitemap::Error> {
    let mut out = Vec::with_capacity(128 + document.entries.len() * 192);
    let mut urls = SiteMapWriter::new(&mut out).start_urlset()?;
    for entry in &document.entries {
        urls.url(
            UrlEntry::builder()
                .loc(entry.loc.as_str())
                .lastmod(entry.lastmod)
                .changefreq(change_freq(entry.changefreq))
                .priority(entry.priority)
                .build()?,
        )?;
    }
    urls.end()?;
    Ok(out)
}

pub fn render_index(entries: &[IndexEntry]) -> Result<Vec<u8>, sitemap::Error> {
    let mut out = Vec::with_capacity(128 + entries.len() * 128);
    let mut index = SiteMapWriter::new(&mut out).start_sitemapindex()?;
    for entry in entries {
        let mut builder = SiteMapEntry::builder().loc(entry.loc.as_str());
        if let Some(lastmod) = entry.lastmod {
            builder = builder.lastmod(lastmod);
        }
        index.sitemap(builder.build()?)?;
    }
    index.end()?;
    Ok(out)
}

/// Smallest valid document for `root`. Infallible, unlike the renderers,
/// since it is the last resort of the fallback chain.
pub fn empty_document(root: RootElement) -> String {
    format!("{}\n<{} xmlns=\"{}\"></{}>\n", XML_DECL, root.name(), SITEMAP_NS, root.name())
}

/// Accepts `body` only if it is well-formed XML with exactly one root
/// element named `root` and contains none of the blacklisted signatures.
pub fn validate(body: &str, root: RootElement) -> Result<(), FetchError> {
    let lowered = body.to_ascii_lowercase();
    if let Some(signature) = BLACKLIST.iter().find(|sig| lowered.contains(**sig)) {
        return Err(FetchError::Malformed(format!(
            "payload matches error page signature '{}'",
            signature
        )));
    }

    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut roots = 0usize;
    loop {
        let event = reader.read_event().map_err(|e| {
            FetchError::Malformed(format!("invalid XML at byte {}: {}", reader.buffer_position(), e))
        })?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if depth == 0 {
                    roots += 1;
                    if roots > 1 {
                        return Err(FetchError::Malformed("more than one root element".to_string()));
                    }
                    let name = e.local_name();
                    if name.as_ref() != root.name().as_bytes() {
                        return Err(FetchError::Malformed(format!(
                            "expected <{}> root, found <{}>",
                            root.name(),
                            String::from_utf8_lossy(name.as_ref())
                        )));
                    }
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| FetchError::Malformed("unbalanced closing tag".to_string()))?;
            }
            Event::DocType(_) => {
                return Err(FetchError::Malformed("DOCTYPE is not allowed in a sitemap".to_string()));
            }
            Event::Text(_) | Event::CData(_) if depth == 0 => {
                return Err(FetchError::Malformed("text outside the root element".to_string()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(FetchError::Malformed("document ends inside an open element".to_string()));
    }
    if roots == 0 {
        return Err(FetchError::Malformed("document has no root element".to_string()));
    }
    Ok(())
}

/// Number of `<url>` entries, as a sitemap consumer would read them.
pub fn count_urls(body: &str) -> usize {
    SiteMapReader::new(Cursor::new(body.as_bytes()))
        .filter(|entity| matches!(entity, SiteMapEntity::Url(_)))
        .count()
}
