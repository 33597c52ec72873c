use chrono::{DateTime, FixedOffset};

use super::urlset::{ChangeFreq, UrlDescriptor};

/// URLs per generated sitemap, leaving margin under the protocol limit.
pub const DEFAULT_CHUNK_CAP: usize = 45_000;

/// Hard ceiling the sitemap protocol puts on one `<urlset>`.
pub const SITEMAP_PROTOCOL_LIMIT: usize = 50_000;

const SEO_FILE_PREFIX: &str = "sitemap-seo-";
const SEO_FILE_SUFFIX: &str = ".xml";

/// One `<url>` element, absolute and ready to serialize.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: DateTime<FixedOffset>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

impl SitemapEntry {
    pub fn from_descriptor(site_url: &str, lastmod: DateTime<FixedOffset>, url: &UrlDescriptor) -> Self {
        SitemapEntry {
            loc: format!("{}{}", site_url, url.path),
            lastmod,
            changefreq: url.change_freq(),
            // two decimals, as written in the document
            priority: ((url.priority() * 100.0).round() / 100.0) as f32,
        }
    }
}

/// The body of one `<urlset>`; never holds more entries than the chunk cap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapDocument {
    pub entries: Vec<SitemapEntry>,
}

/// One `<sitemap>` element of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub loc: String,
    pub lastmod: Option<DateTime<FixedOffset>>,
}

/// Fixed-size chunking of the ordered URL set.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    cap: usize,
}

impl Paginator {
    /// `cap` is clamped into `1..=SITEMAP_PROTOCOL_LIMIT`.
    pub fn new(cap: usize) -> Self {
        Paginator { cap: cap.clamp(1, SITEMAP_PROTOCOL_LIMIT) }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// `ceil(total / cap)`.
    pub fn chunk_count(&self, total: usize) -> usize {
        total.div_ceil(self.cap)
    }

    /// Slice `index` of `urls`; `None` past the last chunk.
    pub fn chunk<'a>(&self, urls: &'a [UrlDescriptor], index: usize) -> Option<&'a [UrlDescriptor]> {
        let start = index.checked_mul(self.cap)?;
        if start >= urls.len() {
            return None;
        }
        let end = usize::min(start + self.cap, urls.len());
        Some(&urls[start..end])
    }

    pub fn document(
        &self,
        urls: &[UrlDescriptor],
        index: usize,
        site_url: &str,
        lastmod: DateTime<FixedOffset>,
    ) -> SitemapDocument {
        let entries = self
            .chunk(urls, index)
            .unwrap_or_default()
            .iter()
            .map(|url| SitemapEntry::from_descriptor(site_url, lastmod, url))
            .collect();
        SitemapDocument { entries }
    }
}

/// Index entries: the static pages sitemap, every SEO chunk by position,
/// then the hand-authored sitemaps.
pub fn index_entries(
    site_url: &str,
    static_pages: &str,
    chunk_count: usize,
    fixed: &[String],
    lastmod: DateTime<FixedOffset>,
) -> Vec<IndexEntry> {
    let mut entries = Vec::with_capacity(chunk_count + fixed.len() + 1);
    entries.push(IndexEntry { loc: format!("{}/{}", site_url, static_pages), lastmod: None });
    for i in 0..chunk_count {
        entries.push(IndexEntry {
            loc: format!("{}/{}", site_url, segment_file_name(i)),
            lastmod: Some(lastmod),
        });
    }
    for name in fixed {
        entries.push(IndexEntry { loc: format!("{}/{}", site_url, name), lastmod: None });
    }
    entries
}

pub fn segment_file_name(index: usize) -> String {
    format!("{}{}{}", SEO_FILE_PREFIX, index, SEO_FILE_SUFFIX)
}

/// Raw segment text out of a `sitemap-seo-{segment}.xml` file name.
pub fn segment_from_file_name(name: &str) -> Option<&str> {
    name.strip_prefix(SEO_FILE_PREFIX)?.strip_suffix(SEO_FILE_SUFFIX)
}

/// Only plain ASCII digits name a segment: no sign, no whitespace.
pub fn parse_segment(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
