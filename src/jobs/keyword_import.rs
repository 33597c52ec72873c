use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{KeywordDraft, PriorityTier, UpsertOutcome};
use crate::slug::slugify;
use crate::store::CatalogStore;

/// Category for entries that appear before any header.
pub const DEFAULT_CATEGORY: &str = "General";

// "## Hair Salon Keywords (1-100)"
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^##\s+(.+?)\s+Keywords\s+\((\d+)-(\d+)\)").expect("static regex")
});
// "1. hair salon near me"
static ENTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s+(.+)$").expect("static regex"));

/// How a keyword's tier ordinal is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TierPolicy {
    /// Position among all numbered entries seen so far in this run,
    /// across files. File order can move a keyword between tiers.
    #[default]
    RunningOrdinal,
    /// The number written in front of the entry.
    DeclaredNumber,
}

impl FromStr for TierPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" | "running-ordinal" => Ok(TierPolicy::RunningOrdinal),
            "declared" | "declared-number" => Ok(TierPolicy::DeclaredNumber),
            other => Err(format!("unknown tier policy: {}", other)),
        }
    }
}

impl fmt::Display for TierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierPolicy::RunningOrdinal => f.write_str("running"),
            TierPolicy::DeclaredNumber => f.write_str("declared"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusLine<'a> {
    Header { label: &'a str, first: u32, last: u32 },
    Entry { number: u32, text: &'a str },
    Blank,
    Unrecognized,
}

/// Classifies one corpus line after trimming it.
pub fn classify_line(line: &str) -> CorpusLine<'_> {
    let line = line.trim();
    if line.is_empty() {
        return CorpusLine::Blank;
    }
    if let Some(caps) = HEADER_RE.captures(line) {
        let first = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let last = caps.get(3).and_then(|m| m.as_str().parse().ok());
        if let (Some(label), Some(first), Some(last)) = (caps.get(1), first, last) {
            return CorpusLine::Header { label: label.as_str().trim(), first, last };
        }
        return CorpusLine::Unrecognized;
    }
    if let Some(caps) = ENTRY_RE.captures(line) {
        let number = caps.get(1).and_then(|m| m.as_str().parse().ok());
        if let (Some(number), Some(text)) = (number, caps.get(2)) {
            let text = text.as_str().trim();
            if !text.is_empty() {
                return CorpusLine::Entry { number, text };
            }
        }
    }
    CorpusLine::Unrecognized
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorpusEntry {
    pub number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorpusSection {
    pub category: String,
    pub declared_range: Option<(u32, u32)>,
    pub entries: Vec<CorpusEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCorpus {
    pub sections: Vec<CorpusSection>,
    pub lines: usize,
    pub headers: usize,
    pub skipped_lines: usize,
}

impl ParsedCorpus {
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &CorpusEntry)> {
        self.sections
            .iter()
            .flat_map(|s| s.entries.iter().map(move |e| (s.category.as_str(), e)))
    }
}

/// Folds the corpus into sections. The category in force for an entry is
/// the last section opened before it; entries ahead of any header open a
/// `General` section.
pub fn parse_corpus(text: &str) -> ParsedCorpus {
    text.lines().fold(ParsedCorpus::default(), |mut acc, line| {
        acc.lines += 1;
        match classify_line(line) {
            CorpusLine::Header { label, first, last } => {
                acc.headers += 1;
                acc.sections.push(CorpusSection {
                    category: label.to_string(),
                    declared_range: Some((first, last)),
                    entries: Vec::new(),
                });
            }
            CorpusLine::Entry { number, text } => {
                if acc.sections.is_empty() {
                    acc.sections.push(CorpusSection {
                        category: DEFAULT_CATEGORY.to_string(),
                        declared_range: None,
                        entries: Vec::new(),
                    });
                }
                if let Some(section) = acc.sections.last_mut() {
                    section.entries.push(CorpusEntry { number, text: text.to_string() });
                }
            }
            CorpusLine::Blank => {}
            CorpusLine::Unrecognized => acc.skipped_lines += 1,
        }
        acc
    })
}

/// Counts for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    pub lines: usize,
    pub headers: usize,
    pub entries: usize,
    pub skipped_lines: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// Entries per tier 1, 2, 3.
    pub tiers: [usize; 3],
    /// Entries whose own number differs from their running position.
    pub ordinal_mismatches: usize,
}

impl ImportSummary {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// One import run over any number of corpus files, in order.
pub struct KeywordImport<'a> {
    store: &'a dyn CatalogStore,
    policy: TierPolicy,
    ordinal: u32,
    summary: ImportSummary,
}

impl<'a> KeywordImport<'a> {
    pub fn new(store: &'a dyn CatalogStore, policy: TierPolicy) -> Self {
        KeywordImport { store, policy, ordinal: 0, summary: ImportSummary::default() }
    }

    /// Turns parsed entries into drafts, advancing the running ordinal.
    pub fn drafts(&mut self, source: &str, parsed: &ParsedCorpus) -> Vec<KeywordDraft> {
        let mut drafts = Vec::with_capacity(parsed.entry_count());
        let mut mismatches = 0usize;

        for (category, entry) in parsed.entries() {
            self.ordinal += 1;
            if entry.number != self.ordinal {
                mismatches += 1;
            }
            let ordinal = match self.policy {
                TierPolicy::RunningOrdinal => self.ordinal,
                TierPolicy::DeclaredNumber => entry.number,
            };
            let slug = slugify(&entry.text);
            if slug.is_empty() {
                tracing::warn!("{}: entry {} ('{}') has no usable slug; skipped", source, entry.number, entry.text);
                self.summary.skipped_lines += 1;
                continue;
            }
            let priority = PriorityTier::from_ordinal(ordinal);
            self.summary.tiers[(priority.as_i16() - 1) as usize] += 1;
            drafts.push(KeywordDraft {
                text: entry.text.clone(),
                slug,
                category: category.to_string(),
                priority,
                ordinal,
            });
        }

        if mismatches > 0 && self.policy == TierPolicy::RunningOrdinal {
            tracing::warn!(
                "{}: {} entries are numbered differently from their running position; tiers follow the running position (set KEYWORD_TIER_POLICY=declared to use the written numbers)",
                source,
                mismatches
            );
        }
        self.summary.ordinal_mismatches += mismatches;
        drafts
    }

    /// Parses and upserts one corpus. A failed upsert is counted and the
    /// import moves on.
    pub async fn import_text(&mut self, source: &str, text: &str) {
        let parsed = parse_corpus(text);
        tracing::info!(
            "{}: {} lines, {} headers, {} entries, {} skipped",
            source,
            parsed.lines,
            parsed.headers,
            parsed.entry_count(),
            parsed.skipped_lines
        );
        self.summary.files += 1;
        self.summary.lines += parsed.lines;
        self.summary.headers += parsed.headers;
        self.summary.entries += parsed.entry_count();
        self.summary.skipped_lines += parsed.skipped_lines;

        for draft in self.drafts(source, &parsed) {
            match self.store.upsert_keyword(&draft).await {
                Ok(outcome) => self.summary.record(outcome),
                Err(e) => {
                    tracing::warn!("Failed to upsert keyword '{}': {}", draft.text, e);
                    self.summary.failed += 1;
                }
            }
        }
    }

    pub async fn import_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading keyword corpus {}", path.display()))?;
        self.import_text(&path.display().to_string(), &text).await;
        Ok(())
    }

    pub fn finish(self) -> ImportSummary {
        tracing::info!(
            "Keyword import done: {} inserted, {} updated, {} unchanged, {} failed, tiers {:?}",
            self.summary.inserted,
            self.summary.updated,
            self.summary.unchanged,
            self.summary.failed,
            self.summary.tiers
        );
        self.summary
    }
}
