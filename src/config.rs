use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::jobs::keyword_import::TierPolicy;
use crate::pages::ResolverSettings;
use crate::sitemaps::{SitemapSettings, DEFAULT_CHUNK_CAP, SITEMAP_PROTOCOL_LIMIT};

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub authority_url: Option<String>,
    pub database_url: Option<String>,
    pub remote_timeout: Duration,
    pub sitemaps: SitemapSettings,
    pub resolver: ResolverSettings,
    pub keyword_corpus: Vec<PathBuf>,
    pub locations_file: PathBuf,
    pub tier_policy: TierPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind_addr: "127.0.0.1:3000".to_string(),
            authority_url: None,
            database_url: None,
            remote_timeout: Duration::from_secs(12),
            sitemaps: SitemapSettings::default(),
            resolver: ResolverSettings::default(),
            keyword_corpus: vec![PathBuf::from("data/keywords.md")],
            locations_file: PathBuf::from("data/locations.json"),
            tier_policy: TierPolicy::default(),
        }
    }
}

impl Settings {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; unset or blank keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Settings::default();

        if let Some(addr) = get("BIND_ADDR") {
            settings.bind_addr = addr;
        }
        if let Some(site) = get("SITE_URL") {
            settings.sitemaps.site_url = absolute_url("SITE_URL", &site)?.trim_end_matches('/').to_string();
        }
        if let Some(authority) = get("AUTHORITY_URL") {
            settings.authority_url = Some(absolute_url("AUTHORITY_URL", &authority)?);
        }
        settings.database_url = get("DATABASE_URL");

        if let Some(secs) = number(&get, "REMOTE_TIMEOUT_SECS")? {
            settings.remote_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = number(&get, "REMOTE_CACHE_TTL_SECS")? {
            settings.sitemaps.remote_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = number(&get, "LOCAL_CACHE_TTL_SECS")? {
            settings.sitemaps.local_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = number(&get, "PAGE_FRESH_SECS")? {
            settings.resolver.fresh_for = Duration::from_secs(secs);
        }
        if let Some(capacity) = number(&get, "PAGE_CACHE_CAPACITY")? {
            settings.resolver.capacity = usize::try_from(capacity).unwrap_or(usize::MAX).max(1);
        }
        if let Some(cap) = number(&get, "SITEMAP_CHUNK_CAP")? {
            let cap = usize::try_from(cap).unwrap_or(DEFAULT_CHUNK_CAP);
            let clamped = cap.clamp(1, SITEMAP_PROTOCOL_LIMIT);
            if clamped != cap {
                tracing::warn!("SITEMAP_CHUNK_CAP {} clamped to {}", cap, clamped);
            }
            settings.sitemaps.chunk_cap = clamped;
        }

        if let Some(name) = get("STATIC_PAGES_SITEMAP") {
            settings.sitemaps.static_pages_sitemap = name;
        }
        if let Some(list) = get("FIXED_SITEMAPS") {
            settings.sitemaps.fixed_sitemaps = split_list(&list);
        }
        if let Some(list) = get("KEYWORD_CORPUS") {
            settings.keyword_corpus = split_list(&list).into_iter().map(PathBuf::from).collect();
        }
        if let Some(path) = get("LOCATIONS_FILE") {
            settings.locations_file = PathBuf::from(path);
        }
        if let Some(policy) = get("KEYWORD_TIER_POLICY") {
            settings.tier_policy = policy.parse().map_err(|_| ConfigError::InvalidValue {
                key: "KEYWORD_TIER_POLICY".to_string(),
                value: policy.clone(),
            })?;
        }

        Ok(settings)
    }
}

fn number<G>(get: &G, key: &str) -> Result<Option<u64>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn absolute_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    match Url::parse(raw) {
        Ok(url) if url.has_host() && matches!(url.scheme(), "http" | "https") => Ok(raw.to_string()),
        _ => Err(ConfigError::InvalidUrl { key: key.to_string(), value: raw.to_string() }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
