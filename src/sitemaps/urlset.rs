use crate::catalog::Catalog;
use crate::model::{Location, PriorityTier};

/// Which level of the location hierarchy a URL targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationScope {
    Province,
    City,
}

/// How often crawlers are told a page changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
        }
    }
}

/// One canonical landing page URL, site-relative.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlDescriptor {
    pub path: String,
    pub tier: PriorityTier,
    pub scope: LocationScope,
    pub population: Option<i64>,
}

impl UrlDescriptor {
    fn province(keyword_slug: &str, tier: PriorityTier, province: &Location) -> Self {
        UrlDescriptor {
            path: format!("/{}/{}", keyword_slug, province.slug),
            tier,
            scope: LocationScope::Province,
            population: province.population,
        }
    }

    fn city(keyword_slug: &str, tier: PriorityTier, province: &Location, city: &Location) -> Self {
        UrlDescriptor {
            path: format!("/{}/{}/{}", keyword_slug, province.slug, city.slug),
            tier,
            scope: LocationScope::City,
            population: city.population,
        }
    }

    /// Sitemap priority in 0.0..=1.0.
    pub fn priority(&self) -> f64 {
        let tier_bonus = match self.tier {
            PriorityTier::One => 0.3,
            PriorityTier::Two => 0.2,
            PriorityTier::Three => 0.1,
        };
        let scope_bonus = match self.scope {
            LocationScope::Province => 0.1,
            LocationScope::City => 0.05,
        };
        let population_bonus = match self.population {
            Some(p) if p > 1_000_000 => 0.05,
            Some(p) if p > 100_000 => 0.03,
            _ => 0.0,
        };
        f64::min(0.5 + tier_bonus + scope_bonus + population_bonus, 1.0)
    }

    pub fn change_freq(&self) -> ChangeFreq {
        let large_place = self.population.is_some_and(|p| p > 500_000);
        match self.tier {
            PriorityTier::One if self.scope == LocationScope::Province || large_place => ChangeFreq::Daily,
            PriorityTier::One | PriorityTier::Two => ChangeFreq::Weekly,
            PriorityTier::Three => ChangeFreq::Monthly,
        }
    }
}

/// Every keyword crossed with every province and every city.
///
/// Keyword-major: for each keyword (by slug), each province (by slug)
/// contributes its own URL followed by its cities' URLs (by slug). The
/// ordering comes from `Catalog`, so two calls over equal catalogs yield
/// identical sequences.
pub fn build_url_set(catalog: &Catalog) -> Vec<UrlDescriptor> {
    let mut urls = Vec::with_capacity(catalog.url_count());
    for keyword in catalog.keywords() {
        for node in catalog.provinces() {
            urls.push(UrlDescriptor::province(&keyword.slug, keyword.priority, &node.province));
            for city in &node.cities {
                urls.push(UrlDescriptor::city(&keyword.slug, keyword.priority, &node.province, city));
            }
        }
    }
    urls
}
