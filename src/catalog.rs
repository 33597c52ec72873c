use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::{Keyword, Location, LocationKind};

/// A province with the cities that hang off it, both sorted by slug.
#[derive(Debug, Clone)]
pub struct ProvinceNode {
    pub province: Location,
    pub cities: Vec<Location>,
}

/// Validated, canonically ordered snapshot of keywords and locations.
///
/// Ordering is a pure function of the content: keywords by slug,
/// provinces by slug, cities by slug within their province. The order the
/// store returned rows in does not matter.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    keywords: Vec<Keyword>,
    provinces: Vec<ProvinceNode>,
    dropped_locations: usize,
}

impl Catalog {
    pub fn new(keywords: Vec<Keyword>, locations: Vec<Location>) -> Self {
        // Keywords: one per slug, lowest id wins
        let mut by_slug: BTreeMap<String, Keyword> = BTreeMap::new();
        for keyword in keywords {
            if keyword.slug.is_empty() {
                tracing::warn!("keyword {} ('{}') has an empty slug; skipped", keyword.id, keyword.text);
                continue;
            }
            match by_slug.get(&keyword.slug) {
                Some(kept) if kept.id <= keyword.id => {
                    tracing::warn!("duplicate keyword slug '{}' (ids {} and {})", keyword.slug, kept.id, keyword.id);
                }
                _ => {
                    by_slug.insert(keyword.slug.clone(), keyword);
                }
            }
        }

        let mut locations = locations;
        locations.sort_by_key(|l| l.id);
        let mut dropped = 0usize;

        // Provinces first, unique by slug
        let mut provinces: BTreeMap<String, ProvinceNode> = BTreeMap::new();
        let mut province_slug_by_id: HashMap<i32, String> = HashMap::new();
        for location in locations.iter().filter(|l| l.kind == LocationKind::Province) {
            if location.slug.is_empty() || provinces.contains_key(&location.slug) {
                tracing::warn!("province {} ('{}') skipped: empty or duplicate slug", location.id, location.slug);
                dropped += 1;
                continue;
            }
            province_slug_by_id.insert(location.id, location.slug.clone());
            provinces.insert(
                location.slug.clone(),
                ProvinceNode { province: location.clone(), cities: Vec::new() },
            );
        }

        // Cities must point at a province; slugs unique across all cities
        let mut city_slugs: HashSet<String> = HashSet::new();
        for city in locations.into_iter().filter(|l| l.kind == LocationKind::City) {
            let parent_slug = city.parent_id.and_then(|id| province_slug_by_id.get(&id));
            let Some(parent_slug) = parent_slug else {
                tracing::warn!("city {} ('{}') has no province parent; skipped", city.id, city.slug);
                dropped += 1;
                continue;
            };
            if city.slug.is_empty() || !city_slugs.insert(city.slug.clone()) {
                tracing::warn!("city {} ('{}') skipped: empty or duplicate slug", city.id, city.slug);
                dropped += 1;
                continue;
            }
            if let Some(node) = provinces.get_mut(parent_slug) {
                node.cities.push(city);
            }
        }

        let provinces = provinces
            .into_values()
            .map(|mut node| {
                node.cities.sort_by(|a, b| a.slug.cmp(&b.slug));
                node
            })
            .collect();

        Catalog {
            keywords: by_slug.into_values().collect(),
            provinces,
            dropped_locations: dropped,
        }
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn provinces(&self) -> &[ProvinceNode] {
        &self.provinces
    }

    pub fn province_count(&self) -> usize {
        self.provinces.len()
    }

    pub fn city_count(&self) -> usize {
        self.provinces.iter().map(|p| p.cities.len()).sum()
    }

    pub fn location_count(&self) -> usize {
        self.province_count() + self.city_count()
    }

    /// Locations rejected by validation (orphan cities, duplicate slugs).
    pub fn dropped_locations(&self) -> usize {
        self.dropped_locations
    }

    /// Number of URLs the builder will emit for this snapshot.
    pub fn url_count(&self) -> usize {
        self.keywords.len() * self.location_count()
    }
}
