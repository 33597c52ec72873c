use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::model::{LocationDraft, LocationKind, UpsertOutcome};
use crate::slug::{location_slug, slugify};
use crate::store::CatalogStore;

/// A city or town inside a province.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub population: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvinceInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub cities: Vec<PlaceInput>,
}

/// Explicit slugs are normalised; missing ones come from the name.
fn slug_for(name: &str, explicit: Option<&str>) -> String {
    match explicit {
        Some(slug) => slugify(slug),
        None => location_slug(name),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationImportSummary {
    pub provinces: usize,
    pub cities: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl LocationImportSummary {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

pub fn parse_locations(json: &str) -> Result<Vec<ProvinceInput>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Upserts provinces, then each province's cities with the province as
/// parent. Cities of a province that could not be written are skipped.
pub async fn import_locations(
    store: &dyn CatalogStore,
    provinces: &[ProvinceInput],
) -> LocationImportSummary {
    let mut summary = LocationImportSummary::default();

    for province in provinces {
        let slug = slug_for(&province.name, province.slug.as_deref());
        if slug.is_empty() {
            tracing::warn!("Province '{}' has no usable slug; skipped with its cities", province.name);
            summary.skipped += 1 + province.cities.len();
            continue;
        }
        let draft = LocationDraft {
            name: province.name.trim().to_string(),
            slug,
            kind: LocationKind::Province,
            parent_id: None,
            population: province.population,
        };
        let parent = match store.upsert_location(&draft).await {
            Ok((location, outcome)) => {
                summary.provinces += 1;
                summary.record(outcome);
                location
            }
            Err(e) => {
                tracing::warn!("Failed to upsert province '{}': {}", province.name, e);
                summary.failed += 1;
                summary.skipped += province.cities.len();
                continue;
            }
        };

        for city in &province.cities {
            let slug = slug_for(&city.name, city.slug.as_deref());
            if slug.is_empty() {
                tracing::warn!("City '{}' in {} has no usable slug; skipped", city.name, parent.name);
                summary.skipped += 1;
                continue;
            }
            let draft = LocationDraft {
                name: city.name.trim().to_string(),
                slug,
                kind: LocationKind::City,
                parent_id: Some(parent.id),
                population: city.population,
            };
            match store.upsert_location(&draft).await {
                Ok((_, outcome)) => {
                    summary.cities += 1;
                    summary.record(outcome);
                }
                Err(e) => {
                    tracing::warn!("Failed to upsert city '{}': {}", city.name, e);
                    summary.failed += 1;
                }
            }
        }
    }

    tracing::info!(
        "Location import done: {} provinces, {} cities ({} inserted, {} updated, {} unchanged, {} skipped, {} failed)",
        summary.provinces,
        summary.cities,
        summary.inserted,
        summary.updated,
        summary.unchanged,
        summary.skipped,
        summary.failed
    );
    summary
}

pub async fn import_locations_file(
    store: &dyn CatalogStore,
    path: &Path,
) -> anyhow::Result<LocationImportSummary> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading locations file {}", path.display()))?;
    let provinces = parse_locations(&text)
        .with_context(|| format!("parsing locations file {}", path.display()))?;
    Ok(import_locations(store, &provinces).await)
}
