pub mod keyword_import;
pub mod location_import;

pub use keyword_import::{parse_corpus, ImportSummary, KeywordImport, TierPolicy};
pub use location_import::{import_locations, import_locations_file, LocationImportSummary};

use crate::config::Settings;
use crate::store::CatalogStore;

/// Loads the configured locations file and keyword corpus into `store`.
/// Unreadable files are logged and skipped; the service still starts and
/// serves whatever was loaded.
pub async fn load_catalog_files(
    store: &dyn CatalogStore,
    settings: &Settings,
) -> (ImportSummary, LocationImportSummary) {
    let locations = match import_locations_file(store, &settings.locations_file).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!("Skipping locations: {:#}", e);
            LocationImportSummary::default()
        }
    };

    let mut import = KeywordImport::new(store, settings.tier_policy);
    for path in &settings.keyword_corpus {
        if let Err(e) = import.import_file(path).await {
            tracing::warn!("Skipping keyword corpus: {:#}", e);
        }
    }
    (import.finish(), locations)
}
