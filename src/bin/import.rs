use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use seo_pages::jobs::{import_locations_file, KeywordImport, TierPolicy};
use seo_pages::store::{CatalogStore, DbStore, MemoryStore};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

struct Args {
    keywords: Vec<PathBuf>,
    locations: Option<PathBuf>,
    tier_policy: Option<TierPolicy>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args { keywords: Vec::new(), locations: None, tier_policy: None };
    let mut raw = env::args().skip(1);
    while let Some(flag) = raw.next() {
        match flag.as_str() {
            "--keywords" => {
                let path = raw.next().context("--keywords needs a file")?;
                args.keywords.push(PathBuf::from(path));
            }
            "--locations" => {
                let path = raw.next().context("--locations needs a file")?;
                args.locations = Some(PathBuf::from(path));
            }
            "--tier-policy" => {
                let policy = raw.next().context("--tier-policy needs running|declared")?;
                args.tier_policy = Some(policy.parse().map_err(anyhow::Error::msg)?);
            }
            other => bail!(
                "unknown argument '{}'; usage: seo-pages-import [--keywords FILE]... [--locations FILE] [--tier-policy running|declared]",
                other
            ),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise tracing (INFO level)
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load .env (if present) so DATABASE_URL from file is visible
    let _ = dotenv();
    let args = parse_args()?;
    let tier_policy = match args.tier_policy {
        Some(policy) => policy,
        None => match env::var("KEYWORD_TIER_POLICY") {
            Ok(raw) => raw.parse().map_err(anyhow::Error::msg)?,
            Err(_) => TierPolicy::default(),
        },
    };

    let store: Box<dyn CatalogStore> = match env::var("DATABASE_URL") {
        Ok(url) => {
            let db = DbStore::connect(&url).await?;
            Migrator::up(db.connection(), None).await?;
            info!("Migrations applied");
            Box::new(db)
        }
        Err(_) => {
            warn!("DATABASE_URL not set; importing into memory (dry run)");
            Box::new(MemoryStore::new())
        }
    };

    // Locations first, so a following page import can join on them
    if let Some(path) = &args.locations {
        let summary = import_locations_file(store.as_ref(), path).await?;
        info!(?summary, "locations imported");
    }

    let mut import = KeywordImport::new(store.as_ref(), tier_policy);
    for path in &args.keywords {
        import.import_file(path).await?;
    }
    let summary = import.finish();
    info!(?summary, %tier_policy, "keywords imported");

    if args.keywords.is_empty() && args.locations.is_none() {
        warn!("Nothing to import; pass --keywords and/or --locations");
    }
    Ok(())
}
