mod common;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

use common::{at, page, setup};
use seo_pages::entities::{keyword, location, page_content};
use seo_pages::model::{KeywordDraft, LocationDraft, LocationKind, PriorityTier, UpsertOutcome};
use seo_pages::store::{CatalogStore, DbStore, PageContentStore};

async fn sqlite_store(dir: &tempfile::TempDir) -> DbStore {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("seo.db").display());
    let db: DatabaseConnection = Database::connect(&url).await.unwrap();

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(keyword::Entity))).await.unwrap();
    db.execute(backend.build(&schema.create_table_from_entity(location::Entity))).await.unwrap();
    db.execute(backend.build(&schema.create_table_from_entity(page_content::Entity))).await.unwrap();
    DbStore::new(db)
}

fn draft(text: &str, slug: &str, category: &str, priority: PriorityTier) -> KeywordDraft {
    KeywordDraft {
        text: text.to_string(),
        slug: slug.to_string(),
        category: category.to_string(),
        priority,
        ordinal: 1,
    }
}

#[tokio::test]
async fn test_keyword_upsert_is_keyed_on_text() {
    setup();
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    let hair = draft("hair salon", "hair-salon", "Hair", PriorityTier::One);
    assert_eq!(store.upsert_keyword(&hair).await.unwrap(), UpsertOutcome::Inserted);
    assert_eq!(store.upsert_keyword(&hair).await.unwrap(), UpsertOutcome::Unchanged);

    let moved = draft("hair salon", "hair-salon", "Salons", PriorityTier::Two);
    assert_eq!(store.upsert_keyword(&moved).await.unwrap(), UpsertOutcome::Updated);

    let keywords = store.keywords().await.unwrap();
    assert_eq!(keywords.len(), 1);
    assert_eq!(keywords[0].category, "Salons");
    assert_eq!(keywords[0].priority, PriorityTier::Two);

    let found = store.keyword_by_slug("hair-salon").await.unwrap().unwrap();
    assert_eq!(found.text, "hair salon");
    assert!(store.keyword_by_slug("barber").await.unwrap().is_none());
}

#[tokio::test]
async fn test_location_upsert_and_lookup() {
    setup();
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    let (gauteng, outcome) = store
        .upsert_location(&LocationDraft {
            name: "Gauteng".into(),
            slug: "gauteng".into(),
            kind: LocationKind::Province,
            parent_id: None,
            population: Some(15_100_000),
        })
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted);

    let sandton = LocationDraft {
        name: "Sandton".into(),
        slug: "sandton".into(),
        kind: LocationKind::City,
        parent_id: Some(gauteng.id),
        population: Some(222_000),
    };
    let (city, _) = store.upsert_location(&sandton).await.unwrap();
    let (_, again) = store.upsert_location(&sandton).await.unwrap();
    assert_eq!(again, UpsertOutcome::Unchanged);

    assert_eq!(store.locations().await.unwrap().len(), 2);
    let looked_up = store.location_by_slug(LocationKind::City, "sandton").await.unwrap().unwrap();
    assert_eq!(looked_up.parent_id, Some(gauteng.id));
    assert!(store.location_by_slug(LocationKind::Province, "sandton").await.unwrap().is_none());
    assert_eq!(store.location_by_id(city.id).await.unwrap().unwrap().name, "Sandton");
}

#[tokio::test]
async fn test_page_content_reads() {
    setup();
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    store
        .put_page(&page("/hair-salon/gauteng", 1, 1, "Hair Salons in Gauteng", at(1)))
        .await
        .unwrap();
    store
        .put_page(&page("/hair-salon/gauteng/sandton", 1, 2, "Hair Salons in Sandton", at(9)))
        .await
        .unwrap();
    store
        .put_page(&page("/hair-salon-deals/gauteng", 2, 1, "Hair Salon Deals", at(20)))
        .await
        .unwrap();

    let record = store.page_by_url("/hair-salon/gauteng").await.unwrap().unwrap();
    assert_eq!(record.h1, "Hair Salons in Gauteng");
    assert_eq!(record.headings, vec!["Top rated".to_string()]);
    assert_eq!(record.stats.salon_count, 2);
    assert!(store.page_by_url("/hair-salon/western-cape").await.unwrap().is_none());

    // Newest page whose url sits under /hair-salon/, not /hair-salon-deals/
    let first = store.first_page_for_keyword("hair-salon").await.unwrap().unwrap();
    assert_eq!(first.url, "/hair-salon/gauteng/sandton");

    // Rewriting a url replaces the row
    store
        .put_page(&page("/hair-salon/gauteng", 1, 1, "Hair Salons in Gauteng (2025)", at(2)))
        .await
        .unwrap();
    let record = store.page_by_url("/hair-salon/gauteng").await.unwrap().unwrap();
    assert_eq!(record.h1, "Hair Salons in Gauteng (2025)");
}

#[tokio::test]
async fn test_keyword_prefix_treats_underscore_literally() {
    setup();
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    store
        .put_page(&page("/braidsx2024/gauteng", 7, 1, "Braids in Gauteng", at(3)))
        .await
        .unwrap();
    assert!(store.first_page_for_keyword("braids_2024").await.unwrap().is_none());

    store
        .put_page(&page("/braids_2024/gauteng", 8, 1, "Braids 2024 in Gauteng", at(1)))
        .await
        .unwrap();
    let found = store.first_page_for_keyword("braids_2024").await.unwrap().unwrap();
    assert_eq!(found.url, "/braids_2024/gauteng");
}
