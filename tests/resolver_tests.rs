mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{at, fixture_store, page, setup, FailingStore, GatedPages};
use seo_pages::error::AppError;
use seo_pages::model::LocationKind;
use seo_pages::pages::{Freshness, PageLookup, PageOutcome, PageResolver, ResolvedPage, ResolverSettings};
use seo_pages::store::{CatalogStore, MemoryStore};

fn located(keyword: &str, province: &str, city: Option<&str>) -> PageLookup {
    PageLookup::Located {
        keyword: keyword.to_string(),
        province: province.to_string(),
        city: city.map(str::to_string),
    }
}

fn expect_found(outcome: PageOutcome) -> ResolvedPage {
    match outcome {
        PageOutcome::Found(page) => page,
        PageOutcome::NotFound => panic!("expected a page, got NotFound"),
    }
}

async fn seeded() -> Arc<MemoryStore> {
    let store = fixture_store().await;
    let keyword = store.keyword_by_slug("hair-salon").await.unwrap().unwrap();
    let gauteng = store.location_by_slug(LocationKind::Province, "gauteng").await.unwrap().unwrap();
    let sandton = store.location_by_slug(LocationKind::City, "sandton").await.unwrap().unwrap();
    store
        .put_page(page("/hair-salon/gauteng", keyword.id, gauteng.id, "Hair Salons in Gauteng", at(1)))
        .await;
    store
        .put_page(page("/hair-salon/gauteng/sandton", keyword.id, sandton.id, "Hair Salons in Sandton", at(3)))
        .await;
    store
}

fn resolver(store: Arc<MemoryStore>) -> PageResolver {
    PageResolver::new(store.clone(), store, ResolverSettings::default())
}

#[tokio::test]
async fn test_resolves_province_and_city_pages() {
    setup();
    let resolver = resolver(seeded().await);

    let province = expect_found(resolver.resolve(&located("hair-salon", "gauteng", None)).await.unwrap());
    assert_eq!(province.record.h1, "Hair Salons in Gauteng");
    assert_eq!(province.freshness, Freshness::Fresh);

    let city = expect_found(
        resolver
            .resolve(&located("hair-salon", "gauteng", Some("sandton")))
            .await
            .unwrap(),
    );
    assert_eq!(city.record.url, "/hair-salon/gauteng/sandton");
}

#[tokio::test]
async fn test_missing_combination_is_not_found() {
    setup();
    let resolver = resolver(seeded().await);

    let outcome = resolver.resolve(&located("hair-salon", "western-cape", None)).await.unwrap();
    assert!(matches!(outcome, PageOutcome::NotFound));

    let outcome = resolver.resolve(&PageLookup::Keyword("unknown-keyword".into())).await.unwrap();
    assert!(matches!(outcome, PageOutcome::NotFound));
}

#[tokio::test]
async fn test_non_canonical_slugs_are_not_found() {
    setup();
    let resolver = resolver(seeded().await);
    for lookup in [
        located("Hair-Salon", "gauteng", None),
        located("hair-salon", "gauteng ", None),
        located("hair-salon", "gauteng", Some("sand%20ton")),
        PageLookup::Keyword("robots.txt".into()),
    ] {
        let outcome = resolver.resolve(&lookup).await.unwrap();
        assert!(matches!(outcome, PageOutcome::NotFound), "{:?}", lookup);
    }
}

#[tokio::test]
async fn test_keyword_only_returns_most_recent_page() {
    setup();
    let resolver = resolver(seeded().await);
    let page = expect_found(resolver.resolve(&PageLookup::Keyword("hair-salon".into())).await.unwrap());
    assert_eq!(page.record.url, "/hair-salon/gauteng/sandton");
}

#[tokio::test]
async fn test_not_found_is_not_cached() {
    setup();
    let store = seeded().await;
    let resolver = resolver(store.clone());
    let lookup = located("nail-salon", "gauteng", None);

    assert!(matches!(resolver.resolve(&lookup).await.unwrap(), PageOutcome::NotFound));
    store
        .put_page(page("/nail-salon/gauteng", 2, 1, "Nail Salons in Gauteng", at(4)))
        .await;
    let found = expect_found(resolver.resolve(&lookup).await.unwrap());
    assert_eq!(found.record.h1, "Nail Salons in Gauteng");
}

#[tokio::test]
async fn test_stale_page_is_served_without_waiting_for_refresh() {
    setup();
    let store = seeded().await;
    let gated = Arc::new(GatedPages::new(store.clone()));
    // Zero window: anything cached is already stale
    let settings = ResolverSettings { fresh_for: Duration::ZERO, capacity: 100 };
    let resolver = PageResolver::new(gated.clone(), store.clone(), settings);
    let lookup = located("hair-salon", "gauteng", None);

    let first = expect_found(resolver.resolve(&lookup).await.unwrap());
    assert_eq!(first.freshness, Freshness::Fresh);

    // Newer content arrives; the refresh that fetches it is held at the gate
    store
        .put_page(page("/hair-salon/gauteng", 1, 1, "Hair Salons in Gauteng, updated", at(5)))
        .await;

    let second = expect_found(resolver.resolve(&lookup).await.unwrap());
    assert_eq!(second.freshness, Freshness::Stale);
    assert_eq!(second.record.h1, "Hair Salons in Gauteng");

    // Release the pending refresh and wait for it to land
    gated.release.notify_one();
    let mut refreshed = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let page = expect_found(resolver.resolve(&lookup).await.unwrap());
        if page.record.h1 == "Hair Salons in Gauteng, updated" {
            refreshed = true;
            break;
        }
    }
    assert!(refreshed, "refresh never replaced the stale copy");
    assert!(gated.calls() >= 2);
}

#[tokio::test]
async fn test_stand_in_when_page_store_is_down() {
    setup();
    let catalog = fixture_store().await;
    let resolver = PageResolver::new(Arc::new(FailingStore), catalog, ResolverSettings::default());

    let page = expect_found(
        resolver
            .resolve(&located("hair-salon", "gauteng", Some("sandton")))
            .await
            .unwrap(),
    );
    assert_eq!(page.freshness, Freshness::StandIn);
    assert_eq!(page.record.h1, "Find hair salon in Sandton");
    assert_eq!(page.record.url, "/hair-salon/gauteng/sandton");

    // Stand-ins are never cached
    assert_eq!(resolver.cached_pages().await, 0);

    // Known city under the wrong province is not a real combination
    let outcome = resolver
        .resolve(&located("hair-salon", "western-cape", Some("sandton")))
        .await
        .unwrap();
    assert!(matches!(outcome, PageOutcome::NotFound));

    let outcome = resolver.resolve(&located("dog-grooming", "gauteng", None)).await.unwrap();
    assert!(matches!(outcome, PageOutcome::NotFound));
}

#[tokio::test]
async fn test_unavailable_when_pages_and_catalog_are_down() {
    setup();
    let resolver = PageResolver::new(Arc::new(FailingStore), Arc::new(FailingStore), ResolverSettings::default());
    let result = resolver.resolve(&located("hair-salon", "gauteng", None)).await;
    assert!(matches!(result, Err(AppError::Unavailable(_))));
}

#[tokio::test]
async fn test_cache_is_bounded() {
    setup();
    let store = seeded().await;
    let settings = ResolverSettings { fresh_for: Duration::from_secs(3600), capacity: 1 };
    let resolver = PageResolver::new(store.clone(), store, settings);

    resolver.resolve(&located("hair-salon", "gauteng", None)).await.unwrap();
    resolver
        .resolve(&located("hair-salon", "gauteng", Some("sandton")))
        .await
        .unwrap();
    assert_eq!(resolver.cached_pages().await, 1);
}
