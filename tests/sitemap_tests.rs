mod common;

use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use chrono::Utc;
use sitemap::reader::{SiteMapEntity, SiteMapReader};

use common::{fixture_store, setup, sitemap_settings, GAUTENG_CITIES, WESTERN_CAPE_CITIES};
use seo_pages::catalog::Catalog;
use seo_pages::model::{Keyword, Location, LocationKind, PriorityTier};
use seo_pages::sitemaps::urlset::LocationScope;
use seo_pages::sitemaps::xml::{count_urls, validate, RootElement};
use seo_pages::sitemaps::{build_url_set, LocalSnapshot, Paginator, SitemapSettings};
use seo_pages::slug::location_slug;
use seo_pages::store::CatalogStore;

async fn fixture_catalog() -> Catalog {
    let store = fixture_store().await;
    Catalog::new(store.keywords().await.unwrap(), store.locations().await.unwrap())
}

fn sitemap_locs(body: &str) -> Vec<String> {
    SiteMapReader::new(Cursor::new(body.as_bytes()))
        .filter_map(|entity| match entity {
            SiteMapEntity::SiteMap(entry) => entry.loc.get_url().map(|u| u.to_string()),
            _ => None,
        })
        .collect()
}

fn url_locs(body: &str) -> Vec<String> {
    SiteMapReader::new(Cursor::new(body.as_bytes()))
        .filter_map(|entity| match entity {
            SiteMapEntity::Url(entry) => entry.loc.get_url().map(|u| u.to_string()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_scenario_two_provinces_five_cities_three_keywords() {
    setup();
    let catalog = fixture_catalog().await;
    assert_eq!(catalog.keywords().len(), 3);
    assert_eq!(catalog.province_count(), 2);
    assert_eq!(catalog.city_count(), 10);

    let urls = build_url_set(&catalog);
    let city_level = urls.iter().filter(|u| u.scope == LocationScope::City).count();
    let province_level = urls.iter().filter(|u| u.scope == LocationScope::Province).count();
    assert_eq!(city_level, 30);
    assert_eq!(province_level, 6);
    assert_eq!(urls.len(), 36);
    assert_eq!(catalog.url_count(), 36);

    let unique: HashSet<&str> = urls.iter().map(|u| u.path.as_str()).collect();
    assert_eq!(unique.len(), 36);
}

#[tokio::test]
async fn test_url_order_is_keyword_major_and_slug_sorted() {
    let catalog = fixture_catalog().await;
    let urls = build_url_set(&catalog);
    let paths: Vec<&str> = urls.iter().map(|u| u.path.as_str()).collect();

    assert_eq!(paths[0], "/barber/gauteng");
    assert_eq!(paths[1], "/barber/gauteng/centurion");
    assert_eq!(paths[5], "/barber/gauteng/soweto");
    assert_eq!(paths[6], "/barber/western-cape");
    assert_eq!(paths[7], "/barber/western-cape/cape-town");
    assert_eq!(paths[12], "/hair-salon/gauteng");
    assert_eq!(paths[35], "/nail-salon/western-cape/worcester");
}

#[tokio::test]
async fn test_url_set_is_deterministic_regardless_of_input_order() {
    let store = fixture_store().await;
    let keywords = store.keywords().await.unwrap();
    let locations = store.locations().await.unwrap();

    let forward = build_url_set(&Catalog::new(keywords.clone(), locations.clone()));
    let again = build_url_set(&Catalog::new(keywords.clone(), locations.clone()));

    let mut reversed_keywords = keywords;
    reversed_keywords.reverse();
    let mut reversed_locations = locations;
    reversed_locations.reverse();
    let reversed = build_url_set(&Catalog::new(reversed_keywords, reversed_locations));

    assert_eq!(forward, again);
    assert_eq!(forward, reversed);
}

#[tokio::test]
async fn test_every_city_url_lands_in_exactly_one_chunk() {
    let catalog = fixture_catalog().await;
    let urls = build_url_set(&catalog);
    let paginator = Paginator::new(7);
    let chunk_count = paginator.chunk_count(urls.len());
    assert_eq!(chunk_count, 6);

    let mut seen: HashMap<String, usize> = HashMap::new();
    for i in 0..chunk_count {
        let chunk = paginator.chunk(&urls, i).unwrap();
        assert!(chunk.len() <= 7);
        for url in chunk {
            *seen.entry(url.path.clone()).or_default() += 1;
        }
    }
    assert!(paginator.chunk(&urls, chunk_count).is_none());

    for keyword in ["barber", "hair-salon", "nail-salon"] {
        for (province, cities) in [("gauteng", GAUTENG_CITIES), ("western-cape", WESTERN_CAPE_CITIES)] {
            for city in cities {
                let path = format!("/{}/{}/{}", keyword, province, location_slug(city));
                assert_eq!(seen.get(&path), Some(&1), "{} not in exactly one chunk", path);
            }
        }
    }
}

#[tokio::test]
async fn test_snapshot_chunks_respect_cap_and_parse() {
    let catalog = fixture_catalog().await;
    let settings = SitemapSettings { chunk_cap: 10, ..sitemap_settings() };
    let snapshot = LocalSnapshot::build(&catalog, &settings, Utc::now()).unwrap();

    assert_eq!(snapshot.total_urls, 36);
    assert_eq!(snapshot.chunks.len(), 4);

    let mut total = 0;
    for chunk in &snapshot.chunks {
        let body = std::str::from_utf8(chunk).unwrap();
        validate(body, RootElement::UrlSet).unwrap();
        let count = count_urls(body);
        assert!(count <= 10);
        total += count;
    }
    assert_eq!(total, 36);

    let first = url_locs(std::str::from_utf8(&snapshot.chunks[0]).unwrap());
    assert_eq!(first[0], "https://example.com/barber/gauteng");
}

#[tokio::test]
async fn test_index_lists_static_chunks_then_fixed() {
    let catalog = fixture_catalog().await;
    let settings = SitemapSettings { chunk_cap: 10, ..sitemap_settings() };
    let snapshot = LocalSnapshot::build(&catalog, &settings, Utc::now()).unwrap();
    let body = std::str::from_utf8(&snapshot.index).unwrap();
    validate(body, RootElement::SitemapIndex).unwrap();

    let locs = sitemap_locs(body);
    assert_eq!(
        locs,
        vec![
            "https://example.com/sitemap-static.xml",
            "https://example.com/sitemap-seo-0.xml",
            "https://example.com/sitemap-seo-1.xml",
            "https://example.com/sitemap-seo-2.xml",
            "https://example.com/sitemap-seo-3.xml",
            "https://example.com/sitemap-salons.xml",
            "https://example.com/sitemap-services.xml",
            "https://example.com/sitemap-jobs.xml",
            "https://example.com/sitemap-trends.xml",
        ]
    );
}

#[tokio::test]
async fn test_catalog_drops_orphan_cities_and_duplicate_keyword_slugs() {
    let keywords = vec![
        Keyword { id: 1, text: "Hair Salon".into(), slug: "hair-salon".into(), category: "Hair".into(), priority: PriorityTier::One },
        Keyword { id: 2, text: "hair  salon".into(), slug: "hair-salon".into(), category: "Hair".into(), priority: PriorityTier::One },
    ];
    let locations = vec![
        Location { id: 1, name: "Gauteng".into(), slug: "gauteng".into(), kind: LocationKind::Province, parent_id: None, population: None },
        Location { id: 2, name: "Sandton".into(), slug: "sandton".into(), kind: LocationKind::City, parent_id: Some(1), population: None },
        Location { id: 3, name: "Nowhere".into(), slug: "nowhere".into(), kind: LocationKind::City, parent_id: Some(99), population: None },
        Location { id: 4, name: "Loose".into(), slug: "loose".into(), kind: LocationKind::City, parent_id: None, population: None },
        Location { id: 5, name: "Nested".into(), slug: "nested".into(), kind: LocationKind::City, parent_id: Some(2), population: None },
    ];

    let catalog = Catalog::new(keywords, locations);
    assert_eq!(catalog.keywords().len(), 1);
    assert_eq!(catalog.keywords()[0].id, 1);
    assert_eq!(catalog.city_count(), 1);
    assert_eq!(catalog.dropped_locations(), 3);

    let paths: Vec<String> = build_url_set(&catalog).into_iter().map(|u| u.path).collect();
    assert_eq!(paths, vec!["/hair-salon/gauteng", "/hair-salon/gauteng/sandton"]);
}

#[tokio::test]
async fn test_empty_catalog_yields_index_without_seo_chunks() {
    let snapshot = LocalSnapshot::build(&Catalog::default(), &sitemap_settings(), Utc::now()).unwrap();
    assert_eq!(snapshot.total_urls, 0);
    assert!(snapshot.chunks.is_empty());
    let locs = sitemap_locs(std::str::from_utf8(&snapshot.index).unwrap());
    assert_eq!(locs.len(), 5);
    assert!(locs.iter().all(|l| !l.contains("sitemap-seo-")));
}
