use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod authority;
pub mod catalog;
pub mod config;
pub mod entities;
pub mod error;
pub mod jobs;
pub mod model;
pub mod pages;
pub mod routes;
pub mod sitemaps;
pub mod slug;
pub mod store;

use authority::AuthorityClient;
use config::Settings;
use pages::PageResolver;
use sitemaps::SitemapFetcher;
use store::{CatalogStore, DbStore, MemoryStore, PageContentStore};

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sitemaps: Arc<SitemapFetcher>,
    pub pages: PageResolver,
}

impl AppState {
    pub fn new(
        settings: Settings,
        catalog: Arc<dyn CatalogStore>,
        page_store: Arc<dyn PageContentStore>,
        authority: Option<AuthorityClient>,
    ) -> Self {
        let sitemaps = SitemapFetcher::new(settings.sitemaps.clone(), authority, catalog.clone());
        let pages = PageResolver::new(page_store, catalog, settings.resolver);
        AppState {
            settings: Arc::new(settings),
            sitemaps: Arc::new(sitemaps),
            pages,
        }
    }

    /// Wires stores from configuration.
    ///
    /// With `DATABASE_URL` the catalog and page content come from the
    /// database. Without it the catalog is imported from the configured
    /// files into memory, and page content comes from the authority when
    /// one is configured.
    pub async fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let authority = settings
            .authority_url
            .as_deref()
            .map(|url| AuthorityClient::new(url, settings.remote_timeout))
            .transpose()?;

        if let Some(database_url) = settings.database_url.as_deref() {
            let db = Arc::new(DbStore::connect(database_url).await?);
            return Ok(Self::new(settings, db.clone(), db, authority));
        }

        tracing::info!("DATABASE_URL not set; loading catalog from files");
        let memory = Arc::new(MemoryStore::new());
        let (keywords, locations) = jobs::load_catalog_files(memory.as_ref(), &settings).await;
        tracing::info!(
            "Catalog loaded: {} keywords, {} provinces, {} cities",
            keywords.inserted + keywords.updated + keywords.unchanged,
            locations.provinces,
            locations.cities
        );

        let page_store: Arc<dyn PageContentStore> = match &authority {
            Some(client) => Arc::new(client.clone()),
            None => memory.clone(),
        };
        Ok(Self::new(settings, memory, page_store, authority))
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Service is healthy")
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SEO Pages API",
        version = "0.1.0",
        description = "Keyword x location landing pages and their sitemaps"
    ),
    paths(
        health_check,
        routes::sitemaps::sitemap_index,
        routes::sitemaps::sitemap_stats,
        routes::sitemaps::sitemap_segment,
        routes::pages::keyword_page,
        routes::pages::province_page,
        routes::pages::city_page,
    ),
    components(schemas(routes::sitemaps::SitemapStats))
)]
pub struct ApiDoc;

/// Create the application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let api_doc = ApiDoc::openapi();

    let app_routes = Router::new()
        .route("/health", get(health_check))
        .route("/sitemap.xml", get(routes::sitemaps::sitemap_index))
        .route("/sitemap-stats", get(routes::sitemaps::sitemap_stats))
        // `sitemap-seo-{n}.xml` and keyword-only pages share one segment
        .route("/{name}", get(routes::keyword_or_sitemap))
        .route("/{keyword}/{province}", get(routes::pages::province_page))
        .route("/{keyword}/{province}/{city}", get(routes::pages::city_page))
        .with_state(state);

    let docs_router = SwaggerUi::new("/docs").url("/api-doc/openapi.json", api_doc);

    Router::new()
        .merge(app_routes)
        .merge(docs_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([axum::http::Method::GET])
                .allow_headers(Any),
        )
}
