use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::sitemaps::FetchedDocument;
use crate::AppState;

fn xml_response(document: FetchedDocument) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, document.source.cache_control()),
            (HeaderName::from_static("x-source"), document.source.as_str()),
        ],
        document.body,
    )
        .into_response()
}

/// Sitemap index: static pages, every SEO chunk, then the fixed sitemaps
#[utoipa::path(
    get,
    path = "/sitemap.xml",
    responses(
        (status = 200, description = "Sitemap index; X-Source tells backend, local-fallback or empty-fallback", body = String, content_type = "application/xml")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn sitemap_index(State(state): State<AppState>) -> Response {
    xml_response(state.sitemaps.index().await)
}

/// One chunk of generated landing page URLs
#[utoipa::path(
    get,
    path = "/sitemap-seo-{segment}.xml",
    params(
        ("segment" = String, Path, description = "Zero-based chunk number; anything else yields an empty urlset")
    ),
    responses(
        (status = 200, description = "A urlset, empty when the segment is invalid or out of range", body = String, content_type = "application/xml")
    )
)]
pub async fn sitemap_segment(state: &AppState, segment: &str) -> Response {
    xml_response(state.sitemaps.segment(segment).await)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SitemapStats {
    /// URLs across all generated chunks
    pub total_urls: usize,
    /// Number of `sitemap-seo-{n}.xml` chunks
    pub total_sitemaps: usize,
    pub chunk_cap: usize,
    pub keyword_count: usize,
    pub location_count: usize,
    /// RFC 3339 time the local snapshot was generated
    pub generated_at: String,
    /// Local rebuilds since startup
    pub local_builds: usize,
}

/// Diagnostics for the locally generated sitemap snapshot
#[utoipa::path(
    get,
    path = "/sitemap-stats",
    responses(
        (status = 200, description = "Local sitemap snapshot statistics", body = SitemapStats),
        (status = 503, description = "Catalog could not be loaded")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn sitemap_stats(State(state): State<AppState>) -> Result<Json<SitemapStats>, AppError> {
    let local = state.sitemaps.local();
    let snapshot = local
        .snapshot()
        .await
        .map_err(|e| AppError::Unavailable(format!("{:#}", e)))?;

    Ok(Json(SitemapStats {
        total_urls: snapshot.total_urls,
        total_sitemaps: snapshot.chunks.len(),
        chunk_cap: state.sitemaps.settings().chunk_cap,
        keyword_count: snapshot.keyword_count,
        location_count: snapshot.location_count,
        generated_at: snapshot.generated_at.to_rfc3339(),
        local_builds: local.builds(),
    }))
}
