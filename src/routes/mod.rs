// Route handlers, grouped by what they serve
pub mod pages;
pub mod sitemaps;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::sitemaps::paginate::segment_from_file_name;
use crate::AppState;

/// Single-segment paths are either a sitemap chunk file name or a
/// keyword slug. Keyword slugs never contain a '.', so the two can't
/// collide.
#[tracing::instrument(skip(state))]
pub async fn keyword_or_sitemap(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match segment_from_file_name(&name) {
        Some(raw) => sitemaps::sitemap_segment(&state, raw).await,
        None => pages::keyword_page(&state, name).await.into_response(),
    }
}
