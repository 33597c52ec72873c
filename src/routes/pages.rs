use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use quick_xml::escape::escape;

use crate::error::AppError;
use crate::model::PageContentRecord;
use crate::pages::{Freshness, PageLookup, PageOutcome, ResolvedPage};
use crate::AppState;

/// Landing page for a keyword alone; shows its most recently generated page
#[utoipa::path(
    get,
    path = "/{keyword}",
    params(("keyword" = String, Path, description = "Keyword slug")),
    responses(
        (status = 200, description = "Landing page HTML", body = String, content_type = "text/html"),
        (status = 404, description = "No content for this keyword"),
        (status = 503, description = "Page content and catalog unreachable")
    )
)]
pub async fn keyword_page(state: &AppState, keyword: String) -> Result<Response, AppError> {
    serve(state, PageLookup::Keyword(keyword)).await
}

/// Landing page for a keyword in a province
#[utoipa::path(
    get,
    path = "/{keyword}/{province}",
    params(
        ("keyword" = String, Path, description = "Keyword slug"),
        ("province" = String, Path, description = "Province slug")
    ),
    responses(
        (status = 200, description = "Landing page HTML", body = String, content_type = "text/html"),
        (status = 404, description = "No content for this combination"),
        (status = 503, description = "Page content and catalog unreachable")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn province_page(
    State(state): State<AppState>,
    Path((keyword, province)): Path<(String, String)>,
) -> Result<Response, AppError> {
    serve(&state, PageLookup::Located { keyword, province, city: None }).await
}

/// Landing page for a keyword in a city
#[utoipa::path(
    get,
    path = "/{keyword}/{province}/{city}",
    params(
        ("keyword" = String, Path, description = "Keyword slug"),
        ("province" = String, Path, description = "Province slug"),
        ("city" = String, Path, description = "City slug")
    ),
    responses(
        (status = 200, description = "Landing page HTML", body = String, content_type = "text/html"),
        (status = 404, description = "No content for this combination"),
        (status = 503, description = "Page content and catalog unreachable")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn city_page(
    State(state): State<AppState>,
    Path((keyword, province, city)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    serve(&state, PageLookup::Located { keyword, province, city: Some(city) }).await
}

async fn serve(state: &AppState, lookup: PageLookup) -> Result<Response, AppError> {
    match state.pages.resolve(&lookup).await {
        Ok(PageOutcome::Found(page)) => {
            let fresh_secs = state.settings.resolver.fresh_for.as_secs();
            Ok(page_response(&state.settings.sitemaps.site_url, &page, fresh_secs))
        }
        Ok(PageOutcome::NotFound) => Err(AppError::NotFound(lookup.path())),
        Err(e) => {
            tracing::error!("Failed to resolve {}: {}", lookup.path(), e);
            Err(e)
        }
    }
}

fn page_response(site_url: &str, page: &ResolvedPage, fresh_secs: u64) -> Response {
    let cache_control = format!("public, s-maxage={}, stale-while-revalidate=86400", fresh_secs);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CACHE_CONTROL, cache_control),
            (HeaderName::from_static("x-page-freshness"), page.freshness.as_str().to_string()),
        ],
        render_page(site_url, &page.record, page.freshness),
    )
        .into_response()
}

/// JSON-LD inside a `<script>` element must not contain `</`.
fn json_ld(markup: &serde_json::Value) -> Option<String> {
    match markup {
        serde_json::Value::Null => None,
        value => serde_json::to_string(value).ok().map(|s| s.replace("</", "<\\/")),
    }
}

pub fn render_page(site_url: &str, record: &PageContentRecord, freshness: Freshness) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape(record.meta_title.as_str())));
    html.push_str(&format!(
        "<meta name=\"description\" content=\"{}\">\n",
        escape(record.meta_description.as_str())
    ));
    html.push_str(&format!(
        "<link rel=\"canonical\" href=\"{}{}\">\n",
        escape(site_url),
        escape(record.url.as_str())
    ));
    if freshness == Freshness::StandIn {
        html.push_str("<meta name=\"robots\" content=\"noindex\">\n");
    }
    if let Some(ld) = json_ld(&record.schema_markup) {
        html.push_str(&format!("<script type=\"application/ld+json\">{}</script>\n", ld));
    }
    html.push_str("</head>\n<body>\n<main>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape(record.h1.as_str())));
    if !record.intro_text.is_empty() {
        html.push_str(&format!("<p>{}</p>\n", escape(record.intro_text.as_str())));
    }

    let stats = &record.stats;
    if stats.salon_count > 0 || stats.service_count > 0 {
        html.push_str(&format!(
            "<p class=\"stats\">{} salons offering {} services",
            stats.salon_count, stats.service_count
        ));
        if let Some(avg) = stats.avg_price {
            html.push_str(&format!(", average price R{:.0}", avg));
        }
        html.push_str(".</p>\n");
    }

    for heading in &record.headings {
        html.push_str(&format!("<h2>{}</h2>\n", escape(heading.as_str())));
    }

    if !record.related_links.is_empty() {
        html.push_str("<nav><ul>\n");
        for link in &record.related_links {
            html.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape(link.url.as_str()),
                escape(link.label.as_str())
            ));
        }
        html.push_str("</ul></nav>\n");
    }
    html.push_str("</main>\n</body>\n</html>\n");
    html
}
