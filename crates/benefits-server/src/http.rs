/// JSON HTTP API over the benefits catalog.
///
/// Every handler loads the sheet through `Catalog`, so a request sees the sheet as it
/// is at that moment. Source failures surface as 502 rather than empty lists.
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use benefits_core::catalog::{Catalog, SearchFilters};
use benefits_core::error::CatalogError;
use benefits_core::model::{Benefit, BenefitDetail, BenefitView, NamedCount};

use crate::error::ApiError;

#[derive(Clone)]
pub struct HttpState {
    catalog: Arc<Catalog>,
}

pub fn router(catalog: Arc<Catalog>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/benefits", get(list_benefits))
        .route("/api/benefits/enhanced", get(enhanced_benefits))
        .route("/api/benefits/search", get(search_benefits))
        .route("/api/benefits/{id}", get(get_benefit))
        .route("/api/search", get(search_benefits))
        .route("/api/categories", get(list_categories))
        .route("/api/audiences", get(list_audiences))
        .route("/api/organizations", get(list_organizations))
        .route("/api/ai/suggest", post(suggest))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(HttpState { catalog })
}

/// Bind and serve until ctrl-c.
pub async fn serve(catalog: Arc<Catalog>, bind_addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind http server at {bind_addr}"))?;
    info!(addr = %listener.local_addr()?, "http server listening");

    axum::serve(listener, router(catalog))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("http server failed")
}

// --- Responses ---

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct ListResponse<T> {
    success: bool,
    data: Vec<T>,
    count: usize,
}

impl<T> ListResponse<T> {
    fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    success: bool,
    data: Vec<BenefitView>,
    count: usize,
    filters: SearchFilters,
}

#[derive(Debug, Serialize)]
struct BenefitResponse {
    success: bool,
    benefit: BenefitDetail,
}

#[derive(Debug, Serialize)]
struct CategoriesResponse {
    success: bool,
    categories: Vec<NamedCount>,
    total_categories: usize,
}

#[derive(Debug, Serialize)]
struct AudiencesResponse {
    success: bool,
    audiences: Vec<NamedCount>,
    total: usize,
}

#[derive(Debug, Serialize)]
struct OrganizationsResponse {
    success: bool,
    organizations: Vec<NamedCount>,
    total: usize,
}

#[derive(Debug, Serialize)]
struct SuggestResponse {
    success: bool,
    query: String,
    keywords: Vec<String>,
    suggestions: Vec<Benefit>,
    explanation: String,
    total_found: usize,
}

// --- Requests ---

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    q: Option<String>,
    category: Option<String>,
    audience: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestRequest {
    #[serde(default)]
    query: Option<String>,
}

// --- Handlers ---

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "AM-Kelavi Benefits API is running",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn list_benefits(State(state): State<HttpState>) -> Result<Json<ListResponse<Benefit>>, ApiError> {
    let benefits = state
        .catalog
        .list_benefits()
        .await
        .map_err(|e| ApiError::new(e, "Failed to fetch benefits data"))?;
    Ok(Json(ListResponse::new(benefits)))
}

async fn enhanced_benefits(
    State(state): State<HttpState>,
) -> Result<Json<ListResponse<BenefitView>>, ApiError> {
    let benefits = state
        .catalog
        .enhanced_benefits()
        .await
        .map_err(|e| ApiError::new(e, "Failed to fetch enhanced benefits data"))?;
    Ok(Json(ListResponse::new(benefits)))
}

async fn search_benefits(
    State(state): State<HttpState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let filters = SearchFilters::new(params.q, params.category, params.audience);
    let data = state
        .catalog
        .search_benefits(&filters)
        .await
        .map_err(|e| ApiError::new(e, "Failed to search benefits"))?;
    Ok(Json(SearchResponse {
        success: true,
        count: data.len(),
        data,
        filters,
    }))
}

async fn get_benefit(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Json<BenefitResponse>, ApiError> {
    let benefit = state
        .catalog
        .benefit_by_id(&id)
        .await
        .map_err(|e| ApiError::new(e, "Failed to fetch benefit details"))?;
    Ok(Json(BenefitResponse {
        success: true,
        benefit,
    }))
}

async fn list_categories(State(state): State<HttpState>) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = state
        .catalog
        .categories()
        .await
        .map_err(|e| ApiError::new(e, "Failed to fetch categories"))?;
    Ok(Json(CategoriesResponse {
        success: true,
        total_categories: categories.len(),
        categories,
    }))
}

async fn list_audiences(State(state): State<HttpState>) -> Result<Json<AudiencesResponse>, ApiError> {
    let audiences = state
        .catalog
        .audiences()
        .await
        .map_err(|e| ApiError::new(e, "Failed to fetch audiences"))?;
    Ok(Json(AudiencesResponse {
        success: true,
        total: audiences.len(),
        audiences,
    }))
}

async fn list_organizations(
    State(state): State<HttpState>,
) -> Result<Json<OrganizationsResponse>, ApiError> {
    let organizations = state
        .catalog
        .organizations()
        .await
        .map_err(|e| ApiError::new(e, "Failed to fetch organizations"))?;
    Ok(Json(OrganizationsResponse {
        success: true,
        total: organizations.len(),
        organizations,
    }))
}

async fn suggest(
    State(state): State<HttpState>,
    body: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<SuggestResponse>, ApiError> {
    // A missing or unreadable body is the same client error as a blank query
    let Json(request) = body.map_err(|rejection| {
        warn!(error = %rejection, "rejected suggest body");
        ApiError::new(
            CatalogError::Validation("query is required".to_string()),
            "Failed to generate suggestions",
        )
    })?;
    let query = request.query.unwrap_or_default();
    let result = state
        .catalog
        .suggest(&query)
        .await
        .map_err(|e| ApiError::new(e, "Failed to generate suggestions"))?;
    Ok(Json(SuggestResponse {
        success: true,
        query,
        keywords: result.keywords,
        suggestions: result.suggestions,
        explanation: result.explanation,
        total_found: result.total_matched,
    }))
}

// --- CORS ---

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }
    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
}
