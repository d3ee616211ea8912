//! # API REST
//!
//! REST API implementation for the clindex clinic directory.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON envelopes, CORS, bearer auth)
//!
//! Uses `api-shared` for authentication and the health service, and
//! `clindex-core` for every domain operation.

#![warn(rust_2018_idioms)]

use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{BearerTokens, HealthRes, HealthService};
use clindex_core::{
    Clinic, ClinicDraft, ClinicId, ClinicPatch, ClinicService, ClinicStore, ClinicSummary,
    CoreConfig, DirectoryError, GeocodeAdapter, GeocodedPlace, Geocoder, LocationDraft, Review,
    ReviewId, ReviewLedger, ReviewPatch, ReviewSubmission, SearchCriteria, SearchEngine,
    SearchRequest, WeeklyHours,
};
use clindex_types::UserId;

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers:
/// the core services wired over one store, plus the bearer-token map for the
/// authenticated routes.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    clinics: Arc<ClinicService>,
    search: Arc<SearchEngine>,
    reviews: Arc<ReviewLedger>,
    geocode: Arc<GeocodeAdapter>,
    tokens: Arc<BearerTokens>,
}

impl AppState {
    pub fn new(
        cfg: Arc<CoreConfig>,
        store: Arc<dyn ClinicStore>,
        geocoder: Arc<dyn Geocoder>,
        tokens: BearerTokens,
    ) -> Self {
        Self {
            clinics: Arc::new(ClinicService::new(cfg.clone(), store.clone())),
            search: Arc::new(SearchEngine::new(cfg.clone(), store.clone())),
            reviews: Arc::new(ReviewLedger::new(cfg.clone(), store)),
            geocode: Arc::new(GeocodeAdapter::new(geocoder)),
            tokens: Arc::new(tokens),
            cfg,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_clinics,
        search_clinics,
        search_nearby,
        geocode,
        get_clinic,
        create_clinic,
        update_clinic,
        delete_clinic,
        list_reviews,
        add_review,
        update_review,
        delete_review,
    ),
    components(schemas(
        HealthRes,
        Clinic,
        ClinicSummary,
        ClinicDraft,
        ClinicPatch,
        LocationDraft,
        WeeklyHours,
        Review,
        ReviewSubmission,
        ReviewPatch,
        GeocodedPlace,
        ListClinicsRes,
        SearchClinicsRes,
        SearchFilters,
        SearchNearbyRes,
        LngLat,
        GeocodeRes,
        ClinicRes,
        DeleteClinicRes,
        ListReviewsRes,
        ReviewRes,
        DeleteReviewRes,
        ErrorRes,
    ))
)]
struct ApiDoc;

/// Builds the full REST router over the given state.
///
/// Routes are JSON-in/JSON-out; Swagger UI is served at `/swagger-ui` with
/// the OpenAPI document at `/api-docs/openapi.json`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/clinics", get(list_clinics))
        .route("/clinics", post(create_clinic))
        .route("/clinics/search", get(search_clinics))
        .route("/clinics/nearby", get(search_nearby))
        .route("/geocode", get(geocode))
        .route("/clinics/:id", get(get_clinic))
        .route("/clinics/:id", put(update_clinic))
        .route("/clinics/:id", delete(delete_clinic))
        .route("/clinics/:id/reviews", get(list_reviews))
        .route("/clinics/:id/reviews", post(add_review))
        .route("/clinics/:id/reviews/:review_id", put(update_review))
        .route("/clinics/:id/reviews/:review_id", delete(delete_review))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

/// Error body returned by every failing route.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
struct ErrorRes {
    /// Machine-readable error kind, e.g. `not_found`.
    error: &'static str,
    message: String,
}

/// REST-side wrapper of the core error taxonomy.
///
/// Handlers bubble `DirectoryError` out with `?`; the response mapping picks
/// the status code and serializes the envelope.
struct ApiError(DirectoryError);

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            DirectoryError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            DirectoryError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            DirectoryError::Forbidden(_) => StatusCode::FORBIDDEN,
            DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
            DirectoryError::Conflict(_) => StatusCode::CONFLICT,
            DirectoryError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self.0);
        } else {
            tracing::debug!("Request rejected: {:?}", self.0);
        }
        let body = Json(ErrorRes {
            error: self.0.kind(),
            message: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ListQuery {
    /// 1-based page number, defaults to 1.
    page: Option<usize>,
    /// Page size, defaults to 50, capped at 100.
    limit: Option<usize>,
}

/// Query parameters shared by `/clinics/search` and `/clinics/nearby`.
#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
struct SearchQuery {
    /// Case-insensitive substring match on the city.
    city: Option<String>,
    /// Exact zip code match.
    zip_code: Option<String>,
    language: Option<String>,
    specialty: Option<String>,
    /// Only the literal string "true" switches the constraint on.
    accepts_uninsured: Option<String>,
    /// Center longitude in degrees.
    lng: Option<f64>,
    /// Center latitude in degrees.
    lat: Option<f64>,
    /// Radius in kilometres, defaults to 25.
    radius: Option<f64>,
    limit: Option<usize>,
}

impl SearchQuery {
    fn to_request(&self) -> SearchRequest {
        SearchRequest {
            criteria: SearchCriteria {
                city: self.city.clone(),
                zip_code: self.zip_code.clone(),
                language: self.language.clone(),
                specialty: self.specialty.clone(),
                accepts_uninsured: self.accepts_uninsured.clone(),
            },
            longitude: self.lng,
            latitude: self.lat,
            radius_km: self.radius,
            limit: self.limit,
        }
    }
}

#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct GeocodeQuery {
    /// Free-text address or place name.
    q: Option<String>,
}

// ============================================================================
// RESPONSE ENVELOPES
// ============================================================================

#[derive(serde::Serialize, utoipa::ToSchema)]
struct ListClinicsRes {
    success: bool,
    count: usize,
    total: usize,
    page: usize,
    pages: usize,
    data: Vec<ClinicSummary>,
}

#[derive(serde::Serialize, utoipa::ToSchema)]
struct SearchClinicsRes {
    success: bool,
    count: usize,
    filters: SearchFilters,
    data: Vec<ClinicSummary>,
}

/// Echo of the effective search criteria.
#[derive(serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accepts_uninsured: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    radius: f64,
}

impl SearchFilters {
    fn echo(query: &SearchQuery, default_radius_km: f64) -> Self {
        Self {
            city: query.city.clone(),
            zip_code: query.zip_code.clone(),
            language: query.language.clone(),
            specialty: query.specialty.clone(),
            accepts_uninsured: query.accepts_uninsured.clone(),
            lng: query.lng,
            lat: query.lat,
            // Zero means "no radius given", so the default is echoed back.
            radius: query.radius.filter(|r| *r != 0.0).unwrap_or(default_radius_km),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
struct SearchNearbyRes {
    success: bool,
    count: usize,
    search_location: LngLat,
    /// Effective radius in kilometres.
    radius: f64,
    data: Vec<ClinicSummary>,
}

#[derive(serde::Serialize, utoipa::ToSchema)]
struct LngLat {
    lng: f64,
    lat: f64,
}

#[derive(serde::Serialize, utoipa::ToSchema)]
struct GeocodeRes {
    found: bool,
    /// `null` when the query matched nothing.
    data: Option<GeocodedPlace>,
}

#[derive(serde::Serialize, utoipa::ToSchema)]
struct ClinicRes {
    clinic: Clinic,
}

#[derive(serde::Serialize, utoipa::ToSchema)]
struct DeleteClinicRes {
    message: String,
}

#[derive(serde::Serialize, utoipa::ToSchema)]
struct ListReviewsRes {
    success: bool,
    count: usize,
    data: Vec<Review>,
}

#[derive(serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
struct ReviewRes {
    review: Review,
    average_rating: f64,
}

#[derive(serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
struct DeleteReviewRes {
    message: String,
    average_rating: f64,
}

// ============================================================================
// HANDLERS
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the clinic directory service.
/// This endpoint is used for monitoring and load balancer health checks.
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/clinics",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of the clinic directory", body = ListClinicsRes),
        (status = 502, description = "Storage unavailable", body = ErrorRes)
    )
)]
/// List clinics, paginated
///
/// Returns clinic summaries (reviews projected out) in stable insertion
/// order, one page at a time.
///
/// # Returns
/// * `Ok(Json<ListClinicsRes>)` - Page of summaries plus pagination counters
/// * `Err(ApiError)` - Envelope with the error kind and message
///
/// # Errors
/// Returns `502 Bad Gateway` if the store cannot be read.
#[axum::debug_handler]
async fn list_clinics(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListClinicsRes>, ApiError> {
    let page = state.clinics.list(query.page, query.limit)?;
    Ok(Json(ListClinicsRes {
        success: true,
        count: page.clinics.len(),
        total: page.total,
        page: page.page,
        pages: page.pages,
        data: page.clinics,
    }))
}

#[utoipa::path(
    get,
    path = "/clinics/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Clinics matching the criteria", body = SearchClinicsRes),
        (status = 400, description = "Out-of-range coordinates or radius", body = ErrorRes),
        (status = 502, description = "Storage unavailable", body = ErrorRes)
    )
)]
/// Search clinics by criteria, optionally inside a radius
///
/// All predicates are optional. When both `lng` and `lat` are present the
/// results are restricted to the spherical radius around that center; a lone
/// coordinate is ignored. Unknown `language` or `specialty` values match
/// nothing rather than failing.
///
/// # Returns
/// * `Ok(Json<SearchClinicsRes>)` - Matching summaries plus a filter echo
///
/// # Errors
/// Returns `400 Bad Request` if a provided coordinate is out of range or the
/// radius is not positive.
#[axum::debug_handler]
async fn search_clinics(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchClinicsRes>, ApiError> {
    let results = state.search.search(&query.to_request())?;
    Ok(Json(SearchClinicsRes {
        success: true,
        count: results.len(),
        filters: SearchFilters::echo(&query, state.cfg.default_radius_km()),
        data: results,
    }))
}

#[utoipa::path(
    get,
    path = "/clinics/nearby",
    params(SearchQuery),
    responses(
        (status = 200, description = "Clinics nearest the center, closest first", body = SearchNearbyRes),
        (status = 400, description = "Missing or out-of-range center", body = ErrorRes),
        (status = 502, description = "Storage unavailable", body = ErrorRes)
    )
)]
/// Find the clinics nearest to a point
///
/// Requires `lng` and `lat`. Results are sorted by increasing distance and
/// each datum carries `distance` in kilometres, rounded to 2 decimals.
#[axum::debug_handler]
async fn search_nearby(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchNearbyRes>, ApiError> {
    let (center, results) = state.search.search_nearby(&query.to_request())?;
    Ok(Json(SearchNearbyRes {
        success: true,
        count: results.len(),
        search_location: LngLat {
            lng: center.center.longitude(),
            lat: center.center.latitude(),
        },
        radius: center.radius_km,
        data: results,
    }))
}

#[utoipa::path(
    get,
    path = "/geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Geocoding outcome, found or not", body = GeocodeRes),
        (status = 400, description = "Blank query", body = ErrorRes),
        (status = 502, description = "Geocoding service unavailable", body = ErrorRes)
    )
)]
/// Resolve a free-text address to coordinates
///
/// A valid query that matches nothing is a `200` with `found: false`, not an
/// error; the caller can distinguish "no such place" from upstream failure.
#[axum::debug_handler]
async fn geocode(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<GeocodeRes>, ApiError> {
    // The geocoder blocks on HTTP; run it off the async workers.
    let adapter = Arc::clone(&state.geocode);
    let q = query.q.unwrap_or_default();
    let place = tokio::task::spawn_blocking(move || adapter.geocode(&q))
        .await
        .map_err(|e| DirectoryError::UpstreamUnavailable(e.to_string()))??;
    Ok(Json(GeocodeRes {
        found: place.is_some(),
        data: place,
    }))
}

#[utoipa::path(
    get,
    path = "/clinics/{id}",
    responses(
        (status = 200, description = "The clinic with its reviews", body = ClinicRes),
        (status = 404, description = "Clinic not found", body = ErrorRes)
    )
)]
/// Fetch one clinic, reviews included
#[axum::debug_handler]
async fn get_clinic(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ClinicRes>, ApiError> {
    let clinic = state.clinics.get(parse_clinic_id(&id)?)?;
    Ok(Json(ClinicRes { clinic }))
}

#[utoipa::path(
    post,
    path = "/clinics",
    request_body = ClinicDraft,
    responses(
        (status = 201, description = "Clinic created", body = Clinic),
        (status = 400, description = "Invalid draft", body = ErrorRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes)
    )
)]
/// Create a clinic from a draft
#[axum::debug_handler]
async fn create_clinic(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<ClinicDraft>,
) -> Result<(StatusCode, Json<Clinic>), ApiError> {
    authenticate(&state, &headers)?;
    let clinic = state.clinics.create(draft)?;
    Ok((StatusCode::CREATED, Json(clinic)))
}

#[utoipa::path(
    put,
    path = "/clinics/{id}",
    request_body = ClinicPatch,
    responses(
        (status = 200, description = "Clinic updated", body = ClinicRes),
        (status = 400, description = "Invalid patch", body = ErrorRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes),
        (status = 404, description = "Clinic not found", body = ErrorRes)
    )
)]
/// Apply a partial update to a clinic
#[axum::debug_handler]
async fn update_clinic(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
    Json(patch): Json<ClinicPatch>,
) -> Result<Json<ClinicRes>, ApiError> {
    authenticate(&state, &headers)?;
    let clinic = state.clinics.update(parse_clinic_id(&id)?, patch)?;
    Ok(Json(ClinicRes { clinic }))
}

#[utoipa::path(
    delete,
    path = "/clinics/{id}",
    responses(
        (status = 200, description = "Clinic deleted", body = DeleteClinicRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes),
        (status = 404, description = "Clinic not found", body = ErrorRes)
    )
)]
/// Delete a clinic and its reviews
#[axum::debug_handler]
async fn delete_clinic(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteClinicRes>, ApiError> {
    authenticate(&state, &headers)?;
    state.clinics.delete(parse_clinic_id(&id)?)?;
    Ok(Json(DeleteClinicRes {
        message: "Clinic deleted successfully".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/clinics/{id}/reviews",
    responses(
        (status = 200, description = "The clinic's reviews in creation order", body = ListReviewsRes),
        (status = 404, description = "Clinic not found", body = ErrorRes)
    )
)]
/// List a clinic's reviews
#[axum::debug_handler]
async fn list_reviews(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ListReviewsRes>, ApiError> {
    let reviews = state.reviews.list_reviews(parse_clinic_id(&id)?)?;
    Ok(Json(ListReviewsRes {
        success: true,
        count: reviews.len(),
        data: reviews,
    }))
}

#[utoipa::path(
    post,
    path = "/clinics/{id}/reviews",
    request_body = ReviewSubmission,
    responses(
        (status = 201, description = "Review added", body = ReviewRes),
        (status = 400, description = "Missing or out-of-range rating", body = ErrorRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes),
        (status = 404, description = "Clinic not found", body = ErrorRes),
        (status = 409, description = "User already reviewed this clinic", body = ErrorRes)
    )
)]
/// Add a review to a clinic
#[axum::debug_handler]
async fn add_review(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
    Json(submission): Json<ReviewSubmission>,
) -> Result<(StatusCode, Json<ReviewRes>), ApiError> {
    let user = authenticate(&state, &headers)?;
    let (review, average_rating) = state
        .reviews
        .add_review(parse_clinic_id(&id)?, &user, submission)?;
    Ok((
        StatusCode::CREATED,
        Json(ReviewRes {
            review,
            average_rating,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/clinics/{id}/reviews/{review_id}",
    request_body = ReviewPatch,
    responses(
        (status = 200, description = "Review updated", body = ReviewRes),
        (status = 400, description = "Invalid patch", body = ErrorRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes),
        (status = 403, description = "Not the review's author", body = ErrorRes),
        (status = 404, description = "Clinic or review not found", body = ErrorRes)
    )
)]
/// Edit one's own review
#[axum::debug_handler]
async fn update_review(
    State(state): State<AppState>,
    AxumPath((id, review_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
    Json(patch): Json<ReviewPatch>,
) -> Result<Json<ReviewRes>, ApiError> {
    let user = authenticate(&state, &headers)?;
    let (review, average_rating) = state.reviews.update_review(
        parse_clinic_id(&id)?,
        parse_review_id(&review_id)?,
        &user,
        patch,
    )?;
    Ok(Json(ReviewRes {
        review,
        average_rating,
    }))
}

#[utoipa::path(
    delete,
    path = "/clinics/{id}/reviews/{review_id}",
    responses(
        (status = 200, description = "Review deleted", body = DeleteReviewRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes),
        (status = 403, description = "Not the review's author", body = ErrorRes),
        (status = 404, description = "Clinic or review not found", body = ErrorRes)
    )
)]
/// Delete one's own review
#[axum::debug_handler]
async fn delete_review(
    State(state): State<AppState>,
    AxumPath((id, review_id)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<DeleteReviewRes>, ApiError> {
    let user = authenticate(&state, &headers)?;
    let average_rating = state.reviews.delete_review(
        parse_clinic_id(&id)?,
        parse_review_id(&review_id)?,
        &user,
    )?;
    Ok(Json(DeleteReviewRes {
        message: "Review deleted successfully".into(),
        average_rating,
    }))
}

// ============================================================================
// HELPERS
// ============================================================================

/// Resolves the `Authorization` header to a verified user.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserId, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state
        .tokens
        .verify(header)
        .map_err(|e| ApiError(DirectoryError::Unauthenticated(e.to_string())))
}

/// A malformed id cannot name any clinic, so it reads as absent.
fn parse_clinic_id(raw: &str) -> Result<ClinicId, ApiError> {
    ClinicId::parse(raw).ok_or_else(|| ApiError(DirectoryError::NotFound("Clinic")))
}

fn parse_review_id(raw: &str) -> Result<ReviewId, ApiError> {
    ReviewId::parse(raw).ok_or_else(|| ApiError(DirectoryError::NotFound("Review")))
}
