//! HTTP surface for the booking engine. Thin: every handler validates its
//! wire shape, delegates to the engine, and maps `EngineError` to a status.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use ulid::Ulid;

use crate::engine::{Engine, EngineError, HoldRequest};
use crate::model::{
    CustomerDetails, DayAvailability, Ms, ProductId, Quote, QuoteOptions, Reservation, SlotId,
};
use crate::observability;

/// Shared state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    /// Static bearer token for the admin surface; `None` disables it.
    pub admin_token: Option<String>,
}

// ── Errors ───────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ApiErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            code: self.code,
            message: &self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match &e {
            EngineError::Validation(_) | EngineError::LimitExceeded(_) => {
                Self::bad_request("VALIDATION", e.to_string())
            }
            EngineError::UnknownProduct(_) | EngineError::UnknownSlot(_) => {
                Self::not_found(e.to_string())
            }
            EngineError::NotFound(_) => Self::not_found(e.to_string()),
            EngineError::Conflict(_) | EngineError::PartnerBusy => Self::new(
                StatusCode::CONFLICT,
                "SLOT_TAKEN",
                "this slot was just taken, please pick another",
            ),
            EngineError::InvalidState { .. } | EngineError::AlreadyConfirmed => {
                Self::new(StatusCode::CONFLICT, "INVALID_STATE", e.to_string())
            }
            EngineError::HoldExpired => Self::bad_request(
                "HOLD_EXPIRED",
                "this hold has expired, please choose a new slot",
            ),
            EngineError::WalError(_) => {
                tracing::error!("storage failure: {e}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE",
                    "storage failure",
                )
            }
        }
    }
}

fn parse_id(raw: &str) -> Result<Ulid, ApiError> {
    Ulid::from_string(raw).map_err(|_| ApiError::not_found(format!("unknown reservation: {raw}")))
}

fn iso(ms: Ms) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|d| d.to_rfc3339())
        .unwrap_or_default()
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &state.admin_token else {
        return Err(ApiError::unauthorized("admin surface disabled"));
    };
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if provided == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(ApiError::unauthorized("invalid admin token"))
    }
}

// ── Handlers ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Deserialize)]
struct AvailabilityParams {
    product: Option<String>,
    from: NaiveDate,
    to: NaiveDate,
}

/// GET /v1/availability?product=&from=&to=
async fn get_availability(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Vec<DayAvailability>>, ApiError> {
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => "availability").increment(1);
    let product = params.product.map(ProductId::new);
    let days = state
        .engine
        .get_availability(product.as_ref(), params.from, params.to)
        .await?;
    Ok(Json(days))
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    product: String,
    slot: String,
    guests: u32,
    #[serde(default)]
    excursion: bool,
    #[serde(default)]
    catering: bool,
    #[serde(default)]
    vegan_meals: u32,
}

/// POST /v1/quote
async fn post_quote(
    State(state): State<AppState>,
    Json(body): Json<QuoteBody>,
) -> Result<Json<Quote>, ApiError> {
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => "quote").increment(1);
    let quote = state.engine.quote(
        &ProductId::new(body.product),
        &SlotId::new(body.slot),
        body.guests,
        &QuoteOptions {
            excursion: body.excursion,
            catering: body.catering,
            vegan_meals: body.vegan_meals,
        },
    )?;
    Ok(Json(quote))
}

#[derive(Debug, Deserialize)]
struct CustomerBody {
    name: String,
    email: String,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HoldBody {
    product: String,
    slot: String,
    date: NaiveDate,
    guests: u32,
    customer: CustomerBody,
    notes: Option<String>,
    #[serde(default)]
    excursion: bool,
    #[serde(default)]
    catering: bool,
    #[serde(default)]
    vegan_meals: u32,
}

#[derive(Serialize)]
struct HoldResponse {
    reservation_id: String,
    hold_expires_at: String,
}

/// POST /v1/holds
async fn post_hold(
    State(state): State<AppState>,
    Json(body): Json<HoldBody>,
) -> Result<Json<HoldResponse>, ApiError> {
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => "hold").increment(1);
    let request = HoldRequest {
        product: ProductId::new(body.product),
        slot: SlotId::new(body.slot),
        date: body.date,
        guests: body.guests,
        options: QuoteOptions {
            excursion: body.excursion,
            catering: body.catering,
            vegan_meals: body.vegan_meals,
        },
        customer: CustomerDetails {
            name: body.customer.name,
            email: body.customer.email,
            phone: body.customer.phone,
        },
        notes: body.notes,
    };
    let reservation = state.engine.create_hold(request).await.map_err(|e| match e {
        // For hold creation a bad product/slot is a caller mistake, not a
        // missing resource.
        EngineError::UnknownProduct(_) | EngineError::UnknownSlot(_) => {
            ApiError::bad_request("VALIDATION", e.to_string())
        }
        other => other.into(),
    })?;
    Ok(Json(HoldResponse {
        reservation_id: reservation.id.to_string(),
        hold_expires_at: reservation.hold_expires_at.map(iso).unwrap_or_default(),
    }))
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

/// POST /v1/reservations/{id}/confirm
async fn confirm_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => "confirm").increment(1);
    let id = parse_id(&id)?;
    match state.engine.confirm(id).await {
        Ok(_) => Ok(Json(OkResponse { ok: true })),
        // Retry of an already-confirmed reservation is a safe no-op.
        Err(EngineError::AlreadyConfirmed) => Ok(Json(OkResponse { ok: true })),
        Err(e @ EngineError::InvalidState { .. }) => {
            Err(ApiError::bad_request("INVALID_STATE", e.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
struct CancelBody {
    reason: Option<String>,
}

/// POST /v1/reservations/{id}/cancel (admin)
async fn cancel_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<CancelBody>>,
) -> Result<Json<OkResponse>, ApiError> {
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => "cancel").increment(1);
    require_admin(&state, &headers)?;
    let id = parse_id(&id)?;
    let reason = body.and_then(|Json(b)| b.reason);
    state.engine.cancel(id, reason).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// GET /v1/reservations/{id}
async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>, ApiError> {
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => "get_reservation").increment(1);
    let id = parse_id(&id)?;
    Ok(Json(state.engine.get_reservation(&id).await?))
}

/// GET /v1/reservations (admin, newest first)
async fn list_reservations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => "list_reservations").increment(1);
    require_admin(&state, &headers)?;
    Ok(Json(state.engine.list_reservations().await))
}

// ── Router ───────────────────────────────────────────────────────

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/availability", get(get_availability))
        .route("/quote", post(post_quote))
        .route("/holds", post(post_hold))
        .route("/reservations", get(list_reservations))
        .route("/reservations/{id}", get(get_reservation))
        .route("/reservations/{id}/confirm", post(confirm_reservation))
        .route("/reservations/{id}/cancel", post(cancel_reservation));

    Router::new()
        .route("/health", get(health))
        .nest("/v1", api_v1)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
