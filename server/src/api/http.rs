use axum::{
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use lexiloot_types::{EngineError, RewardMethod};

use crate::Service;

#[derive(Serialize)]
struct HealthzResponse {
    ok: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Maps the engine taxonomy onto HTTP. Error text never includes a round's
/// secret target; the engine guarantees that by construction.
fn error_response(err: EngineError) -> Response {
    let status = match &err {
        EngineError::Unauthorized => StatusCode::UNAUTHORIZED,
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::DuplicateEvent { .. } => StatusCode::CONFLICT,
        EngineError::InsufficientBalance { .. } => StatusCode::CONFLICT,
        EngineError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorBody {
            error: err.code(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

pub(super) async fn healthz() -> Response {
    Json(HealthzResponse { ok: true }).into_response()
}

pub(super) async fn health(AxumState(service): AxumState<Arc<Service>>) -> Response {
    Json(service.health_status().await).into_response()
}

pub(super) async fn http_metrics(AxumState(service): AxumState<Arc<Service>>) -> Response {
    Json(service.metrics().snapshot()).into_response()
}

#[derive(Deserialize)]
pub(super) struct BootstrapRequest {
    user_id: String,
}

pub(super) async fn bootstrap_account(
    AxumState(service): AxumState<Arc<Service>>,
    Json(request): Json<BootstrapRequest>,
) -> Response {
    match service.bootstrap(&request.user_id).await {
        Ok(profile) => Json(profile).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn get_profile(
    AxumState(service): AxumState<Arc<Service>>,
    Path(user_id): Path<String>,
) -> Response {
    match service.profile(&user_id).await {
        Ok(profile) => Json(profile).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn get_ledger(
    AxumState(service): AxumState<Arc<Service>>,
    Path(user_id): Path<String>,
) -> Response {
    Json(service.ledger_of(&user_id).await).into_response()
}

#[derive(Deserialize)]
pub(super) struct CreateRoundRequest {
    user_id: String,
}

pub(super) async fn create_round(
    AxumState(service): AxumState<Arc<Service>>,
    Json(request): Json<CreateRoundRequest>,
) -> Response {
    match service.create_round(&request.user_id).await {
        Ok(round) => Json(round).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
pub(super) struct AuthorizeRoundRequest {
    ad_unit_id: String,
    event_id: String,
    user_id: String,
}

pub(super) async fn authorize_round(
    AxumState(service): AxumState<Arc<Service>>,
    Path(round_id): Path<String>,
    Json(request): Json<AuthorizeRoundRequest>,
) -> Response {
    match service
        .authorize_round(
            &round_id,
            &request.ad_unit_id,
            &request.event_id,
            &request.user_id,
        )
        .await
    {
        Ok(round) => Json(round).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
pub(super) struct SubmitGuessRequest {
    guess: String,
    credential: String,
    user_id: String,
}

pub(super) async fn submit_guess(
    AxumState(service): AxumState<Arc<Service>>,
    Path(round_id): Path<String>,
    Json(request): Json<SubmitGuessRequest>,
) -> Response {
    match service
        .submit_guess(&round_id, &request.guess, &request.credential, &request.user_id)
        .await
    {
        Ok(round) => Json(round).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
pub(super) struct RedemptionRequest {
    user_id: String,
    method: String,
}

pub(super) async fn request_redemption(
    AxumState(service): AxumState<Arc<Service>>,
    Json(request): Json<RedemptionRequest>,
) -> Response {
    let method = match RewardMethod::from_str(&request.method) {
        Ok(method) => method,
        Err(err) => return error_response(EngineError::invalid_input(err.to_string())),
    };
    match service.request_redemption(&request.user_id, method).await {
        Ok(record) => Json(record).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn list_redemptions(
    AxumState(service): AxumState<Arc<Service>>,
    Path(user_id): Path<String>,
) -> Response {
    Json(service.list_redemptions(&user_id).await).into_response()
}
