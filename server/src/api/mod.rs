use axum::{
    extract::{Request, State as AxumState},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::Service;

mod http;

pub struct Api {
    service: Arc<Service>,
}

impl Api {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::HeaderName::from_static("x-request-id"),
            ])
            .expose_headers([header::HeaderName::from_static("x-request-id")]);

        Router::new()
            .route("/healthz", get(http::healthz))
            .route("/health", get(http::health))
            .route("/metrics/http", get(http::http_metrics))
            .route("/account/bootstrap", post(http::bootstrap_account))
            .route("/account/:user_id", get(http::get_profile))
            .route("/account/:user_id/ledger", get(http::get_ledger))
            .route("/round", post(http::create_round))
            .route("/round/:round_id/authorize", post(http::authorize_round))
            .route("/round/:round_id/guess", post(http::submit_guess))
            .route("/redemption", post(http::request_redemption))
            .route("/redemption/:user_id", get(http::list_redemptions))
            .layer(cors)
            .layer(middleware::from_fn_with_state(
                self.service.clone(),
                request_id_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.service.clone())
    }
}

async fn request_id_middleware(
    AxumState(service): AxumState<Arc<Service>>,
    req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get(header::HeaderName::from_static("x-request-id"))
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    service.metrics().inc_requests();
    let mut response = next.run(req).await;
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(
            header::HeaderName::from_static("x-request-id"),
            header_value,
        );
    }
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "http.request"
    );
    response
}
