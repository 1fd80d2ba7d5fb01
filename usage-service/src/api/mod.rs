pub mod auth;
pub mod devices;
pub mod suggest;

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::devices::DeviceService;
use crate::error::ServiceError;
use crate::resolve::Resolver;
use auth::IdentityResolver;

#[derive(Clone)]
pub struct AppState {
    pub devices: Arc<DeviceService>,
    pub resolver: Arc<Resolver>,
    pub identity: Arc<dyn IdentityResolver>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/dispositivos", post(devices::create).get(devices::list))
        .route("/api/dispositivos/sugerir", post(suggest::suggest))
        .route(
            "/api/dispositivos/:id",
            get(devices::get_one)
                .put(devices::update)
                .delete(devices::remove),
        )
        .route(
            "/api/dispositivos/:id/consumos",
            post(devices::log_usage).get(devices::list_usage),
        )
        .with_state(state)
}

async fn home() -> &'static str {
    "PowerFlow API funcionando correctamente ⚡"
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// An error already mapped to an HTTP status, serialized as
/// `{"error": "..."}` like every other endpoint of the original API.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn unauthorized(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.to_string(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let status = match &e {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::Store(cause) => {
                tracing::error!(error = %cause, "store failure");
                return Self::internal();
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

/// Resolve the caller's identity from the request headers, 401 on failure.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<i64, ApiError> {
    let Some(token) = auth::bearer_token(headers) else {
        return Err(ApiError::unauthorized("Token no proporcionado. Acceso denegado."));
    };

    match state.identity.resolve(token).await {
        Ok(Some(user_id)) => Ok(user_id),
        Ok(None) => Err(ApiError::unauthorized("Token inválido o expirado")),
        Err(e) => {
            tracing::error!(error = %e, "identity resolution failed");
            Err(ApiError::internal())
        }
    }
}
