use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{authenticate, ApiError, AppState};
use crate::resolve::{Provenance, Suggestion};

#[derive(Deserialize)]
pub struct SuggestBody {
    nombre: String,
}

#[derive(Serialize)]
pub struct SuggestionJson {
    potencia_watts: Option<f64>,
    categoria: &'static str,
    provenance: Provenance,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    sugerencia: SuggestionJson,
}

impl From<Suggestion> for SuggestionJson {
    fn from(s: Suggestion) -> Self {
        SuggestionJson {
            potencia_watts: s.power_watts,
            categoria: s.category.label(),
            provenance: s.provenance,
        }
    }
}

pub async fn suggest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SuggestBody>,
) -> Result<Json<SuggestResponse>, ApiError> {
    authenticate(&state, &headers).await?;

    let suggestion = state.resolver.suggest(&body.nombre).await?;
    Ok(Json(SuggestResponse {
        sugerencia: suggestion.into(),
    }))
}
