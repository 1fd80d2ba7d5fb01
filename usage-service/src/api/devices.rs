use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use device_client::domain::{ConsumptionEntry, DeviceCategory, DevicePatch};
use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

use super::{authenticate, ApiError, AppState};
use crate::devices::{CreateDevice, DeviceSummary};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Deserialize)]
pub struct CreateBody {
    nombre: String,
    potencia_watts: Option<f64>,
    categoria: String,
    horas_uso_dia: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdateBody {
    nombre: Option<String>,
    potencia_watts: Option<f64>,
    categoria: Option<String>,
    horas_uso_dia: Option<f64>,
}

#[derive(Deserialize)]
pub struct LogUsageBody {
    /// `YYYY-MM-DD`; today when absent.
    fecha: Option<String>,
    horas_uso: f64,
}

#[derive(Serialize)]
pub struct DeviceJson {
    id: i64,
    nombre: String,
    potencia_watts: Option<f64>,
    categoria: &'static str,
    horas_uso_dia: f64,
    consumo_mensual_kwh: f64,
    costo_mensual_lps: f64,
}

impl From<DeviceSummary> for DeviceJson {
    fn from(s: DeviceSummary) -> Self {
        DeviceJson {
            id: s.device.id,
            nombre: s.device.name,
            potencia_watts: s.device.power_watts,
            categoria: s.device.category.label(),
            horas_uso_dia: s.device.daily_use_hours,
            consumo_mensual_kwh: s.monthly_energy_kwh,
            costo_mensual_lps: s.monthly_cost_lps,
        }
    }
}

#[derive(Serialize)]
pub struct ConsumptionJson {
    id: i64,
    fecha: String,
    horas_uso: f64,
    consumo_kwh: f64,
    costo_lps: f64,
}

impl From<ConsumptionEntry> for ConsumptionJson {
    fn from(e: ConsumptionEntry) -> Self {
        ConsumptionJson {
            id: e.id,
            fecha: e
                .date
                .format(DATE_FORMAT)
                .unwrap_or_else(|_| e.date.to_string()),
            horas_uso: e.hours_used,
            consumo_kwh: e.energy_kwh,
            costo_lps: e.cost_lps,
        }
    }
}

#[derive(Serialize)]
pub struct CreatedJson {
    mensaje: &'static str,
    dispositivo: DeviceJson,
}

#[derive(Serialize)]
pub struct MessageJson {
    mensaje: &'static str,
}

fn parse_category(label: &str) -> Result<DeviceCategory, ApiError> {
    label
        .parse()
        .map_err(|_| ApiError::bad_request(format!("categoría desconocida: {label}")))
}

fn parse_date(s: &str) -> Result<Date, ApiError> {
    Date::parse(s, DATE_FORMAT)
        .map_err(|_| ApiError::bad_request(format!("fecha inválida: {s}, se espera YYYY-MM-DD")))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<CreatedJson>), ApiError> {
    let user_id = authenticate(&state, &headers).await?;

    let input = CreateDevice {
        name: body.nombre,
        power_watts: body.potencia_watts,
        category: parse_category(&body.categoria)?,
        daily_use_hours: body.horas_uso_dia,
    };
    let summary = state.devices.create(user_id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedJson {
            mensaje: "Dispositivo registrado correctamente",
            dispositivo: summary.into(),
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<DeviceJson>>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;

    let summaries = state.devices.list(user_id).await?;
    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

pub async fn get_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<DeviceJson>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;

    let summary = state.devices.get(user_id, id).await?;
    Ok(Json(summary.into()))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<DeviceJson>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;

    let patch = DevicePatch {
        name: body.nombre,
        power_watts: body.potencia_watts,
        category: body.categoria.as_deref().map(parse_category).transpose()?,
        daily_use_hours: body.horas_uso_dia,
    };
    let summary = state.devices.update(user_id, id, patch).await?;
    Ok(Json(summary.into()))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<MessageJson>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;

    state.devices.delete(user_id, id).await?;
    Ok(Json(MessageJson {
        mensaje: "Dispositivo eliminado correctamente",
    }))
}

pub async fn log_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<LogUsageBody>,
) -> Result<(StatusCode, Json<ConsumptionJson>), ApiError> {
    let user_id = authenticate(&state, &headers).await?;

    let date = body.fecha.as_deref().map(parse_date).transpose()?;
    let entry = state
        .devices
        .log_usage(user_id, id, date, body.horas_uso)
        .await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn list_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ConsumptionJson>>, ApiError> {
    let user_id = authenticate(&state, &headers).await?;

    let entries = state.devices.list_usage(user_id, id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parsing_maps_unknown_to_bad_request() {
        assert!(parse_category("Electrónica").is_ok());
        assert!(parse_category("no-such-category").is_err());
    }

    #[test]
    fn date_parsing_expects_iso_dates() {
        assert_eq!(
            parse_date("2025-11-03").unwrap(),
            time::macros::date!(2025 - 11 - 03)
        );
        assert!(parse_date("03/11/2025").is_err());
    }
}
