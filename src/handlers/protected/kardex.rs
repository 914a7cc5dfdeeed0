//! Kardex (inventory movement) routes. Queries and inserts go through
//! stored procedures; update and delete touch the table directly after an
//! existence check.

use axum::extract::{Path, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::procedures::{fetch_op_procedure, OpParams};
use crate::database::rows::rows_to_json;
use crate::error::ApiError;
use crate::middleware::{ApiMessage, ApiResponse};

/// GET /api/kardex -> usp_get_kardex_movimientos
///
/// Unlike the other passthroughs this one tolerates a missing op (defaults
/// to 1) and forwards "0" for any absent parameter.
pub async fn get_kardex(
    Query(params): Query<OpParams>,
) -> Result<ApiResponse<Vec<Map<String, Value>>>, ApiError> {
    let op = params.op().unwrap_or(1);

    let pool = DatabaseManager::pool().await?;
    let data = fetch_op_procedure(
        &pool,
        "usp_get_kardex_movimientos",
        op,
        params.text_params_or("0"),
    )
    .await?;

    tracing::debug!(rows = data.len(), "kardex query");
    Ok(ApiResponse::success(data))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewKardexEntry {
    pub kardex_in: Option<f64>,
    pub remision_in: Option<String>,
    pub cisterna_in: Option<String>,
}

/// POST /api/kardex -> usp_insert_kardex_movimiento (inbound movement)
pub async fn create_kardex(Json(body): Json<NewKardexEntry>) -> Result<ApiMessage, ApiError> {
    let kardex_in = match body.kardex_in {
        Some(v) if v > 0.0 => v,
        _ => {
            return Err(ApiError::bad_request(
                "El Kardex IN es obligatorio y debe ser mayor a 0",
            ))
        }
    };

    let pool = DatabaseManager::pool().await?;

    let rows = sqlx::query("SELECT * FROM usp_insert_kardex_movimiento($1, $2, $3)")
        .bind(kardex_in)
        .bind(body.remision_in.as_deref())
        .bind(body.cisterna_in.as_deref())
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::from)?;

    let data = rows_to_json(&rows).into_iter().next().map(Value::Object);

    match data {
        Some(row) => Ok(ApiMessage::with_data("Kardex registrado correctamente", row)),
        None => Ok(ApiMessage::new("Kardex registrado correctamente")),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KardexUpdate {
    pub kardex_in: Option<f64>,
    pub remision_in: Option<String>,
    pub cisterna_in: Option<String>,
    pub produccion_out: Option<f64>,
}

async fn kardex_exists(pool: &sqlx::PgPool, id: i32) -> Result<bool, DatabaseError> {
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM kardex_movimientos WHERE id_kardex = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(exists.0)
}

/// PUT /api/kardex/:id
pub async fn update_kardex(
    Path(id): Path<i32>,
    Json(body): Json<KardexUpdate>,
) -> Result<ApiMessage, ApiError> {
    let pool = DatabaseManager::pool().await?;

    if !kardex_exists(&pool, id).await? {
        return Err(ApiError::not_found("Registro de kardex no encontrado"));
    }

    sqlx::query(
        "UPDATE kardex_movimientos \
         SET kardex_in = $2, remision_in = $3, cisterna_in = $4, produccion_out = $5 \
         WHERE id_kardex = $1",
    )
    .bind(id)
    .bind(body.kardex_in.unwrap_or(0.0))
    .bind(body.remision_in.as_deref())
    .bind(body.cisterna_in.as_deref())
    .bind(body.produccion_out.unwrap_or(0.0))
    .execute(&pool)
    .await
    .map_err(DatabaseError::from)?;

    tracing::info!(id, "kardex updated");
    Ok(ApiMessage::new("Kardex actualizado exitosamente"))
}

/// DELETE /api/kardex/:id
pub async fn delete_kardex(Path(id): Path<i32>) -> Result<ApiMessage, ApiError> {
    let pool = DatabaseManager::pool().await?;

    if !kardex_exists(&pool, id).await? {
        return Err(ApiError::not_found("Registro de kardex no encontrado"));
    }

    sqlx::query("DELETE FROM kardex_movimientos WHERE id_kardex = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(DatabaseError::from)?;

    tracing::info!(id, "kardex deleted");
    Ok(ApiMessage::new("Kardex eliminado exitosamente"))
}
