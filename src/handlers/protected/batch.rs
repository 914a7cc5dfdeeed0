//! Batch (plant batching record) routes.

use axum::extract::Query;
use serde_json::{Map, Value};

use crate::database::manager::DatabaseManager;
use crate::database::procedures::{fetch_op_procedure, OpParams};
use crate::error::ApiError;
use crate::middleware::ApiResponse;

/// GET /api/batch?op=N&p1=..&p5=.. -> usp_get_batch
pub async fn get_batches(
    Query(params): Query<OpParams>,
) -> Result<ApiResponse<Vec<Map<String, Value>>>, ApiError> {
    let op = params
        .op()
        .ok_or_else(|| ApiError::bad_request("Parámetro \"op\" requerido"))?;

    let pool = DatabaseManager::pool().await?;
    let data = fetch_op_procedure(&pool, "usp_get_batch", op, params.text_params()).await?;

    Ok(ApiResponse::success(data))
}
