//! Dashboard KPI aggregation route.

use axum::extract::Query;
use serde_json::{Map, Value};

use crate::database::manager::DatabaseManager;
use crate::database::procedures::{fetch_op_procedure, OpParams};
use crate::error::ApiError;
use crate::middleware::ApiResponse;

/// GET /api/dashboard -> usp_get_dashboard
///
/// The op defaults to 1 (overall KPIs); other ops slice by period via p1..p5.
pub async fn get_dashboard(
    Query(params): Query<OpParams>,
) -> Result<ApiResponse<Vec<Map<String, Value>>>, ApiError> {
    let op = params.op().unwrap_or(1);

    let pool = DatabaseManager::pool().await?;
    let data = fetch_op_procedure(&pool, "usp_get_dashboard", op, params.text_params()).await?;

    Ok(ApiResponse::success(data))
}
