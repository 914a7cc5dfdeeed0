//! Production order routes.

use axum::extract::Query;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::procedures::{fetch_op_procedure, OpParams};
use crate::database::rows::rows_to_json;
use crate::error::ApiError;
use crate::middleware::{ApiMessage, ApiResponse};

/// GET /api/orders?op=N&p1=..&p5=.. -> usp_get_orders
pub async fn get_orders(
    Query(params): Query<OpParams>,
) -> Result<ApiResponse<Vec<Map<String, Value>>>, ApiError> {
    let op = params
        .op()
        .ok_or_else(|| ApiError::bad_request("Parámetro \"op\" requerido"))?;

    let pool = DatabaseManager::pool().await?;
    let data = fetch_op_procedure(&pool, "usp_get_orders", op, params.text_params()).await?;

    Ok(ApiResponse::success(data))
}

/// Every field is optional at the serde level so an incomplete body gets the
/// API's own 400 message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct NewOrder {
    #[serde(rename = "clienteId")]
    pub cliente_id: Option<i32>,
    #[serde(rename = "IdProyecto")]
    pub id_proyecto: Option<i32>,
    pub volumen: Option<Decimal>,
    #[serde(rename = "IdReceta")]
    pub id_receta: Option<i32>,
    #[serde(rename = "IdUsuario")]
    pub id_usuario: Option<i32>,
    /// Must be 0 or 1; the frontend sends the flag as a number
    #[serde(rename = "ProyectoGrande")]
    pub proyecto_grande: Option<i32>,
}

/// POST /api/orders/nuevo -> usp_post_orders
pub async fn create_order(Json(body): Json<NewOrder>) -> Result<ApiMessage, ApiError> {
    let (cliente_id, id_proyecto, volumen, id_usuario, proyecto_grande) = match (
        body.cliente_id,
        body.id_proyecto,
        body.volumen,
        body.id_usuario,
        body.proyecto_grande,
    ) {
        (Some(c), Some(p), Some(v), Some(u), Some(g @ (0 | 1))) => (c, p, v, u, g),
        _ => {
            return Err(ApiError::bad_request(
                "Faltan datos obligatorios o ProyectoGrande inválido: clienteId, IdProyecto, volumen, IdUsuario, ProyectoGrande",
            ))
        }
    };

    let pool = DatabaseManager::pool().await?;

    let rows = sqlx::query("SELECT * FROM usp_post_orders($1, $2, $3, $4, $5, $6)")
        .bind(cliente_id)
        .bind(id_proyecto)
        .bind(volumen)
        .bind(body.id_receta)
        .bind(id_usuario)
        .bind(proyecto_grande == 1)
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::from)?;

    let rows = rows_to_json(&rows);

    // Verdict row: success, message, order_id, order_number, fecha_local
    let verdict = rows
        .first()
        .ok_or_else(|| ApiError::bad_request("Error al crear orden"))?;

    let success = verdict.get("success").and_then(Value::as_i64).unwrap_or(0);
    let message = verdict
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Error al crear orden")
        .to_string();

    if success == 0 {
        return Err(ApiError::bad_request(message));
    }

    Ok(ApiMessage::with_data(
        message,
        json!({
            "orderId": verdict.get("order_id").cloned().unwrap_or(Value::Null),
            "orderNumber": verdict.get("order_number").cloned().unwrap_or(Value::Null),
            "fecha": verdict.get("fecha_local").cloned().unwrap_or(Value::Null),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_parses_frontend_field_names() {
        let body: NewOrder = serde_json::from_str(
            r#"{"clienteId": 7, "IdProyecto": 3, "volumen": "12.50", "IdUsuario": 1, "ProyectoGrande": 1}"#,
        )
        .unwrap();
        assert_eq!(body.cliente_id, Some(7));
        assert_eq!(body.id_proyecto, Some(3));
        assert_eq!(body.volumen.unwrap().to_string(), "12.50");
        assert_eq!(body.id_receta, None);
        assert_eq!(body.proyecto_grande, Some(1));
    }

    // Missing fields must answer the API's 400, not a deserialization
    // rejection; validation runs before the pool is touched
    #[tokio::test]
    async fn create_order_rejects_missing_fields_with_400() {
        let body: NewOrder = serde_json::from_str(r#"{"IdProyecto": 3}"#).unwrap();
        let err = create_order(Json(body)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().starts_with("Faltan datos obligatorios"));
    }

    #[tokio::test]
    async fn create_order_rejects_out_of_range_proyecto_grande() {
        let body: NewOrder = serde_json::from_str(
            r#"{"clienteId": 7, "IdProyecto": 3, "volumen": "12.50", "IdUsuario": 1, "ProyectoGrande": 5}"#,
        )
        .unwrap();
        let err = create_order(Json(body)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
