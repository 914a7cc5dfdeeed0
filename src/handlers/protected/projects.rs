//! Project (proyecto) routes.

use axum::extract::Query;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::procedures::{fetch_op_procedure, OpParams};
use crate::database::rows::rows_to_json;
use crate::error::ApiError;
use crate::middleware::{ApiMessage, ApiResponse};

/// GET /api/proyectos?op=N&p1=..&p5=.. -> usp_get_proyectos
pub async fn get_projects(
    Query(params): Query<OpParams>,
) -> Result<ApiResponse<Vec<Map<String, Value>>>, ApiError> {
    let op = params
        .op()
        .ok_or_else(|| ApiError::bad_request("Parámetro \"op\" requerido"))?;

    let pool = DatabaseManager::pool().await?;
    let data = fetch_op_procedure(&pool, "usp_get_proyectos", op, params.text_params()).await?;

    Ok(ApiResponse::success(data))
}

/// Required fields are optional at the serde level so an incomplete body
/// gets the API's own 400 message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub op: Option<i32>,
    pub cliente_id: Option<i32>,
    pub receta_id: Option<i32>,
    pub nombre: Option<String>,
    pub ubicacion: Option<String>,
    pub activo: Option<bool>,
    pub proyecto_grande_number: Option<bool>,
    pub volumen: Option<Decimal>,
    pub usuario_id: Option<i32>,
}

/// POST /api/proyectos -> usp_post_proyectos
pub async fn create_project(Json(body): Json<NewProject>) -> Result<ApiMessage, ApiError> {
    let nombre = body.nombre.as_deref().unwrap_or("");
    let ubicacion = body.ubicacion.as_deref().unwrap_or("");

    let (cliente_id, receta_id, volumen) =
        match (body.cliente_id, body.receta_id, body.volumen) {
            (Some(c), Some(r), Some(v)) if !nombre.is_empty() && !ubicacion.is_empty() => {
                (c, r, v)
            }
            _ => return Err(ApiError::bad_request("Datos incompletos para crear proyecto")),
        };

    let pool = DatabaseManager::pool().await?;

    let rows = sqlx::query("SELECT * FROM usp_post_proyectos($1, $2, $3, $4, $5, $6, $7, $8, $9)")
        .bind(body.op.unwrap_or(1))
        .bind(cliente_id)
        .bind(receta_id)
        .bind(nombre)
        .bind(ubicacion)
        .bind(body.activo.unwrap_or(false))
        .bind(body.proyecto_grande_number.unwrap_or(false))
        .bind(volumen)
        .bind(body.usuario_id)
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::from)?;

    let data = rows_to_json(&rows).into_iter().map(Value::Object).collect();

    Ok(ApiMessage::with_data(
        "Proyecto agregado correctamente",
        Value::Array(data),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_project_requires_core_fields() {
        let body: NewProject = serde_json::from_str(
            r#"{"clienteId": 1, "recetaId": 2, "nombre": "Puente Sur", "ubicacion": "Km 14", "volumen": 80}"#,
        )
        .unwrap();
        assert_eq!(body.op, None);
        assert_eq!(body.cliente_id, Some(1));
        assert_eq!(body.activo, None);
        assert_eq!(body.volumen.unwrap().to_string(), "80");
    }

    // Missing fields must answer the API's 400, not a deserialization
    // rejection; validation runs before the pool is touched
    #[tokio::test]
    async fn create_project_rejects_incomplete_body_with_400() {
        let body: NewProject =
            serde_json::from_str(r#"{"clienteId": 1, "nombre": "Puente Sur"}"#).unwrap();
        let err = create_project(Json(body)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Datos incompletos para crear proyecto");
    }

    #[tokio::test]
    async fn create_project_rejects_blank_nombre() {
        let body: NewProject = serde_json::from_str(
            r#"{"clienteId": 1, "recetaId": 2, "nombre": "", "ubicacion": "Km 14", "volumen": 80}"#,
        )
        .unwrap();
        let err = create_project(Json(body)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
