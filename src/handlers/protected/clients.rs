//! Client (cliente) routes. Reads and writes both go through stored
//! procedures; the by-id lookup is the one direct query.

use axum::extract::{Path, Query};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::FromRow;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::procedures::{fetch_op_procedure, OpParams};
use crate::database::rows::rows_to_json;
use crate::error::ApiError;
use crate::middleware::{ApiMessage, ApiResponse};

/// GET /api/clientes?op=N&p1=..&p5=.. -> usp_get_clientes
pub async fn get_clients(
    Query(params): Query<OpParams>,
) -> Result<ApiResponse<Vec<Map<String, Value>>>, ApiError> {
    let op = params
        .op()
        .ok_or_else(|| ApiError::bad_request("Parámetro \"op\" requerido"))?;

    let pool = DatabaseManager::pool().await?;
    let data = fetch_op_procedure(&pool, "usp_get_clientes", op, params.text_params()).await?;

    Ok(ApiResponse::success(data))
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i32,
    pub rtn: String,
    pub nombre: String,
    pub contacto: Option<String>,
    pub telefono: Option<String>,
}

/// GET /api/clientes/:id
pub async fn get_client_by_id(Path(id): Path<i32>) -> Result<ApiResponse<Client>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let client = sqlx::query_as::<_, Client>(
        "SELECT id, rtn, nombre, contacto, telefono FROM clientes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| ApiError::not_found("Cliente no encontrado"))?;

    Ok(ApiResponse::success(client))
}

/// Body for POST /api/clientes. The op selects create (1), update (2) or
/// delete (3); business rules beyond the basic field checks live in the
/// procedure.
#[derive(Debug, Deserialize)]
pub struct ClientCommand {
    pub op: Option<i32>,
    pub rtn: Option<String>,
    pub nombre: Option<String>,
    pub contacto: Option<String>,
    pub telefono: Option<String>,
    pub id: Option<i32>,
}

/// POST /api/clientes -> usp_post_clientes
pub async fn post_clients(Json(body): Json<ClientCommand>) -> Result<ApiMessage, ApiError> {
    let op = body.op.ok_or_else(|| {
        ApiError::bad_request("Parámetro \"op\" requerido. Use: 1=Crear, 2=Actualizar, 3=Eliminar")
    })?;

    match op {
        1 => {
            if body.rtn.as_deref().unwrap_or("").is_empty()
                || body.nombre.as_deref().unwrap_or("").is_empty()
            {
                return Err(ApiError::bad_request(
                    "Para crear un cliente se requieren RTN y nombre",
                ));
            }
        }
        2 | 3 => {
            if body.id.is_none() {
                return Err(ApiError::bad_request(
                    "Para actualizar o eliminar se requiere el ID del cliente",
                ));
            }
        }
        _ => {
            return Err(ApiError::bad_request(
                "Operación no válida. Use: 1=Crear, 2=Actualizar, 3=Eliminar",
            ))
        }
    }

    let pool = DatabaseManager::pool().await?;

    let rows = sqlx::query("SELECT * FROM usp_post_clientes($1, $2, $3, $4, $5, $6)")
        .bind(op)
        .bind(body.rtn.as_deref())
        .bind(body.nombre.as_deref())
        .bind(body.contacto.as_deref())
        .bind(body.telefono.as_deref())
        .bind(body.id)
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::from)?;

    let rows = rows_to_json(&rows);

    // The procedure answers with a verdict row: resultado, mensaje, cliente_id
    let verdict = rows
        .first()
        .ok_or_else(|| ApiError::internal_server_error("Error al procesar la solicitud"))?;

    let resultado = verdict.get("resultado").and_then(Value::as_i64).unwrap_or(0);
    let mensaje = verdict
        .get("mensaje")
        .and_then(Value::as_str)
        .unwrap_or("Error al procesar la solicitud")
        .to_string();

    if resultado != 1 {
        return Err(ApiError::bad_request(mensaje));
    }

    match verdict.get("cliente_id").filter(|v| !v.is_null()) {
        Some(id) => Ok(ApiMessage::with_data(mensaje, json!({ "id": id }))),
        None => Ok(ApiMessage::new(mensaje)),
    }
}
