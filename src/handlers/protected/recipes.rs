//! Concrete recipe (receta) routes. Both writes funnel into
//! usp_post_recetas, which takes ten loosely typed parameters; the op
//! selects insert (1) or update (2).

use axum::extract::Query;
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::procedures::{fetch_op_procedure, OpParams};
use crate::database::rows::rows_to_json;
use crate::error::ApiError;
use crate::middleware::{ApiMessage, ApiResponse};

/// GET /api/recetas?op=N&p1=..&p5=.. -> usp_get_recetas
pub async fn get_recipes(
    Query(params): Query<OpParams>,
) -> Result<ApiResponse<Vec<Map<String, Value>>>, ApiError> {
    let op = params
        .op()
        .ok_or_else(|| ApiError::bad_request("Parámetro \"op\" requerido"))?;

    let pool = DatabaseManager::pool().await?;
    let data = fetch_op_procedure(&pool, "usp_get_recetas", op, params.text_params()).await?;

    Ok(ApiResponse::success(data))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecipe {
    pub codigo: String,
    pub cemento: Option<f64>,
    pub agua: Option<f64>,
    pub resistencia: Option<f64>,
    pub arena: Option<f64>,
    pub grava_tipo1: Option<f64>,
    pub grava_tipo2: Option<f64>,
    pub aditivo1: Option<f64>,
    pub aditivo2: Option<f64>,
    pub estado: Option<bool>,
}

fn quantity(v: Option<f64>) -> String {
    v.unwrap_or(0.0).to_string()
}

/// POST /api/recetas -> usp_post_recetas op 1
pub async fn create_recipe(Json(body): Json<NewRecipe>) -> Result<ApiMessage, ApiError> {
    let codigo = body.codigo.trim();
    if codigo.is_empty() {
        return Err(ApiError::bad_request("El código de receta es obligatorio"));
    }

    let pool = DatabaseManager::pool().await?;

    let rows = sqlx::query(
        "SELECT * FROM usp_post_recetas($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(1_i32)
    .bind(codigo)
    .bind(quantity(body.cemento))
    .bind(quantity(body.agua))
    .bind(quantity(body.resistencia))
    .bind(quantity(body.arena))
    .bind(quantity(body.grava_tipo1))
    .bind(quantity(body.grava_tipo2))
    .bind(quantity(body.aditivo1))
    .bind(quantity(body.aditivo2))
    .bind(if body.estado.unwrap_or(false) { "1" } else { "0" })
    .fetch_all(&pool)
    .await
    .map_err(DatabaseError::from)?;

    let data = rows_to_json(&rows).into_iter().next().map(Value::Object);

    match data {
        Some(row) => Ok(ApiMessage::with_data("Receta creada exitosamente", row)),
        None => Ok(ApiMessage::new("Receta creada exitosamente")),
    }
}

#[derive(Debug, Deserialize)]
pub struct RecipeStateUpdate {
    pub id: i32,
    #[serde(rename = "Estado")]
    pub estado: bool,
}

/// PUT /api/recetas -> usp_post_recetas op 2 (activate/deactivate)
pub async fn update_recipe(Json(body): Json<RecipeStateUpdate>) -> Result<ApiMessage, ApiError> {
    let pool = DatabaseManager::pool().await?;

    sqlx::query("SELECT * FROM usp_post_recetas($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)")
        .bind(2_i32)
        .bind(body.id.to_string())
        .bind(if body.estado { "1" } else { "0" })
        .bind(Option::<&str>::None)
        .bind(Option::<&str>::None)
        .bind(Option::<&str>::None)
        .bind(Option::<&str>::None)
        .bind(Option::<&str>::None)
        .bind(Option::<&str>::None)
        .bind(Option::<&str>::None)
        .bind(Option::<&str>::None)
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::from)?;

    Ok(ApiMessage::new("Receta actualizada exitosamente"))
}
