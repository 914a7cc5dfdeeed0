pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, routing::post, routing::put, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the full application router: public auth endpoints plus the
/// business API behind the access guard.
pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(api_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use handlers::public::auth;

    Router::new()
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/refresh", post(auth::refresh))
}

fn api_routes() -> Router {
    use handlers::protected::{
        batch, clients, dashboard, kardex, orders, projects, recipes, summaries, users,
    };

    Router::new()
        .route("/api/users/me", get(users::me))
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .route("/api/clientes", get(clients::get_clients).post(clients::post_clients))
        .route("/api/clientes/:id", get(clients::get_client_by_id))
        .route(
            "/api/recetas",
            get(recipes::get_recipes).post(recipes::create_recipe).put(recipes::update_recipe),
        )
        .route("/api/orders", get(orders::get_orders))
        .route("/api/orders/nuevo", post(orders::create_order))
        .route("/api/proyectos", get(projects::get_projects).post(projects::create_project))
        .route("/api/kardex", get(kardex::get_kardex).post(kardex::create_kardex))
        .route("/api/kardex/:id", put(kardex::update_kardex).delete(kardex::delete_kardex))
        .route("/api/batch", get(batch::get_batches))
        .route("/api/resumendiario", get(summaries::get_daily_summary))
        .route("/api/resumenventa", get(summaries::get_sales_summary))
        .route("/api/usuarios", get(users::manage_users))
        .route("/api/usuarios/create", post(users::create_user))
        .route("/api/usuarios/:usuario_id", put(users::update_user))
        .route("/api/usuarios/:usuario_id/password", put(users::change_password))
        // Every route above requires a live session
        .layer(axum::middleware::from_fn(middleware::auth::verify_access))
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::config()
        .server
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Concretera API",
            "version": version,
            "description": "REST backend for the concrete production plant",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/login, /api/refresh, /api/logout (public - token acquisition)",
                "dashboard": "/api/dashboard (protected)",
                "clientes": "/api/clientes[/:id] (protected)",
                "recetas": "/api/recetas (protected)",
                "orders": "/api/orders[/nuevo] (protected)",
                "proyectos": "/api/proyectos (protected)",
                "kardex": "/api/kardex[/:id] (protected)",
                "batch": "/api/batch (protected)",
                "resumen": "/api/resumendiario, /api/resumenventa (protected)",
                "usuarios": "/api/usuarios/* (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
