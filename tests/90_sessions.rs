mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

// These flows need a live database; each test returns early when
// DATABASE_URL is not set. The schema is created on demand so the tests can
// run against an empty database.
async fn test_pool() -> Result<Option<PgPool>> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => return Ok(None),
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .context("connecting to DATABASE_URL")?;

    ensure_schema(&pool).await?;
    Ok(Some(pool))
}

// Concurrent CREATE TABLE IF NOT EXISTS can race in Postgres, so the DDL
// runs under a lock even though the tests themselves stay parallel
static SCHEMA_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

async fn ensure_schema(pool: &PgPool) -> Result<()> {
    let _guard = SCHEMA_LOCK.lock().await;
    let ddl = [
        "CREATE TABLE IF NOT EXISTS usuarios_app (
            usuario_id SERIAL PRIMARY KEY,
            nombre_usuario TEXT NOT NULL UNIQUE,
            nombre_completo TEXT NOT NULL,
            email TEXT NOT NULL,
            contrasena TEXT NOT NULL,
            activo BOOLEAN NOT NULL DEFAULT TRUE,
            telefono TEXT,
            puesto TEXT,
            fecha_creacion TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            fecha_modificacion TIMESTAMPTZ,
            ultimo_acceso TIMESTAMPTZ
        )",
        "CREATE TABLE IF NOT EXISTS user_sessions (
            user_id INT NOT NULL,
            refresh_token TEXT NOT NULL,
            session_id UUID NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
        "CREATE TABLE IF NOT EXISTS modulos (
            modulo_id SERIAL PRIMARY KEY,
            nombre_modulo TEXT NOT NULL,
            descripcion TEXT,
            ruta TEXT,
            icono TEXT,
            orden INT NOT NULL DEFAULT 0,
            activo BOOLEAN NOT NULL DEFAULT TRUE
        )",
        "CREATE TABLE IF NOT EXISTS permisos (
            usuario_id INT NOT NULL,
            modulo_id INT NOT NULL,
            puede_leer BOOLEAN NOT NULL DEFAULT FALSE,
            puede_escribir BOOLEAN NOT NULL DEFAULT FALSE
        )",
    ];
    for statement in ddl {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

// Recreate the user from scratch so reruns start clean. Cost 4 is the bcrypt
// minimum; login only verifies the hash.
async fn seed_user(pool: &PgPool, username: &str, password: &str) -> Result<i32> {
    let hash = concretera_api::auth::password::hash_password(password, 4).await?;

    sqlx::query(
        "DELETE FROM user_sessions WHERE user_id IN \
         (SELECT usuario_id FROM usuarios_app WHERE nombre_usuario = $1)",
    )
    .bind(username)
    .execute(pool)
    .await?;
    sqlx::query("DELETE FROM usuarios_app WHERE nombre_usuario = $1")
        .bind(username)
        .execute(pool)
        .await?;

    let (usuario_id,): (i32,) = sqlx::query_as(
        "INSERT INTO usuarios_app (nombre_usuario, nombre_completo, email, contrasena, activo) \
         VALUES ($1, $2, $3, $4, TRUE) \
         RETURNING usuario_id",
    )
    .bind(username)
    .bind(format!("Usuario {}", username))
    .bind(format!("{}@planta.test", username))
    .bind(&hash)
    .fetch_one(pool)
    .await?;

    Ok(usuario_id)
}

async fn login(base_url: &str, username: &str, password: &str) -> Result<Value> {
    let res = reqwest::Client::new()
        .post(format!("{}/api/login", base_url))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
    Ok(res.json().await?)
}

async fn get_me(base_url: &str, access: &str) -> Result<reqwest::Response> {
    Ok(reqwest::Client::new()
        .get(format!("{}/api/users/me", base_url))
        .header("Authorization", format!("Bearer {}", access))
        .send()
        .await?)
}

#[tokio::test]
async fn second_login_invalidates_previous_session() -> Result<()> {
    let Some(pool) = test_pool().await? else { return Ok(()) };
    let server = common::ensure_server().await?;

    seed_user(&pool, "sesion_unica", "clave-123").await?;

    let first = login(&server.base_url, "sesion_unica", "clave-123").await?;
    let first_access = first["data"]["tokens"]["access"]
        .as_str()
        .context("first login missing access token")?
        .to_string();

    // The first session is live
    let res = get_me(&server.base_url, &first_access).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let second = login(&server.base_url, "sesion_unica", "clave-123").await?;
    let second_access = second["data"]["tokens"]["access"]
        .as_str()
        .context("second login missing access token")?
        .to_string();

    // The second login replaced the session row, so the first token is now
    // well-signed but revoked
    let res = get_me(&server.base_url, &first_access).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "SESSION_INVALIDATED");

    let res = get_me(&server.base_url, &second_access).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["nombre_usuario"], "sesion_unica");

    Ok(())
}

#[tokio::test]
async fn refresh_issues_working_access_token() -> Result<()> {
    let Some(pool) = test_pool().await? else { return Ok(()) };
    let server = common::ensure_server().await?;

    seed_user(&pool, "refresca", "clave-123").await?;

    let payload = login(&server.base_url, "refresca", "clave-123").await?;
    let tokens = &payload["data"]["tokens"];

    let res = reqwest::Client::new()
        .post(format!("{}/api/refresh", server.base_url))
        .json(&json!({
            "refresh": tokens["refresh"],
            "sessionId": tokens["sessionId"],
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    let access = body["data"]["access"]
        .as_str()
        .context("refresh response missing access token")?;

    let res = get_me(&server.base_url, access).await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn deactivated_user_is_rejected_mid_session() -> Result<()> {
    let Some(pool) = test_pool().await? else { return Ok(()) };
    let server = common::ensure_server().await?;

    let usuario_id = seed_user(&pool, "desactivado", "clave-123").await?;

    let payload = login(&server.base_url, "desactivado", "clave-123").await?;
    let access = payload["data"]["tokens"]["access"]
        .as_str()
        .context("missing access token")?
        .to_string();

    sqlx::query("UPDATE usuarios_app SET activo = FALSE WHERE usuario_id = $1")
        .bind(usuario_id)
        .execute(&pool)
        .await?;

    // The session row still exists, but the guard checks the user flag too
    let res = get_me(&server.base_url, &access).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "USER_INACTIVE");

    Ok(())
}

#[tokio::test]
async fn logout_revokes_refresh_and_access() -> Result<()> {
    let Some(pool) = test_pool().await? else { return Ok(()) };
    let server = common::ensure_server().await?;

    seed_user(&pool, "cierra_sesion", "clave-123").await?;

    let payload = login(&server.base_url, "cierra_sesion", "clave-123").await?;
    let tokens = payload["data"]["tokens"].clone();
    let access = tokens["access"].as_str().context("missing access token")?.to_string();

    let res = reqwest::Client::new()
        .post(format!("{}/api/logout", server.base_url))
        .json(&json!({ "sessionId": tokens["sessionId"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Both halves of the pair are dead once the session row is gone
    let res = reqwest::Client::new()
        .post(format!("{}/api/refresh", server.base_url))
        .json(&json!({ "refresh": tokens["refresh"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = get_me(&server.base_url, &access).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "SESSION_INVALIDATED");

    Ok(())
}
