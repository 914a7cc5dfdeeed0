//! Stored-procedure passthrough plumbing.
//!
//! Most business routes forward an operation code plus up to five loosely
//! typed parameters straight into a set-returning function and relay whatever
//! rows come back. The procedures own validation and result shapes.

use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::PgPool;

use super::manager::DatabaseError;
use super::rows::rows_to_json;

/// Query-string parameters shared by the passthrough GET routes:
/// `?op=1&p1=...&p2=...` up to p5. All pN are forwarded as nullable text.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OpParams {
    pub op: Option<i32>,
    pub p1: Option<String>,
    pub p2: Option<String>,
    pub p3: Option<String>,
    pub p4: Option<String>,
    pub p5: Option<String>,
}

impl OpParams {
    /// The operation code, if present
    pub fn op(&self) -> Option<i32> {
        self.op
    }

    pub fn text_params(&self) -> [Option<&str>; 5] {
        [
            self.p1.as_deref(),
            self.p2.as_deref(),
            self.p3.as_deref(),
            self.p4.as_deref(),
            self.p5.as_deref(),
        ]
    }

    /// Like `text_params`, but absent values fall back to the given default.
    /// The kardex query route forwards "0" for anything the client omits.
    pub fn text_params_or<'a>(&'a self, default: &'a str) -> [Option<&'a str>; 5] {
        self.text_params().map(|p| Some(p.unwrap_or(default)))
    }
}

/// Execute `SELECT * FROM <procedure>(op, p1..p5)` with text parameters and
/// return the result set as JSON rows.
pub async fn fetch_op_procedure(
    pool: &PgPool,
    procedure: &str,
    op: i32,
    params: [Option<&str>; 5],
) -> Result<Vec<Map<String, Value>>, DatabaseError> {
    let sql = procedure_sql(procedure, 6);
    let rows = sqlx::query(&sql)
        .bind(op)
        .bind(params[0])
        .bind(params[1])
        .bind(params[2])
        .bind(params[3])
        .bind(params[4])
        .fetch_all(pool)
        .await?;

    Ok(rows_to_json(&rows))
}

/// Build the invocation SQL for a set-returning function with `arity`
/// positional parameters. Procedure names are static strings defined by this
/// crate; the assert guards against accidental interpolation of user input.
pub fn procedure_sql(procedure: &str, arity: usize) -> String {
    debug_assert!(
        procedure.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
        "procedure names must be static snake_case identifiers"
    );

    let placeholders: Vec<String> = (1..=arity).map(|n| format!("${}", n)).collect();
    format!("SELECT * FROM {}({})", procedure, placeholders.join(", "))
}
