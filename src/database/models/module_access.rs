use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One entry of the user's menu: an active module the user may read,
/// built at login from the module/permission matrix.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModuleAccess {
    pub modulo_id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub ruta: Option<String>,
    pub icono: Option<String>,
    pub orden: i32,
    pub puede_leer: bool,
    pub puede_escribir: bool,
}
