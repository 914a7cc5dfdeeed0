pub mod module_access;
pub mod session;
pub mod user;

pub use module_access::ModuleAccess;
pub use session::SessionWithUser;
pub use user::{AppUser, UserProfile};
