pub mod manager;
pub mod models;
pub mod procedures;
pub mod rows;
pub mod sessions;
pub mod users;
