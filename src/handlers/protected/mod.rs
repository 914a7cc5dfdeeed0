pub mod batch;
pub mod clients;
pub mod dashboard;
pub mod kardex;
pub mod orders;
pub mod projects;
pub mod recipes;
pub mod summaries;
pub mod users;
