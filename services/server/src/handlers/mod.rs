pub mod dashboard;
pub mod extract;
pub mod user;
