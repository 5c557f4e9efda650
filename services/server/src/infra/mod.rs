pub mod arango;
pub mod backend;
pub mod graph;
pub mod http;
pub mod rate_limit;
pub mod repository;
pub mod retry;
