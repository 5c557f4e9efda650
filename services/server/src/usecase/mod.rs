pub mod password;
pub mod rehash;
pub mod session;
pub mod user;
