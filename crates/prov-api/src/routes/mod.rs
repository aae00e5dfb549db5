//! Route modules, one per domain. Each builds a `Router<AppState>`
//! merged into the application in `lib.rs`.

pub mod companies;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod users;
pub mod verify;
