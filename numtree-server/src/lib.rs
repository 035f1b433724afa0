//! numtree-server: HTTP API for derived-value reply trees
//!
//! Users sign up, open cookie sessions, post numbers and reply to posts
//! with an arithmetic operation. Storage is PostgreSQL via sqlx.

pub mod auth;
pub mod db;
pub mod http;
pub mod models;

pub use db::{create_pool, create_pool_with_options};
pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};
