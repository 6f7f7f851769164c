//! Core library for the restoran food-ordering client.
//!
//! The backend owns pricing, orders and authentication. This crate owns the
//! client side of the session contract:
//!
//! - `auth`: the `SessionStore` holding the bearer token, persisted across runs
//! - `guard`: the route table and the allow/redirect decision per navigation
//! - `api`: the `ApiClient` that attaches the token to every protected call
//! - `models`: menu, cart and order payloads
//! - `app`: view state and user notices built on the pieces above

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use app::{App, Notice, NoticeLevel};
pub use auth::SessionStore;
pub use config::Config;
pub use guard::{decide, Access, Decision, Route, RouteGuard};
