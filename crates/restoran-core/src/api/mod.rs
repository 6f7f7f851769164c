//! REST client module for the restoran backend.
//!
//! This module provides the `ApiClient` for logging in and for the
//! protected cart, menu and order endpoints.
//!
//! Protected calls carry `Authorization: Bearer <token>`, with the token read
//! from the `SessionStore` each time a call is made.

pub mod client;
pub mod error;
pub mod queue;

pub use client::{ApiClient, AuthFailurePolicy, AuthorizedRequest, ClientOptions, LoginResponse};
pub use error::ApiError;
pub use queue::CartMutationQueue;
