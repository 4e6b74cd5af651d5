//! HTTP layer: Axum router, handlers, and request/response shapes.
//!
//! Exposes the user and exercise endpoints under `/api/users`, the landing
//! page at `/`, and static assets from the public directory.

mod error;
mod extract;
mod handlers;
mod requests;
mod responses;
mod state;


pub use handlers::router;
pub use state::AppState;
