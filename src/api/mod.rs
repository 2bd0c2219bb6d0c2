//! API layer - HTTP endpoints and middleware

pub mod analytics;
pub mod cache;
pub mod chat;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;

pub use router::create_router;
pub use state::AppState;
