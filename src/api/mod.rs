pub mod handlers;
pub mod models;
pub mod rate_limit;
pub mod routes;

pub use handlers::AppState;
pub use rate_limit::ClientRateLimiter;
pub use routes::create_router;
