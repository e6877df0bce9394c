//! Film graph REST service.
//!
//! Exposes friendships and film likes over HTTP.
//!
//! ## Endpoints
//!
//! - `PUT /users/:id/friends/:friend_id` - Send a friend request
//! - `PUT /users/:id/friends/:friend_id/confirm` - Confirm a pending request
//! - `DELETE /users/:id/friends/:friend_id` - Remove a request or friendship
//! - `GET /users/:id/friends` - List confirmed friends
//! - `GET /users/:id/friends/common/:other_id` - List common friends
//! - `GET /users/:id/friends/requests` - List requests awaiting confirmation
//! - `PUT /films/:id/like/:user_id` - Like a film
//! - `DELETE /films/:id/like/:user_id` - Withdraw a like
//! - `GET /films/popular?count=N` - Most liked films
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, request_logging_middleware, REQUEST_ID_HEADER};
pub use routes::{create_router, ApiError, AppState, ErrorResponse};
pub use state::ServiceState;
