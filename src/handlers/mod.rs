pub mod guards;
pub mod health;
pub mod seed;
pub mod users;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))

        // Seeding endpoints, GET and POST alike
        .route("/seed", get(seed::seed).post(seed::seed))
        .route("/update-user", get(users::update_user).post(users::update_user))
}
