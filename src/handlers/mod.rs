// HTTP handlers and route builders
// Authentication is opt-in per handler through the AuthenticatedUser
// extractor; storefront-facing handlers simply don't take it.

pub mod admins;
pub mod company;
pub mod orders;
pub mod users;

use crate::app::AppState;
use axum::{
    routing::{get, post},
    Router,
};

// Tenant settings and storefront routes
pub fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/company", get(company::view).put(company::update))
        .route("/company/current", get(company::current))
        .route("/company/questions", get(company::questions))
        .route("/company/feedback", post(company::send_feedback))
}

// Campaigns and the order lifecycle
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns", get(orders::get_campaigns))
        .route("/campaigns/{id}", get(orders::get_campaign))
        .route("/orders", get(orders::list))
        .route("/orders/verify", post(orders::verify_order))
        .route("/orders/tasks", get(orders::tasks))
        .route("/orders/send-verification", post(orders::send_verification))
        .route("/orders/campaign/{campaign_id}", get(orders::get_by_campaign))
        .route("/orders/{order_id}", get(orders::show))
        .route("/orders/{order_id}/feedback", post(orders::post_feedback))
        .route("/orders/{order_id}/review", post(orders::post_review))
        .route("/orders/{order_id}/payout", post(orders::send_payout))
        .route(
            "/orders/{order_id}/eligible",
            get(orders::eligible_to_post_review),
        )
}

// Customer directory (tenant scope)
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/register", post(users::register))
        .route("/users/current", get(users::current))
        .route("/users/link-amazon", post(users::link_amazon))
        .route(
            "/users/{id}",
            get(users::view).put(users::update).delete(users::delete),
        )
        .route("/users/{id}/ban", post(users::ban))
        .route("/users/{id}/approve", post(users::approve))
        .route("/users/{id}/reset-password", post(users::reset_password))
}

// Platform admin directory
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admins", get(admins::list).post(admins::create))
        .route(
            "/admins/{id}",
            get(admins::view).put(admins::update).delete(admins::delete),
        )
        .route("/admins/{id}/reset-password", post(admins::reset_password))
}
