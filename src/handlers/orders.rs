// Order lifecycle and campaign handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Host;
use serde_json::json;
use validator::Validate;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::order::{
        Order, PostFeedbackRequest, PostReviewRequest, SendPayoutRequest, TaskListParams,
        VerifyOrderRequest,
    },
    models::user::User,
    services::convomat::Good,
    services::order::OrderService,
    services::tenant::identify_tenant,
    utils::service_error::{pool_error, ServiceError},
};

/// A good stays listed unless its brand appears in the tenant's exclusion
/// list (case-insensitive; an exclusion entry containing the brand counts).
fn brand_excluded(excludes: &[String], brand: &str) -> bool {
    let brand = brand.to_lowercase();
    excludes
        .iter()
        .any(|exclude| exclude.to_lowercase().contains(&brand))
}

fn apply_brand_excludes(goods: Vec<Good>, excludes: &[String]) -> Vec<Good> {
    if excludes.is_empty() {
        return goods;
    }

    goods
        .into_iter()
        .filter(|good| {
            match good
                .asin_data
                .as_ref()
                .and_then(|data| data.brand.as_deref())
            {
                Some(brand) if !brand.is_empty() => !brand_excluded(excludes, brand),
                _ => true,
            }
        })
        .collect()
}

/// Fetch one campaign descriptor from the gateway
/// GET /api/v1/campaigns/:id
#[utoipa::path(
    get,
    path = "/v1/campaigns/{id}",
    tag = "Orders",
    operation_id = "getCampaign",
    params(("id" = i64, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Campaign descriptor"),
        (status = 502, description = "Gateway failure")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<i64>,
) -> impl IntoResponse {
    match state.convomat.get_campaign(campaign_id).await {
        Ok(campaign) => Json(json!({ "item": campaign })).into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Campaign listing for the storefront, with tenant brand exclusions
/// GET /api/v1/campaigns
#[utoipa::path(
    get,
    path = "/v1/campaigns",
    tag = "Orders",
    operation_id = "getCampaigns",
    responses(
        (status = 200, description = "Giveaway campaigns visible to this tenant"),
        (status = 404, description = "Unknown domain"),
        (status = 502, description = "Gateway failure")
    )
)]
pub async fn get_campaigns(State(state): State<AppState>, Host(host): Host) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let company = match identify_tenant(&mut conn, &host).await {
        Ok(company) => company,
        Err(e) => return e.into_response(),
    };

    let goods = match state
        .convomat
        .get_campaigns(&company.api_mode, "giveaway", company.campaign_display_limit())
        .await
    {
        Ok(goods) => goods,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let items = apply_brand_excludes(goods, &company.excluded_brands());

    Json(json!({ "items": items })).into_response()
}

/// Verify an order against the gateway and upsert it locally
/// POST /api/v1/orders/verify
#[utoipa::path(
    post,
    path = "/v1/orders/verify",
    tag = "Orders",
    operation_id = "verifyOrder",
    request_body = VerifyOrderRequest,
    responses(
        (status = 200, description = "Verified order"),
        (status = 400, description = "Gateway rejected the order"),
        (status = 404, description = "Unknown domain or customer")
    ),
    security(("bearerAuth" = []))
)]
pub async fn verify_order(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Host(host): Host,
    Json(request): Json<VerifyOrderRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let company = match identify_tenant(&mut conn, &host).await {
        Ok(company) => company,
        Err(e) => return e.into_response(),
    };

    let customer = match User::find_by_id(&mut conn, auth_user.user_id).await {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let service = OrderService::new(&state);
    match service
        .verify_order(&mut conn, &company, &customer, request)
        .await
    {
        Ok(order) => Json(json!({ "item": order })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Every order of the calling customer
/// GET /api/v1/orders/tasks
#[utoipa::path(
    get,
    path = "/v1/orders/tasks",
    tag = "Orders",
    operation_id = "listTasks",
    params(("sort" = Option<String>, Query, description = "\"asc\" for oldest first")),
    responses((status = 200, description = "All orders of the customer")),
    security(("bearerAuth" = []))
)]
pub async fn tasks(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(params): Query<TaskListParams>,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let ascending = params.sort.as_deref() == Some("asc");

    match Order::all_for_user(&mut conn, auth_user.user_id, ascending).await {
        Ok(orders) => Json(json!({ "items": orders })).into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Open (not reviewed, not terminal) orders of the calling customer
/// GET /api/v1/orders
#[utoipa::path(
    get,
    path = "/v1/orders",
    tag = "Orders",
    operation_id = "listOpenOrders",
    responses((status = 200, description = "Open orders of the customer")),
    security(("bearerAuth" = []))
)]
pub async fn list(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    match Order::open_for_user(&mut conn, auth_user.user_id).await {
        Ok(orders) => Json(json!({ "items": orders })).into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Open order for one campaign; `item` is null when there is none
/// GET /api/v1/orders/campaign/:campaign_id
#[utoipa::path(
    get,
    path = "/v1/orders/campaign/{campaign_id}",
    tag = "Orders",
    operation_id = "getOrderByCampaign",
    params(("campaign_id" = i64, Path, description = "Campaign ID")),
    responses((status = 200, description = "Open order for the campaign, or null")),
    security(("bearerAuth" = []))
)]
pub async fn get_by_campaign(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(campaign_id): Path<i64>,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    match Order::open_for_campaign(&mut conn, auth_user.user_id, campaign_id).await {
        Ok(order) => Json(json!({ "item": order })).into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Open order by its external id
/// GET /api/v1/orders/:order_id
#[utoipa::path(
    get,
    path = "/v1/orders/{order_id}",
    tag = "Orders",
    operation_id = "showOrder",
    params(("order_id" = String, Path, description = "External order ID")),
    responses(
        (status = 200, description = "Open order"),
        (status = 404, description = "No open order with this id")
    ),
    security(("bearerAuth" = []))
)]
pub async fn show(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(order_id): Path<String>,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    match Order::find_open(&mut conn, &order_id, auth_user.user_id).await {
        Ok(order) => Json(json!({ "item": order })).into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Trigger the gateway's email-ownership verification for the customer
/// POST /api/v1/orders/send-verification
#[utoipa::path(
    post,
    path = "/v1/orders/send-verification",
    tag = "Orders",
    operation_id = "sendVerification",
    responses(
        (status = 204, description = "Verification triggered"),
        (status = 502, description = "Gateway failure")
    ),
    security(("bearerAuth" = []))
)]
pub async fn send_verification(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let customer = match User::find_by_id(&mut conn, auth_user.user_id).await {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    match state.convomat.get_email_verification(&customer.email).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Submit feedback (tags + rating) on an open order
/// POST /api/v1/orders/:order_id/feedback
#[utoipa::path(
    post,
    path = "/v1/orders/{order_id}/feedback",
    tag = "Orders",
    operation_id = "postFeedback",
    params(("order_id" = String, Path, description = "External order ID")),
    request_body = PostFeedbackRequest,
    responses(
        (status = 200, description = "Order after feedback"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "No open order with this id")
    ),
    security(("bearerAuth" = []))
)]
pub async fn post_feedback(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(order_id): Path<String>,
    Json(request): Json<PostFeedbackRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let customer = match User::find_by_id(&mut conn, auth_user.user_id).await {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let service = OrderService::new(&state);
    match service
        .submit_feedback(&mut conn, &customer, &order_id, request)
        .await
    {
        Ok(order) => Json(json!({ "item": order })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Post the full review for an open order
/// POST /api/v1/orders/:order_id/review
#[utoipa::path(
    post,
    path = "/v1/orders/{order_id}/review",
    tag = "Orders",
    operation_id = "postReview",
    params(("order_id" = String, Path, description = "External order ID")),
    request_body = PostReviewRequest,
    responses(
        (status = 200, description = "Order after review"),
        (status = 400, description = "Profile URL did not resolve"),
        (status = 404, description = "No reviewable order with this id")
    ),
    security(("bearerAuth" = []))
)]
pub async fn post_review(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(order_id): Path<String>,
    Json(request): Json<PostReviewRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let customer = match User::find_by_id(&mut conn, auth_user.user_id).await {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let service = OrderService::new(&state);
    match service
        .post_review(&mut conn, &customer, &order_id, request)
        .await
    {
        Ok(order) => Json(json!({ "item": order })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Dispatch the payout for a shipped order
/// POST /api/v1/orders/:order_id/payout
#[utoipa::path(
    post,
    path = "/v1/orders/{order_id}/payout",
    tag = "Orders",
    operation_id = "sendPayout",
    params(("order_id" = String, Path, description = "External order ID")),
    request_body = SendPayoutRequest,
    responses(
        (status = 200, description = "Order after payout"),
        (status = 400, description = "No usable payment preference"),
        (status = 404, description = "No payable order with this id")
    ),
    security(("bearerAuth" = []))
)]
pub async fn send_payout(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(order_id): Path<String>,
    Json(request): Json<SendPayoutRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let customer = match User::find_by_id(&mut conn, auth_user.user_id).await {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let service = OrderService::new(&state);
    match service
        .send_payout(&mut conn, &customer, &order_id, request)
        .await
    {
        Ok(order) => Json(json!({ "item": order })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Pre-check of the review eligibility predicate
/// GET /api/v1/orders/:order_id/eligible
#[utoipa::path(
    get,
    path = "/v1/orders/{order_id}/eligible",
    tag = "Orders",
    operation_id = "eligibleToPostReview",
    params(("order_id" = String, Path, description = "External order ID")),
    responses(
        (status = 200, description = "{status: bool}"),
        (status = 404, description = "Unknown order")
    ),
    security(("bearerAuth" = []))
)]
pub async fn eligible_to_post_review(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(order_id): Path<String>,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let customer = match User::find_by_id(&mut conn, auth_user.user_id).await {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let service = OrderService::new(&state);
    match service
        .eligible_to_post_review(&mut conn, &customer, &order_id)
        .await
    {
        Ok(status) => Json(json!({ "status": status })).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::convomat::AsinData;

    fn good(brand: Option<&str>) -> Good {
        Good {
            campaign_id: Some(1),
            campaign_name: Some("Camp".to_string()),
            asin_data: brand.map(|b| AsinData {
                asin: None,
                brand: Some(b.to_string()),
                image_url: None,
            }),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn brand_exclusion_is_case_insensitive() {
        let excludes = vec!["Acme Corp".to_string()];
        assert!(brand_excluded(&excludes, "ACME CORP"));
        assert!(brand_excluded(&excludes, "acme"));
        assert!(!brand_excluded(&excludes, "globex"));
    }

    #[test]
    fn goods_without_brand_are_kept() {
        let excludes = vec!["acme".to_string()];
        let goods = vec![good(None), good(Some("Acme")), good(Some("Globex"))];
        let kept = apply_brand_excludes(goods, &excludes);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn empty_exclusion_list_keeps_everything() {
        let goods = vec![good(Some("Acme")), good(Some("Globex"))];
        assert_eq!(apply_brand_excludes(goods, &[]).len(), 2);
    }
}
