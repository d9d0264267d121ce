// Order lifecycle: verification upsert, feedback, review, payout.
//
// States move created -> feedback -> reviewed -> paid, with a terminal
// is_done short-circuit taken when feedback leaves the customer ineligible
// for a full review.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::company::Company;
use crate::models::order::{
    Order, OrderUpsert, PostFeedbackRequest, PostReviewRequest, SendPayoutRequest,
    VerifyOrderRequest,
};
use crate::models::user::{PaymentPreference, User, UserUpdate};
use crate::services::convomat::{ConvomatError, ConvomatService};
use crate::utils::service_error::ServiceError;

/// Gateway wordings that mean "this order does not check out" and surface
/// as a client error instead of a gateway failure.
const INVALID_ORDER_MESSAGES: [&str; 2] = ["Invalid Order ID", "Incorrect order details found."];

/// Whether a customer may continue from feedback to a full review.
///
/// The order count is the tenant-wide total of all orders ever created,
/// not a per-customer figure; the boundary is strictly `count < limit`.
pub fn review_eligibility(
    rating: Option<i32>,
    review_from: i32,
    company_orders_total: i64,
    review_limit: i32,
) -> bool {
    rating.map_or(false, |r| r >= review_from) && company_orders_total < i64::from(review_limit)
}

pub struct OrderService {
    convomat: Arc<ConvomatService>,
}

impl OrderService {
    pub fn new(state: &crate::app::AppState) -> Self {
        Self {
            convomat: state.convomat.clone(),
        }
    }

    /// Validate an order against the gateway and upsert it locally.
    /// Calling verify twice for the same (campaign, order) pair updates the
    /// existing row rather than duplicating it.
    #[instrument(skip(self, conn, company, customer))]
    pub async fn verify_order(
        &self,
        conn: &mut AsyncPgConnection,
        company: &Company,
        customer: &User,
        request: VerifyOrderRequest,
    ) -> Result<Order, ServiceError> {
        let order_data = match self
            .convomat
            .get_order(request.campaign_id, &request.order_id, &customer.email)
            .await
        {
            Ok(data) => data,
            Err(ConvomatError::Rejected(message))
                if INVALID_ORDER_MESSAGES.contains(&message.as_str()) =>
            {
                return Err(ServiceError::GatewayRejected("Invalid Order ID".to_string()));
            },
            Err(other) => return Err(other.into()),
        };

        let campaign = self.convomat.get_campaign(request.campaign_id).await?;

        let order = Order::upsert_verified(
            conn,
            OrderUpsert {
                campaign_id: request.campaign_id,
                order_id: order_data.order_id.clone(),
                company_id: company.id,
                user_id: customer.id,
                status: order_data.order_status.clone(),
                asin_id: order_data.first_asin(),
                product_name: Some(campaign.campaign_name.clone()),
                product_image: campaign.asin_data.image_url.clone(),
            },
        )
        .await?;

        info!(
            "Verified order {} for campaign {} (status {})",
            order.order_id, order.campaign_id, order.status
        );

        Ok(order)
    }

    /// Record tags and a star rating, then decide whether the journey
    /// continues toward a full review or terminates here.
    #[instrument(skip(self, conn, customer, request))]
    pub async fn submit_feedback(
        &self,
        conn: &mut AsyncPgConnection,
        customer: &User,
        external_id: &str,
        request: PostFeedbackRequest,
    ) -> Result<Order, ServiceError> {
        use crate::schema::orders::dsl::*;

        let order = Order::find_open(conn, external_id, customer.id).await?;

        let mut order = diesel::update(orders.filter(id.eq(order.id)))
            .set((
                tags.eq(Some(serde_json::json!(request.tags))),
                rating.eq(Some(request.rating)),
                updated_at.eq(Utc::now()),
            ))
            .get_result::<Order>(conn)
            .await?;

        if !self.currently_eligible(conn, customer, &order).await? {
            order = diesel::update(orders.filter(id.eq(order.id)))
                .set((
                    is_done.eq(true),
                    completed_at.eq(Some(Utc::now())),
                    updated_at.eq(Utc::now()),
                ))
                .get_result::<Order>(conn)
                .await?;

            User::update(
                conn,
                customer.id,
                UserUpdate {
                    is_vip: Some(true),
                    ..UserUpdate::default()
                },
            )
            .await?;

            info!(
                "Order {} closed at feedback; customer {} flagged VIP",
                order.order_id, customer.id
            );
        }

        Ok(order)
    }

    /// Attach the review. A reviewer_name that is a URL is resolved to the
    /// external profile id and stored on the user; resolution failure
    /// rejects the request without consuming the review slot.
    #[instrument(skip(self, conn, customer, request))]
    pub async fn post_review(
        &self,
        conn: &mut AsyncPgConnection,
        customer: &User,
        external_id: &str,
        request: PostReviewRequest,
    ) -> Result<Order, ServiceError> {
        use crate::schema::orders::dsl::*;

        let order = Order::find_open_reviewable(conn, external_id, customer.id).await?;
        let author = request.reviewer_name;

        if author.starts_with("http") {
            let profile = self.convomat.get_amazon_profile_by_url(&author).await?;

            let profile_id = match profile.user_id.filter(|u| !u.is_empty()) {
                Some(uid) => uid,
                None => {
                    return Err(ServiceError::GatewayRejected(
                        "Amazon profile not found.".to_string(),
                    ));
                },
            };

            // The profile belongs to the user, not this one order
            User::update(
                conn,
                customer.id,
                UserUpdate {
                    amazon_id: Some(Some(profile_id)),
                    ..UserUpdate::default()
                },
            )
            .await?;

            Ok(diesel::update(orders.filter(id.eq(order.id)))
                .set((has_review.eq(true), updated_at.eq(Utc::now())))
                .get_result::<Order>(conn)
                .await?)
        } else {
            Ok(diesel::update(orders.filter(id.eq(order.id)))
                .set((
                    reviewer_name.eq(Some(author)),
                    has_review.eq(true),
                    updated_at.eq(Utc::now()),
                ))
                .get_result::<Order>(conn)
                .await?)
        }
    }

    /// Dispatch the payout through the customer's stored channel, then
    /// stamp the reward on the order.
    #[instrument(skip(self, conn, customer, request))]
    pub async fn send_payout(
        &self,
        conn: &mut AsyncPgConnection,
        customer: &User,
        external_id: &str,
        request: SendPayoutRequest,
    ) -> Result<Order, ServiceError> {
        use crate::schema::orders::dsl::*;

        // A payout with nowhere to go is a request error, not a silent no-op
        let preference = customer
            .payment_preference_enum()
            .map_err(ServiceError::ValidationError)?;

        let order = Order::find_open_shipped(conn, external_id, customer.id).await?;

        self.convomat
            .set_verification_code(&request.two_factor_code)
            .await?;

        match preference {
            PaymentPreference::Venmo => {
                self.convomat
                    .post_send_venmo_payout(
                        order.campaign_id,
                        &order.order_id,
                        &customer.email,
                        customer.phone_number.as_deref(),
                    )
                    .await?;
            },
            PaymentPreference::AmazonGiftCard => {
                self.convomat
                    .post_send_gift_card_by_order_id(
                        order.campaign_id,
                        &order.order_id,
                        true,
                        &customer.email,
                        "Amazon",
                    )
                    .await?;
            },
            PaymentPreference::VisaGiftCard => {
                self.convomat
                    .post_send_gift_card_by_order_id(
                        order.campaign_id,
                        &order.order_id,
                        true,
                        &customer.email,
                        "VISA",
                    )
                    .await?;
            },
            PaymentPreference::MastercardGiftCard => {
                self.convomat
                    .post_send_gift_card_by_order_id(
                        order.campaign_id,
                        &order.order_id,
                        true,
                        &customer.email,
                        "Master Card",
                    )
                    .await?;
            },
            PaymentPreference::Paypal => {
                self.convomat
                    .post_send_paypal_payout(order.campaign_id, &order.order_id, &customer.email)
                    .await?;
            },
        }

        let campaign = self.convomat.get_campaign(order.campaign_id).await?;

        let order = diesel::update(orders.filter(id.eq(order.id)))
            .set((
                reward.eq(Some(campaign.feedback_bonus)),
                order_payment_reference.eq(Some(preference.as_str().to_string())),
                is_paid.eq(true),
                updated_at.eq(Utc::now()),
            ))
            .get_result::<Order>(conn)
            .await?;

        info!(
            "Payout of {} dispatched via {} for order {}",
            campaign.feedback_bonus,
            preference.as_str(),
            order.order_id
        );

        Ok(order)
    }

    /// Read-only exposure of the feedback-stage eligibility predicate
    #[instrument(skip(self, conn, customer))]
    pub async fn eligible_to_post_review(
        &self,
        conn: &mut AsyncPgConnection,
        customer: &User,
        external_id: &str,
    ) -> Result<bool, ServiceError> {
        let order = Order::find_by_external_id(conn, external_id).await?;
        self.currently_eligible(conn, customer, &order).await
    }

    async fn currently_eligible(
        &self,
        conn: &mut AsyncPgConnection,
        customer: &User,
        order: &Order,
    ) -> Result<bool, ServiceError> {
        let company = Company::find_by_id(conn, customer.company_id).await?;
        let company_orders_total = Order::count_for_company(conn, company.id).await?;

        Ok(review_eligibility(
            order.rating,
            company.review_from,
            company_orders_total,
            company.review_limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligibility_requires_rating_at_or_above_threshold() {
        assert!(review_eligibility(Some(4), 3, 0, 5));
        assert!(review_eligibility(Some(3), 3, 0, 5));
        assert!(!review_eligibility(Some(2), 3, 0, 5));
        assert!(!review_eligibility(None, 3, 0, 5));
    }

    #[test]
    fn eligibility_boundary_is_strictly_below_limit() {
        // 4 existing tenant orders with a limit of 5: still eligible
        assert!(review_eligibility(Some(4), 3, 4, 5));
        // at the limit: a perfect rating no longer helps
        assert!(!review_eligibility(Some(5), 3, 5, 5));
        assert!(!review_eligibility(Some(5), 3, 6, 5));
    }

    #[test]
    fn eligibility_with_zero_limit_is_never_granted() {
        assert!(!review_eligibility(Some(5), 1, 0, 0));
    }

    #[test]
    fn invalid_order_messages_match_gateway_wording() {
        assert!(INVALID_ORDER_MESSAGES.contains(&"Invalid Order ID"));
        assert!(INVALID_ORDER_MESSAGES.contains(&"Incorrect order details found."));
        assert!(!INVALID_ORDER_MESSAGES.contains(&"Rate limited"));
    }
}
