// Order model: a customer's purchase-to-payout journey for one campaign

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::orders;

/// Order database model
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: Uuid,
    pub campaign_id: i64,
    pub order_id: String,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub asin_id: Option<String>,
    pub product_name: Option<String>,
    pub product_image: Option<String>,
    pub rating: Option<i32>,
    pub tags: Option<Json>,
    pub reviewer_name: Option<String>,
    pub reward: Option<f64>,
    pub order_payment_reference: Option<String>,
    pub has_review: bool,
    pub is_done: bool,
    pub is_paid: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Verification payload; both the insert and the conflict-update side of the
/// upsert keyed on (campaign_id, order_id).
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = orders)]
pub struct OrderUpsert {
    pub campaign_id: i64,
    pub order_id: String,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub asin_id: Option<String>,
    pub product_name: Option<String>,
    pub product_image: Option<String>,
}

impl Order {
    /// Idempotent verification upsert. A second verify for the same
    /// (campaign, order) pair updates the existing row; the storage-level
    /// unique constraint serializes concurrent verifies.
    pub async fn upsert_verified(
        conn: &mut AsyncPgConnection,
        row: OrderUpsert,
    ) -> QueryResult<Self> {
        use crate::schema::orders::dsl::*;

        diesel::insert_into(orders)
            .values(&row)
            .on_conflict((campaign_id, order_id))
            .do_update()
            .set((&row, updated_at.eq(Utc::now())))
            .get_result::<Order>(conn)
            .await
    }

    /// Open order (no review yet, not terminal) by external id, scoped to
    /// its owner.
    pub async fn find_open(
        conn: &mut AsyncPgConnection,
        external_id: &str,
        owner: Uuid,
    ) -> QueryResult<Self> {
        use crate::schema::orders::dsl::*;

        orders
            .filter(order_id.eq(external_id))
            .filter(user_id.eq(owner))
            .filter(has_review.eq(false))
            .filter(is_done.eq(false))
            .first::<Order>(conn)
            .await
    }

    /// Open order that also carries a product identifier; review posting
    /// requires one.
    pub async fn find_open_reviewable(
        conn: &mut AsyncPgConnection,
        external_id: &str,
        owner: Uuid,
    ) -> QueryResult<Self> {
        use crate::schema::orders::dsl::*;

        orders
            .filter(order_id.eq(external_id))
            .filter(user_id.eq(owner))
            .filter(has_review.eq(false))
            .filter(is_done.eq(false))
            .filter(asin_id.is_not_null())
            .first::<Order>(conn)
            .await
    }

    /// Open, shipped order eligible for payout dispatch
    pub async fn find_open_shipped(
        conn: &mut AsyncPgConnection,
        external_id: &str,
        owner: Uuid,
    ) -> QueryResult<Self> {
        use crate::schema::orders::dsl::*;

        orders
            .filter(order_id.eq(external_id))
            .filter(user_id.eq(owner))
            .filter(status.eq("Shipped"))
            .filter(has_review.eq(false))
            .filter(is_done.eq(false))
            .first::<Order>(conn)
            .await
    }

    /// Unscoped lookup by external id (eligibility probe)
    pub async fn find_by_external_id(
        conn: &mut AsyncPgConnection,
        external_id: &str,
    ) -> QueryResult<Self> {
        use crate::schema::orders::dsl::*;

        orders
            .filter(order_id.eq(external_id))
            .first::<Order>(conn)
            .await
    }

    /// Every order of a customer, id-ordered
    pub async fn all_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        ascending: bool,
    ) -> QueryResult<Vec<Self>> {
        use crate::schema::orders::dsl::*;

        let query = orders.filter(user_id.eq(owner));
        if ascending {
            query.order(created_at.asc()).load::<Order>(conn).await
        } else {
            query.order(created_at.desc()).load::<Order>(conn).await
        }
    }

    /// Open orders of a customer
    pub async fn open_for_user(conn: &mut AsyncPgConnection, owner: Uuid) -> QueryResult<Vec<Self>> {
        use crate::schema::orders::dsl::*;

        orders
            .filter(user_id.eq(owner))
            .filter(has_review.eq(false))
            .filter(is_done.eq(false))
            .load::<Order>(conn)
            .await
    }

    /// Open order of a customer for one campaign, if any
    pub async fn open_for_campaign(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        campaign: i64,
    ) -> QueryResult<Option<Self>> {
        use crate::schema::orders::dsl::*;

        orders
            .filter(user_id.eq(owner))
            .filter(campaign_id.eq(campaign))
            .filter(has_review.eq(false))
            .filter(is_done.eq(false))
            .first::<Order>(conn)
            .await
            .optional()
    }

    /// Total orders ever created for a tenant. Deliberately unscoped by
    /// user or lifecycle stage: this is the global per-tenant throttle the
    /// review-eligibility check counts against.
    pub async fn count_for_company(
        conn: &mut AsyncPgConnection,
        company: Uuid,
    ) -> QueryResult<i64> {
        use crate::schema::orders::dsl::*;

        orders
            .filter(company_id.eq(company))
            .count()
            .get_result::<i64>(conn)
            .await
    }

    /// Done-order count shown on the customer detail view
    pub async fn done_count_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
    ) -> QueryResult<i64> {
        use crate::schema::orders::dsl::*;

        orders
            .filter(user_id.eq(owner))
            .filter(is_done.eq(true))
            .count()
            .get_result::<i64>(conn)
            .await
    }

    pub async fn count_for_user(conn: &mut AsyncPgConnection, owner: Uuid) -> QueryResult<i64> {
        use crate::schema::orders::dsl::*;

        orders
            .filter(user_id.eq(owner))
            .count()
            .get_result::<i64>(conn)
            .await
    }
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Order verification request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyOrderRequest {
    pub campaign_id: i64,

    #[validate(length(min = 1, max = 255, message = "order_id must be 1-255 characters"))]
    pub order_id: String,
}

/// Initial feedback on a verified order
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PostFeedbackRequest {
    #[serde(default)]
    pub tags: Vec<String>,

    #[validate(range(min = 1, max = 5, message = "rating must be 1-5"))]
    pub rating: i32,
}

/// Full review submission
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PostReviewRequest {
    #[validate(length(min = 1, max = 2048, message = "reviewer_name must be 1-2048 characters"))]
    pub reviewer_name: String,
}

/// Payout dispatch request; the gateway wants the customer's 2FA code
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SendPayoutRequest {
    #[serde(rename = "2FA")]
    #[validate(length(min = 1, max = 16, message = "2FA code required"))]
    pub two_factor_code: String,
}

/// Sort parameter accepted by the task listing
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TaskListParams {
    pub sort: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn feedback_rating_bounds() {
        let ok = PostFeedbackRequest {
            tags: vec!["fast".to_string()],
            rating: 5,
        };
        assert!(ok.validate().is_ok());

        let too_low = PostFeedbackRequest {
            tags: vec![],
            rating: 0,
        };
        assert!(too_low.validate().is_err());

        let too_high = PostFeedbackRequest {
            tags: vec![],
            rating: 6,
        };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn payout_request_uses_gateway_field_name() {
        let req: SendPayoutRequest = serde_json::from_str(r#"{"2FA":"123456"}"#).unwrap();
        assert_eq!(req.two_factor_code, "123456");
    }
}
