// Review eligibility: the predicate gating feedback -> review

use revly_backend_core::services::review_eligibility;

#[tokio::test]
async fn rating_threshold_is_inclusive() {
    // review_from = 3: a rating of exactly 3 still qualifies
    assert!(review_eligibility(Some(3), 3, 0, 100));
    assert!(review_eligibility(Some(4), 3, 0, 100));
    assert!(!review_eligibility(Some(2), 3, 0, 100));
}

#[tokio::test]
async fn tenant_order_limit_boundary() {
    // review_from=3, review_limit=5, four existing tenant orders:
    // rating 4 keeps the order open
    assert!(review_eligibility(Some(4), 3, 4, 5));

    // with the fifth order the limit is reached; a perfect rating
    // no longer qualifies (boundary is count < limit, not <=)
    assert!(!review_eligibility(Some(5), 3, 5, 5));
}

#[tokio::test]
async fn unrated_orders_never_qualify() {
    assert!(!review_eligibility(None, 1, 0, 100));
}

#[tokio::test]
async fn the_counter_is_tenant_wide() {
    // The count passed in is the tenant-wide order total; a customer with
    // no orders of their own is still throttled once the tenant total
    // reaches the limit.
    let tenant_total_from_other_customers = 10;
    assert!(!review_eligibility(
        Some(5),
        3,
        tenant_total_from_other_customers,
        10
    ));
}
