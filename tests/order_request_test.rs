// Order lifecycle request/response shapes

use revly_backend_core::models::order::{
    PostFeedbackRequest, PostReviewRequest, SendPayoutRequest, VerifyOrderRequest,
};
use revly_backend_core::services::convomat::{CampaignDescriptor, OrderData};
use validator::Validate;

#[tokio::test]
async fn verify_request_shape() {
    let request: VerifyOrderRequest =
        serde_json::from_str(r#"{"campaign_id": 42, "order_id": "113-0001"}"#).unwrap();
    assert_eq!(request.campaign_id, 42);
    assert!(request.validate().is_ok());

    let empty: VerifyOrderRequest =
        serde_json::from_str(r#"{"campaign_id": 42, "order_id": ""}"#).unwrap();
    assert!(empty.validate().is_err());
}

#[tokio::test]
async fn feedback_rating_must_be_a_star_rating() {
    let ok: PostFeedbackRequest =
        serde_json::from_str(r#"{"tags": ["fast", "as described"], "rating": 4}"#).unwrap();
    assert!(ok.validate().is_ok());

    let zero: PostFeedbackRequest = serde_json::from_str(r#"{"rating": 0}"#).unwrap();
    assert!(zero.validate().is_err());

    let six: PostFeedbackRequest = serde_json::from_str(r#"{"rating": 6}"#).unwrap();
    assert!(six.validate().is_err());

    // tags default to empty when omitted
    let no_tags: PostFeedbackRequest = serde_json::from_str(r#"{"rating": 3}"#).unwrap();
    assert!(no_tags.tags.is_empty());
}

#[tokio::test]
async fn review_request_accepts_name_or_url() {
    let name: PostReviewRequest =
        serde_json::from_str(r#"{"reviewer_name": "Jane D."}"#).unwrap();
    assert!(name.validate().is_ok());

    let url: PostReviewRequest = serde_json::from_str(
        r#"{"reviewer_name": "https://amazon.com/gp/profile/amzn1.account.XYZ"}"#,
    )
    .unwrap();
    assert!(url.reviewer_name.starts_with("http"));
}

#[tokio::test]
async fn payout_request_uses_the_gateway_2fa_field() {
    let request: SendPayoutRequest = serde_json::from_str(r#"{"2FA": "004213"}"#).unwrap();
    assert_eq!(request.two_factor_code, "004213");
    assert!(request.validate().is_ok());

    let blank: SendPayoutRequest = serde_json::from_str(r#"{"2FA": ""}"#).unwrap();
    assert!(blank.validate().is_err());
}

#[tokio::test]
async fn gateway_payloads_decode_with_defaults() {
    let order: OrderData = serde_json::from_str(
        r#"{"order_id": "113-0001", "order_status": "Shipped", "order_items": [{"ASIN": "B0TEST"}]}"#,
    )
    .unwrap();
    assert_eq!(order.first_asin().as_deref(), Some("B0TEST"));

    let campaign: CampaignDescriptor = serde_json::from_str(
        r#"{"campaign_id": 9, "campaign_name": "Winter promo", "feedback_bonus": 12.5,
            "asin_data": {"asin": "B0TEST", "brand": "Acme", "image_url": "https://img"}}"#,
    )
    .unwrap();
    assert_eq!(campaign.feedback_bonus, 12.5);
    assert_eq!(campaign.asin_data.brand.as_deref(), Some("Acme"));
}
