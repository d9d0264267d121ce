// Convomat order-gateway client
// The external order-management API is an opaque dependency: campaigns,
// order verification, reviewer profile resolution, and payout dispatch all
// happen on the other side of this client.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::app_config::ConvomatConfig;

#[derive(Debug, Error)]
pub enum ConvomatError {
    /// The gateway processed the request and said no. The message is the
    /// gateway's own wording; order verification matches on it.
    #[error("{0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Gateway returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Unexpected gateway response: {0}")]
    Decode(String),
}

/// Gateway response envelope: {success, message, data}
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    message: Option<String>,
    data: Option<T>,
}

/// Product metadata attached to a campaign
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsinData {
    pub asin: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
}

/// Campaign descriptor as returned by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignDescriptor {
    pub campaign_id: i64,
    pub campaign_name: String,
    #[serde(default)]
    pub feedback_bonus: f64,
    #[serde(default)]
    pub asin_data: AsinData,
}

/// One entry of the campaign listing ("good")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Good {
    pub campaign_id: Option<i64>,
    pub campaign_name: Option<String>,
    pub asin_data: Option<AsinData>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Json>,
}

/// Order lookup result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderData {
    pub order_id: String,
    pub order_status: String,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "ASIN")]
    pub asin: Option<String>,
}

impl OrderData {
    /// Product identifier of the first line item, when the gateway sent one
    pub fn first_asin(&self) -> Option<String> {
        self.order_items.first().and_then(|item| item.asin.clone())
    }
}

/// Reviewer profile resolution result
#[derive(Debug, Clone, Deserialize)]
pub struct AmazonProfile {
    pub user_id: Option<String>,
}

pub struct ConvomatService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl ConvomatService {
    pub fn new(config: &ConvomatConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("revly-backend/1.0")
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Fetch a single campaign descriptor
    #[instrument(skip(self))]
    pub async fn get_campaign(&self, campaign_id: i64) -> Result<CampaignDescriptor, ConvomatError> {
        self.get(&format!("/campaigns/{}", campaign_id), &[]).await
    }

    /// Campaign listing for a storefront
    #[instrument(skip(self))]
    pub async fn get_campaigns(
        &self,
        api_mode: &str,
        promotion_type: &str,
        limit: i64,
    ) -> Result<Vec<Good>, ConvomatError> {
        self.get(
            "/campaigns",
            &[
                ("mode", api_mode.to_string()),
                ("active", "true".to_string()),
                ("promotion_type", promotion_type.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    /// Validate order ownership/status by the (campaign, order, email) triple
    #[instrument(skip(self, email))]
    pub async fn get_order(
        &self,
        campaign_id: i64,
        order_id: &str,
        email: &str,
    ) -> Result<OrderData, ConvomatError> {
        self.get(
            "/orders",
            &[
                ("campaign_id", campaign_id.to_string()),
                ("order_id", order_id.to_string()),
                ("email", email.to_string()),
            ],
        )
        .await
    }

    /// Resolve a public reviewer-profile URL to the external user id
    #[instrument(skip(self))]
    pub async fn get_amazon_profile_by_url(
        &self,
        url: &str,
    ) -> Result<AmazonProfile, ConvomatError> {
        self.get("/amazon/profile", &[("url", url.to_string())])
            .await
    }

    /// Trigger the gateway's email-ownership verification flow
    #[instrument(skip(self, email))]
    pub async fn get_email_verification(&self, email: &str) -> Result<(), ConvomatError> {
        let _: Json = self
            .get("/email-verification", &[("email", email.to_string())])
            .await?;
        Ok(())
    }

    /// Attach a customer-supplied 2FA code to the gateway session; payout
    /// dispatch calls that follow are verified against it.
    #[instrument(skip(self, code))]
    pub async fn set_verification_code(&self, code: &str) -> Result<(), ConvomatError> {
        let _: Json = self
            .post(
                "/verification-code",
                &serde_json::json!({ "code": code }),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, email, phone_number))]
    pub async fn post_send_venmo_payout(
        &self,
        campaign_id: i64,
        order_id: &str,
        email: &str,
        phone_number: Option<&str>,
    ) -> Result<Json, ConvomatError> {
        self.post(
            "/payouts/venmo",
            &serde_json::json!({
                "campaign_id": campaign_id,
                "order_id": order_id,
                "email": email,
                "phone_number": phone_number,
            }),
        )
        .await
    }

    #[instrument(skip(self, email))]
    pub async fn post_send_gift_card_by_order_id(
        &self,
        campaign_id: i64,
        order_id: &str,
        auto_approve: bool,
        email: &str,
        card_type: &str,
    ) -> Result<Json, ConvomatError> {
        self.post(
            "/payouts/gift-card",
            &serde_json::json!({
                "campaign_id": campaign_id,
                "order_id": order_id,
                "auto": auto_approve,
                "email": email,
                "card_type": card_type,
            }),
        )
        .await
    }

    #[instrument(skip(self, email))]
    pub async fn post_send_paypal_payout(
        &self,
        campaign_id: i64,
        order_id: &str,
        email: &str,
    ) -> Result<Json, ConvomatError> {
        self.post(
            "/payouts/paypal",
            &serde_json::json!({
                "campaign_id": campaign_id,
                "order_id": order_id,
                "email": email,
            }),
        )
        .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ConvomatError> {
        let response = self
            .client
            .get(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        Self::unwrap_envelope(path, response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Json) -> Result<T, ConvomatError> {
        let response = self
            .client
            .post(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        Self::unwrap_envelope(path, response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ConvomatError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Convomat call {} failed: HTTP {} {}", path, status, message);
            return Err(ConvomatError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = response.json().await?;

        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "Gateway rejected request".to_string());
            info!("Convomat call {} rejected: {}", path, message);
            return Err(ConvomatError::Rejected(message));
        }

        envelope
            .data
            .ok_or_else(|| ConvomatError::Decode(format!("{}: missing data payload", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_success_and_rejection() {
        let ok: Envelope<OrderData> = serde_json::from_str(
            r#"{"success":true,"message":null,"data":{"order_id":"113-123","order_status":"Shipped","order_items":[{"ASIN":"B0ABC"}]}}"#,
        )
        .unwrap();
        assert!(ok.success);
        let data = ok.data.unwrap();
        assert_eq!(data.first_asin().as_deref(), Some("B0ABC"));

        let rejected: Envelope<OrderData> =
            serde_json::from_str(r#"{"success":false,"message":"Invalid Order ID"}"#).unwrap();
        assert!(!rejected.success);
        assert_eq!(rejected.message.as_deref(), Some("Invalid Order ID"));
    }

    #[test]
    fn order_data_without_items_has_no_asin() {
        let data: OrderData =
            serde_json::from_str(r#"{"order_id":"1","order_status":"Pending"}"#).unwrap();
        assert_eq!(data.first_asin(), None);
    }

    #[test]
    fn campaign_descriptor_defaults_optional_fields() {
        let campaign: CampaignDescriptor =
            serde_json::from_str(r#"{"campaign_id":7,"campaign_name":"Spring"}"#).unwrap();
        assert_eq!(campaign.feedback_bonus, 0.0);
        assert!(campaign.asin_data.brand.is_none());
    }
}
