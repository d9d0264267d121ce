// Notification delivery
// Tenant-customizable templates rendered with handlebars and delivered
// through a Resend-compatible HTTP API. Delivery is fire-and-forget from
// the handlers' perspective: failures are logged, never bubbled into the
// request outcome (except the explicit company-feedback relay).

use handlebars::Handlebars;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::app_config::EmailConfig;
use crate::models::company::Company;
use crate::models::user::User;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Failed to send notification: {0}")]
    SendError(String),

    #[error("Template rendering error: {0}")]
    TemplateError(String),

    #[error("Service unavailable")]
    ServiceUnavailable,
}

/// Outbound message in the delivery API's format
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[derive(Clone)]
pub struct NotificationService {
    client: Arc<Client>,
    config: EmailConfig,
    renderer: Arc<Handlebars<'static>>,
    max_retries: u32,
    retry_delay: Duration,
}

impl NotificationService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: Arc::new(Client::new()),
            config,
            renderer: Arc::new(Handlebars::new()),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Render and deliver a tenant-customized template. A tenant that has
    /// not configured the template simply gets no mail for that action.
    #[instrument(skip(self, company, user))]
    pub async fn notify_from_template(&self, company: &Company, user: &User, action: &str) {
        self.notify_from_template_with(company, user, action, json!({}))
            .await
    }

    /// Same, with extra template variables (e.g. a generated password)
    #[instrument(skip(self, company, user, extra))]
    pub async fn notify_from_template_with(
        &self,
        company: &Company,
        user: &User,
        action: &str,
        extra: serde_json::Value,
    ) {
        let template = match company.mail_templates.get(action) {
            Some(t) => t,
            None => {
                warn!(
                    "Company {} has no mail template for '{}', skipping",
                    company.id, action
                );
                return;
            },
        };

        let subject_tpl = template
            .get("subject")
            .and_then(|s| s.as_str())
            .unwrap_or(action);
        let body_tpl = template.get("body").and_then(|b| b.as_str()).unwrap_or("");

        let mut data = json!({
            "user_name": user.name,
            "user_email": user.email,
            "company_name": company.name,
            "company_domain": company.domain,
        });
        if let (Some(obj), Some(extra_obj)) = (data.as_object_mut(), extra.as_object()) {
            for (k, v) in extra_obj {
                obj.insert(k.clone(), v.clone());
            }
        }

        let rendered = self
            .renderer
            .render_template(subject_tpl, &data)
            .and_then(|subject| {
                self.renderer
                    .render_template(body_tpl, &data)
                    .map(|body| (subject, body))
            });

        let (subject, body) = match rendered {
            Ok(parts) => parts,
            Err(e) => {
                error!(
                    "Failed to render template '{}' for company {}: {}",
                    action, company.id, e
                );
                return;
            },
        };

        let message = self.message_to(user, subject, body);
        if let Err(e) = self.send_with_retry(message).await {
            error!("Notification '{}' to {} failed: {}", action, user.email, e);
        }
    }

    /// Password reset notification carrying the freshly generated credential
    #[instrument(skip(self, user, password))]
    pub async fn notify_password_changed(&self, user: &User, password: &str) {
        let message = self.message_to(
            user,
            "Your password was changed".to_string(),
            format!(
                "<p>Hi {},</p><p>Your password has been reset. Your new password is: \
                 <strong>{}</strong></p><p>Please sign in and change it.</p>",
                user.name, password
            ),
        );

        if let Err(e) = self.send_with_retry(message).await {
            error!("Password notification to {} failed: {}", user.email, e);
        }
    }

    /// Welcome mail for a freshly self-registered tenant admin
    #[instrument(skip(self, user, password))]
    pub async fn notify_admin_created(&self, user: &User, password: &str) {
        let message = self.message_to(
            user,
            "Your admin account is ready".to_string(),
            format!(
                "<p>Hi {},</p><p>Your admin account has been created. \
                 Sign in with this password: <strong>{}</strong></p>",
                user.name, password
            ),
        );

        if let Err(e) = self.send_with_retry(message).await {
            error!("Admin-created notification to {} failed: {}", user.email, e);
        }
    }

    /// Relay storefront visitor feedback to the platform operator. Unlike
    /// the other notifications the caller inspects this result.
    #[instrument(skip(self, admin))]
    pub async fn send_company_feedback(
        &self,
        admin: &User,
        name: &str,
        email: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        let message = self.message_to(
            admin,
            format!("Company feedback from {}", name),
            format!(
                "<p>From: {} &lt;{}&gt;</p><p>{}</p>",
                name, email, body
            ),
        );

        self.send(message).await
    }

    fn message_to(&self, user: &User, subject: String, html: String) -> EmailMessage {
        EmailMessage {
            from: self.config.from_address.clone(),
            to: vec![user.email.clone()],
            subject,
            html,
            reply_to: self.config.reply_to.clone(),
        }
    }

    /// Deliver a message through the HTTP API
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&message)
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => {
                info!("Notification sent");
                Ok(())
            },
            Ok(res) => {
                let status = res.status();
                let error_text = res
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());

                if status.is_server_error() {
                    Err(NotificationError::ServiceUnavailable)
                } else {
                    Err(NotificationError::SendError(format!(
                        "Delivery failed with status {}: {}",
                        status, error_text
                    )))
                }
            },
            Err(e) => Err(NotificationError::SendError(format!("Network error: {}", e))),
        }
    }

    /// Deliver with bounded retry on transient failures
    async fn send_with_retry(&self, message: EmailMessage) -> Result<(), NotificationError> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.send(message.clone()).await {
                Ok(()) => return Ok(()),
                Err(NotificationError::ServiceUnavailable) => {
                    warn!(
                        "Notification delivery attempt {}/{} hit a server error, retrying",
                        attempt, self.max_retries
                    );
                    last_error = Some(NotificationError::ServiceUnavailable);
                    tokio::time::sleep(self.retry_delay).await;
                },
                // Client-side rejections will not improve on retry
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(NotificationError::ServiceUnavailable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_message_omits_absent_reply_to() {
        let message = EmailMessage {
            from: "no-reply@revly.app".to_string(),
            to: vec!["u@example.com".to_string()],
            subject: "s".to_string(),
            html: "<p>x</p>".to_string(),
            reply_to: None,
        };
        let encoded = serde_json::to_value(&message).unwrap();
        assert!(encoded.get("reply_to").is_none());
    }

    #[test]
    fn handlebars_renders_template_variables() {
        let renderer = Handlebars::new();
        let out = renderer
            .render_template(
                "Welcome {{user_name}} to {{company_name}}",
                &json!({"user_name": "Ann", "company_name": "Acme"}),
            )
            .unwrap();
        assert_eq!(out, "Welcome Ann to Acme");
    }
}
