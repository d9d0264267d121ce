// User database model and request DTOs

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::users;

/// Payout channel chosen by a customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentPreference {
    Venmo,
    AmazonGiftCard,
    VisaGiftCard,
    MastercardGiftCard,
    Paypal,
}

impl PaymentPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentPreference::Venmo => "venmo",
            PaymentPreference::AmazonGiftCard => "amazon_gift_card",
            PaymentPreference::VisaGiftCard => "visa_gift_card",
            PaymentPreference::MastercardGiftCard => "mastercard_gift_card",
            PaymentPreference::Paypal => "paypal",
        }
    }

}

impl FromStr for PaymentPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "venmo" => Ok(PaymentPreference::Venmo),
            "amazon_gift_card" => Ok(PaymentPreference::AmazonGiftCard),
            "visa_gift_card" => Ok(PaymentPreference::VisaGiftCard),
            "mastercard_gift_card" => Ok(PaymentPreference::MastercardGiftCard),
            "paypal" => Ok(PaymentPreference::Paypal),
            _ => Err(format!("Invalid payment preference: {}", s)),
        }
    }
}

/// User database model
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub company_id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub convomat_user_id: Option<String>,
    pub amazon_id: Option<String>,
    pub payment_preference: Option<String>,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub is_active: bool,
    pub is_banned: bool,
    pub is_vip: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub company_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub convomat_user_id: Option<String>,
    pub payment_preference: Option<String>,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub is_active: bool,
}

/// User update struct
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub phone_number: Option<Option<String>>,
    pub convomat_user_id: Option<Option<String>>,
    pub amazon_id: Option<Option<String>>,
    pub payment_preference: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_banned: Option<bool>,
    pub is_vip: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Find user by ID
    pub async fn find_by_id(conn: &mut AsyncPgConnection, user_id: Uuid) -> QueryResult<Self> {
        use crate::schema::users::dsl::*;

        users.filter(id.eq(user_id)).first::<User>(conn).await
    }

    /// Find user by email
    pub async fn find_by_email(
        conn: &mut AsyncPgConnection,
        email_str: &str,
    ) -> QueryResult<Option<Self>> {
        use crate::schema::users::dsl::*;

        users
            .filter(email.eq(email_str))
            .first::<User>(conn)
            .await
            .optional()
    }

    /// Create a new user
    pub async fn create(conn: &mut AsyncPgConnection, new_user: NewUser) -> QueryResult<Self> {
        use crate::schema::users::dsl::*;

        diesel::insert_into(users)
            .values(&new_user)
            .get_result::<User>(conn)
            .await
    }

    /// Update user, returning the fresh row
    pub async fn update(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        mut update: UserUpdate,
    ) -> QueryResult<Self> {
        use crate::schema::users::dsl::*;

        update.updated_at = Some(Utc::now());
        diesel::update(users.filter(id.eq(user_id)))
            .set(&update)
            .get_result::<User>(conn)
            .await
    }

    /// Hard delete
    pub async fn delete(conn: &mut AsyncPgConnection, user_id: Uuid) -> QueryResult<usize> {
        use crate::schema::users::dsl::*;

        diesel::delete(users.filter(id.eq(user_id))).execute(conn).await
    }

    /// Parsed payout channel, if one is stored and recognized
    pub fn payment_preference_enum(&self) -> Result<PaymentPreference, String> {
        match self.payment_preference.as_deref() {
            Some(raw) => PaymentPreference::from_str(raw),
            None => Err("No payment preference on file".to_string()),
        }
    }
}

/// Whether `actor` may view or mutate `target` in the customer directory.
/// Admin-level accounts and users of other tenants are off limits.
pub fn can_manage(actor: &User, target: &User) -> bool {
    !(target.is_admin || target.is_super_admin || target.company_id != actor.company_id)
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// One screening answer submitted during registration
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnswerSubmission {
    pub question_id: Uuid,
    pub answer: String,
}

/// Public self-registration on a tenant storefront
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(max = 50, message = "Phone number must be less than 50 characters"))]
    pub phone_number: Option<String>,

    pub payment_preference: Option<String>,

    #[serde(default)]
    pub answers: Vec<AnswerSubmission>,
}

/// Admin creating a customer account directly
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(max = 50, message = "Phone number must be less than 50 characters"))]
    pub phone_number: Option<String>,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

/// Platform admin self-signup
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAdminRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    pub convomat_user_id: Option<String>,
}

/// Partial update of a directory entry
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 50, message = "Phone number must be less than 50 characters"))]
    pub phone_number: Option<String>,

    pub payment_preference: Option<String>,

    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    /// Validate any supplied payment preference against the known channels
    pub fn validated_preference(&self) -> Result<(), String> {
        match self.payment_preference.as_deref() {
            Some(raw) => PaymentPreference::from_str(raw).map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn into_changeset(self) -> UserUpdate {
        UserUpdate {
            name: self.name,
            email: self.email,
            phone_number: self.phone_number.map(Some),
            payment_preference: self.payment_preference.map(Some),
            is_active: self.is_active,
            ..UserUpdate::default()
        }
    }
}

/// Linking an external review profile to the account
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LinkAmazonRequest {
    #[validate(url(message = "Invalid profile URL"))]
    pub amazon_profile_url: String,
}

/// Question/answer pair as shown on the customer detail view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnsweredQuestion {
    pub question: Option<String>,
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(company: Uuid) -> User {
        User {
            id: Uuid::new_v4(),
            company_id: company,
            email: "c@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Customer".to_string(),
            phone_number: None,
            convomat_user_id: None,
            amazon_id: None,
            payment_preference: None,
            is_admin: false,
            is_super_admin: false,
            is_active: true,
            is_banned: false,
            is_vip: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn payment_preference_round_trip() {
        for raw in [
            "venmo",
            "amazon_gift_card",
            "visa_gift_card",
            "mastercard_gift_card",
            "paypal",
        ] {
            assert_eq!(PaymentPreference::from_str(raw).unwrap().as_str(), raw);
        }
        assert!(PaymentPreference::from_str("zelle").is_err());
        assert!(PaymentPreference::from_str("").is_err());
    }

    #[test]
    fn can_manage_denies_cross_tenant_and_admin_targets() {
        let company = Uuid::new_v4();
        let actor = user(company);

        let customer = user(company);
        assert!(can_manage(&actor, &customer));

        let mut other_tenant = user(Uuid::new_v4());
        other_tenant.is_admin = false;
        assert!(!can_manage(&actor, &other_tenant));

        let mut admin = user(company);
        admin.is_admin = true;
        assert!(!can_manage(&actor, &admin));

        let mut super_admin = user(company);
        super_admin.is_super_admin = true;
        assert!(!can_manage(&actor, &super_admin));
    }

    #[test]
    fn missing_payment_preference_is_an_error() {
        let u = user(Uuid::new_v4());
        assert!(u.payment_preference_enum().is_err());

        let mut with_pref = user(Uuid::new_v4());
        with_pref.payment_preference = Some("paypal".to_string());
        assert_eq!(
            with_pref.payment_preference_enum().unwrap(),
            PaymentPreference::Paypal
        );
    }
}
