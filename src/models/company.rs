// Company (tenant) model, screening questions, and settings DTOs

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::{companies, company_questions, question_answers};

/// Placeholders a tenant may reference inside mail templates
pub const ALLOWED_MAIL_VARIABLES: &[&str] = &[
    "user_name",
    "user_email",
    "company_name",
    "company_domain",
    "password",
];

/// Template keys a tenant may customize
pub const ALLOWED_MAIL_ACTIONS: &[&str] = &[
    "welcome_qualified_user",
    "welcome_non_qualified_user",
    "approved_user_questionnaire",
    "declined_user_questionnaire",
    "email_welcome_new_customer_created_by_admin",
];

/// Company database model
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = companies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Company {
    pub id: Uuid,
    pub domain: Option<String>,
    pub name: Option<String>,
    pub logo: Option<String>,
    pub general: Json,
    pub home_page: Json,
    pub about_page: Json,
    pub contact_page: Json,
    pub payment: Json,
    pub available_payment_methods: Json,
    pub mail_templates: Json,
    pub payout_tiers: Json,
    pub review_from: i32,
    pub review_limit: i32,
    pub exclude_brands: Option<Json>,
    pub api_mode: String,
    pub is_visible_limit: bool,
    pub products_to_display: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New company for insertion (admin self-signup creates a bare tenant)
#[derive(Debug, Insertable)]
#[diesel(table_name = companies)]
pub struct NewCompany {
    pub payment: Json,
}

impl Default for NewCompany {
    fn default() -> Self {
        Self {
            payment: serde_json::json!({}),
        }
    }
}

/// Company settings update
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = companies)]
pub struct CompanyUpdate {
    pub domain: Option<Option<String>>,
    pub name: Option<Option<String>>,
    pub logo: Option<Option<String>>,
    pub general: Option<Json>,
    pub home_page: Option<Json>,
    pub about_page: Option<Json>,
    pub contact_page: Option<Json>,
    pub payment: Option<Json>,
    pub available_payment_methods: Option<Json>,
    pub mail_templates: Option<Json>,
    pub payout_tiers: Option<Json>,
    pub review_from: Option<i32>,
    pub review_limit: Option<i32>,
    pub exclude_brands: Option<Option<Json>>,
    pub api_mode: Option<String>,
    pub is_visible_limit: Option<bool>,
    pub products_to_display: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Company {
    pub async fn find_by_id(conn: &mut AsyncPgConnection, company_id: Uuid) -> QueryResult<Self> {
        use crate::schema::companies::dsl::*;

        companies.filter(id.eq(company_id)).first::<Company>(conn).await
    }

    /// Tenant lookup by request host
    pub async fn find_by_domain(
        conn: &mut AsyncPgConnection,
        host: &str,
    ) -> QueryResult<Option<Self>> {
        use crate::schema::companies::dsl::*;

        companies
            .filter(domain.eq(host))
            .first::<Company>(conn)
            .await
            .optional()
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_company: NewCompany) -> QueryResult<Self> {
        use crate::schema::companies::dsl::*;

        diesel::insert_into(companies)
            .values(&new_company)
            .get_result::<Company>(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        company_id: Uuid,
        mut update: CompanyUpdate,
    ) -> QueryResult<Self> {
        use crate::schema::companies::dsl::*;

        update.updated_at = Some(Utc::now());
        diesel::update(companies.filter(id.eq(company_id)))
            .set(&update)
            .get_result::<Company>(conn)
            .await
    }

    /// Brand names a tenant excludes from campaign listings
    pub fn excluded_brands(&self) -> Vec<String> {
        self.exclude_brands
            .as_ref()
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|b| b.as_str())
                    .map(|b| b.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// How many campaigns the storefront shows
    pub fn campaign_display_limit(&self) -> i64 {
        if self.is_visible_limit {
            self.products_to_display as i64
        } else {
            10
        }
    }
}

/// Screening question, soft-deletable so historical answers keep resolving
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = company_questions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CompanyQuestion {
    pub id: Uuid,
    pub company_id: Uuid,
    pub question: String,
    pub correct_answer: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = company_questions)]
pub struct NewCompanyQuestion {
    pub company_id: Uuid,
    pub question: String,
    pub correct_answer: String,
}

impl CompanyQuestion {
    /// Live questions for a tenant
    pub async fn for_company(
        conn: &mut AsyncPgConnection,
        company: Uuid,
    ) -> QueryResult<Vec<Self>> {
        use crate::schema::company_questions::dsl::*;

        company_questions
            .filter(company_id.eq(company))
            .filter(deleted_at.is_null())
            .order(created_at.asc())
            .load::<CompanyQuestion>(conn)
            .await
    }

    /// Lookup including soft-deleted rows; answers submitted against a
    /// since-replaced question must still resolve.
    pub async fn find_with_trashed(
        conn: &mut AsyncPgConnection,
        question_id: Uuid,
    ) -> QueryResult<Self> {
        use crate::schema::company_questions::dsl::*;

        company_questions
            .filter(id.eq(question_id))
            .first::<CompanyQuestion>(conn)
            .await
    }

    /// Soft-delete every live question of a tenant
    pub async fn soft_delete_for_company(
        conn: &mut AsyncPgConnection,
        company: Uuid,
    ) -> QueryResult<usize> {
        use crate::schema::company_questions::dsl::*;

        diesel::update(
            company_questions
                .filter(company_id.eq(company))
                .filter(deleted_at.is_null()),
        )
        .set(deleted_at.eq(Utc::now()))
        .execute(conn)
        .await
    }

    pub async fn create_many(
        conn: &mut AsyncPgConnection,
        rows: Vec<NewCompanyQuestion>,
    ) -> QueryResult<usize> {
        use crate::schema::company_questions::dsl::*;

        diesel::insert_into(company_questions)
            .values(&rows)
            .execute(conn)
            .await
    }

    /// Correctness predicate over a submitted answer.
    /// Comparison is trimmed and case-insensitive.
    pub fn is_correct_answer(&self, submitted: &str) -> bool {
        submitted.trim().eq_ignore_ascii_case(self.correct_answer.trim())
    }

    /// Storefront projection: never leaks the correct answer
    pub fn simplify(&self) -> SimplifiedQuestion {
        SimplifiedQuestion {
            id: self.id,
            question: self.question.clone(),
        }
    }
}

/// Question as exposed to unauthenticated storefront visitors
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SimplifiedQuestion {
    pub id: Uuid,
    pub question: String,
}

/// Recorded screening answer, immutable once created
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = question_answers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuestionAnswer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub answer: String,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = question_answers)]
pub struct NewQuestionAnswer {
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub answer: String,
    pub is_correct: bool,
}

impl QuestionAnswer {
    pub async fn create(
        conn: &mut AsyncPgConnection,
        row: NewQuestionAnswer,
    ) -> QueryResult<Self> {
        use crate::schema::question_answers::dsl::*;

        diesel::insert_into(question_answers)
            .values(&row)
            .get_result::<QuestionAnswer>(conn)
            .await
    }

    /// Answers for a user joined to their (possibly trashed) questions
    pub async fn with_questions_for_user(
        conn: &mut AsyncPgConnection,
        user: Uuid,
    ) -> QueryResult<Vec<(Self, Option<CompanyQuestion>)>> {
        use crate::schema::company_questions;
        use crate::schema::question_answers::dsl::*;

        question_answers
            .left_join(company_questions::table)
            .filter(user_id.eq(user))
            .order(created_at.asc())
            .load::<(QuestionAnswer, Option<CompanyQuestion>)>(conn)
            .await
    }
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Replacement screening question submitted on settings update
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct QuestionInput {
    #[validate(length(min = 1, max = 1024, message = "Question must be 1-1024 characters"))]
    pub question: String,

    #[validate(length(min = 1, max = 1024, message = "Answer must be 1-1024 characters"))]
    pub correct_answer: String,
}

/// Tenant settings update. Every field optional; `questions`, when present,
/// replaces the full screening set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    pub domain: Option<String>,
    pub name: Option<String>,
    pub logo: Option<String>,
    pub general: Option<Json>,
    pub home_page: Option<Json>,
    pub about_page: Option<Json>,
    pub contact_page: Option<Json>,
    pub payment: Option<Json>,
    pub available_payment_methods: Option<Json>,
    pub mail_templates: Option<Json>,
    pub payout_tiers: Option<Json>,
    #[validate(range(min = 1, max = 5, message = "review_from must be a star rating"))]
    pub review_from: Option<i32>,
    #[validate(range(min = 0, message = "review_limit cannot be negative"))]
    pub review_limit: Option<i32>,
    pub exclude_brands: Option<Json>,
    pub api_mode: Option<String>,
    pub is_visible_limit: Option<bool>,
    pub products_to_display: Option<i32>,
    pub questions: Option<Vec<QuestionInput>>,
}

impl UpdateCompanyRequest {
    pub fn into_changeset(self) -> CompanyUpdate {
        CompanyUpdate {
            domain: self.domain.map(Some),
            name: self.name.map(Some),
            logo: self.logo.map(Some),
            general: self.general,
            home_page: self.home_page,
            about_page: self.about_page,
            contact_page: self.contact_page,
            payment: self.payment,
            available_payment_methods: self.available_payment_methods,
            mail_templates: self.mail_templates,
            payout_tiers: self.payout_tiers,
            review_from: self.review_from,
            review_limit: self.review_limit,
            exclude_brands: self.exclude_brands.map(Some),
            api_mode: self.api_mode,
            is_visible_limit: self.is_visible_limit,
            products_to_display: self.products_to_display,
            ..CompanyUpdate::default()
        }
    }
}

/// Visitor feedback relayed to the platform operator
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CompanyFeedbackRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 320))]
    pub email: Option<String>,
    #[validate(length(max = 8192))]
    pub message: Option<String>,
}

/// Public storefront subset of the tenant settings
#[derive(Debug, Clone, Serialize)]
pub struct PublicCompany {
    pub id: Uuid,
    pub logo: Option<String>,
    pub general: Json,
    pub home_page: Json,
    pub about_page: Json,
    pub contact_page: Json,
    pub available_payment_methods: Json,
    pub payment: Json,
    pub payout_tiers: Json,
}

impl From<&Company> for PublicCompany {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id,
            logo: company.logo.clone(),
            general: company.general.clone(),
            home_page: company.home_page.clone(),
            about_page: company.about_page.clone(),
            contact_page: company.contact_page.clone(),
            available_payment_methods: company.available_payment_methods.clone(),
            payment: company.payment.clone(),
            payout_tiers: company.payout_tiers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: &str) -> CompanyQuestion {
        CompanyQuestion {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            question: "Where did you buy?".to_string(),
            correct_answer: correct.to_string(),
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn answer_check_is_trimmed_and_case_insensitive() {
        let q = question("Amazon");
        assert!(q.is_correct_answer("amazon"));
        assert!(q.is_correct_answer("  AMAZON  "));
        assert!(!q.is_correct_answer("ebay"));
    }

    #[test]
    fn simplify_never_exposes_correct_answer() {
        let q = question("Amazon");
        let s = serde_json::to_value(q.simplify()).unwrap();
        assert!(s.get("correct_answer").is_none());
        assert_eq!(s["question"], "Where did you buy?");
    }

    #[test]
    fn excluded_brands_tolerates_missing_and_malformed() {
        let mut company = Company {
            id: Uuid::new_v4(),
            domain: None,
            name: None,
            logo: None,
            general: serde_json::json!({}),
            home_page: serde_json::json!({}),
            about_page: serde_json::json!({}),
            contact_page: serde_json::json!({}),
            payment: serde_json::json!({}),
            available_payment_methods: serde_json::json!([]),
            mail_templates: serde_json::json!({}),
            payout_tiers: serde_json::json!({}),
            review_from: 4,
            review_limit: 100,
            exclude_brands: None,
            api_mode: "live".to_string(),
            is_visible_limit: false,
            products_to_display: 25,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(company.excluded_brands().is_empty());
        // visible limit off falls back to the default of 10
        assert_eq!(company.campaign_display_limit(), 10);

        company.exclude_brands = Some(serde_json::json!(["Acme", 42, "Globex"]));
        assert_eq!(company.excluded_brands(), vec!["Acme", "Globex"]);

        company.is_visible_limit = true;
        assert_eq!(company.campaign_display_limit(), 25);
    }
}
