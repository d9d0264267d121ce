// Company (tenant) settings handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Host;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::json;
use tracing::warn;
use validator::Validate;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::company::{
        Company, CompanyFeedbackRequest, CompanyQuestion, NewCompanyQuestion, PublicCompany,
        UpdateCompanyRequest, ALLOWED_MAIL_ACTIONS, ALLOWED_MAIL_VARIABLES,
    },
    models::user::User,
    services::tenant::identify_tenant,
    utils::service_error::{pool_error, ServiceError},
};

/// Full tenant settings for the admin dashboard
/// GET /api/v1/company
#[utoipa::path(
    get,
    path = "/v1/company",
    tag = "Company",
    operation_id = "viewCompany",
    responses(
        (status = 200, description = "Tenant settings with screening questions"),
        (status = 403, description = "Actor does not belong to this tenant"),
        (status = 404, description = "Unknown domain")
    ),
    security(("bearerAuth" = []))
)]
pub async fn view(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Host(host): Host,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let company = match identify_tenant(&mut conn, &host).await {
        Ok(company) => company,
        Err(e) => return e.into_response(),
    };

    if auth_user.company_id != company.id {
        return ServiceError::AccessDenied.into_response();
    }

    let questions = match CompanyQuestion::for_company(&mut conn, company.id).await {
        Ok(questions) => questions,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let mut item = match serde_json::to_value(&company) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return ServiceError::InternalError.into_response(),
    };
    item.insert("questions".to_string(), json!(questions));
    item.insert(
        "allowed_mail_variables".to_string(),
        json!(ALLOWED_MAIL_VARIABLES),
    );
    item.insert(
        "allowed_mail_actions".to_string(),
        json!(ALLOWED_MAIL_ACTIONS),
    );

    Json(json!({ "item": item })).into_response()
}

/// Update tenant settings; a `questions` payload replaces the full
/// screening set (soft-delete old, recreate new).
/// PUT /api/v1/company
#[utoipa::path(
    put,
    path = "/v1/company",
    tag = "Company",
    operation_id = "updateCompany",
    responses(
        (status = 204, description = "Settings updated"),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Actor does not belong to this tenant"),
        (status = 404, description = "Unknown domain")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Host(host): Host,
    Json(request): Json<UpdateCompanyRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }
    if let Some(ref replacement) = request.questions {
        for question in replacement {
            if let Err(e) = question.validate() {
                return ServiceError::from(e).into_response();
            }
        }
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let company = match identify_tenant(&mut conn, &host).await {
        Ok(company) => company,
        Err(e) => return e.into_response(),
    };

    if auth_user.company_id != company.id || !auth_user.is_admin {
        return ServiceError::AccessDenied.into_response();
    }

    let questions = request.questions.clone();

    if let Err(e) = Company::update(&mut conn, company.id, request.into_changeset()).await {
        return ServiceError::from(e).into_response();
    }

    if let Some(replacement) = questions {
        if let Err(e) = CompanyQuestion::soft_delete_for_company(&mut conn, company.id).await {
            return ServiceError::from(e).into_response();
        }

        let rows = replacement
            .into_iter()
            .map(|q| NewCompanyQuestion {
                company_id: company.id,
                question: q.question,
                correct_answer: q.correct_answer,
            })
            .collect();

        if let Err(e) = CompanyQuestion::create_many(&mut conn, rows).await {
            return ServiceError::from(e).into_response();
        }
    }

    StatusCode::NO_CONTENT.into_response()
}

/// Public storefront subset of the tenant settings
/// GET /api/v1/company/current
#[utoipa::path(
    get,
    path = "/v1/company/current",
    tag = "Company",
    operation_id = "currentCompany",
    responses(
        (status = 200, description = "Storefront settings"),
        (status = 404, description = "Unknown domain")
    )
)]
pub async fn current(State(state): State<AppState>, Host(host): Host) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    match identify_tenant(&mut conn, &host).await {
        Ok(company) => {
            Json(json!({ "item": PublicCompany::from(&company) })).into_response()
        },
        Err(e) => e.into_response(),
    }
}

/// Screening questions shown during registration
/// GET /api/v1/company/questions
#[utoipa::path(
    get,
    path = "/v1/company/questions",
    tag = "Company",
    operation_id = "companyQuestions",
    responses(
        (status = 200, description = "Questions without their correct answers"),
        (status = 404, description = "Unknown domain")
    )
)]
pub async fn questions(State(state): State<AppState>, Host(host): Host) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let company = match identify_tenant(&mut conn, &host).await {
        Ok(company) => company,
        Err(e) => return e.into_response(),
    };

    match CompanyQuestion::for_company(&mut conn, company.id).await {
        Ok(questions) => {
            let items: Vec<_> = questions.iter().map(CompanyQuestion::simplify).collect();
            Json(json!({ "items": items })).into_response()
        },
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Relay storefront visitor feedback to the platform operator
/// POST /api/v1/company/feedback
#[utoipa::path(
    post,
    path = "/v1/company/feedback",
    tag = "Company",
    operation_id = "sendCompanyFeedback",
    request_body = CompanyFeedbackRequest,
    responses(
        (status = 200, description = "Relay result as {success, error?}"),
        (status = 404, description = "Unknown domain")
    )
)]
pub async fn send_feedback(
    State(state): State<AppState>,
    Host(host): Host,
    Json(request): Json<CompanyFeedbackRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    if let Err(e) = identify_tenant(&mut conn, &host).await {
        return e.into_response();
    }

    let name = request.name.unwrap_or_default();
    let email = request.email.unwrap_or_default();
    let message = request.message.unwrap_or_default();

    // The platform operator receives the relay
    let operator = {
        use crate::schema::users::dsl::*;
        users
            .filter(is_super_admin.eq(true))
            .order(created_at.asc())
            .first::<User>(&mut conn)
            .await
    };

    let operator = match operator {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    match state
        .notifications
        .send_company_feedback(&operator, &name, &email, &message)
        .await
    {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => {
            warn!("Company feedback relay failed: {}", e);
            Json(json!({ "success": false, "error": e.to_string() })).into_response()
        },
    }
}
