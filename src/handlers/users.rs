// Customer directory handlers (tenant scope)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Host;
use diesel_async::AsyncPgConnection;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::company::{CompanyQuestion, NewQuestionAnswer, QuestionAnswer},
    models::order::Order,
    models::user::{
        can_manage, AnsweredQuestion, CreateUserRequest, LinkAmazonRequest, NewUser,
        RegisterRequest, UpdateUserRequest, User, UserUpdate,
    },
    services::tenant::identify_tenant,
    services::user_directory::list_customers,
    utils::list_query::ListQuery,
    utils::password::{hash_password, random_password},
    utils::service_error::{pool_error, ServiceError},
};

/// Load actor and target and enforce the directory access predicate
async fn load_managed_pair(
    conn: &mut AsyncPgConnection,
    actor_id: Uuid,
    target_id: Uuid,
) -> Result<(User, User), ServiceError> {
    let actor = User::find_by_id(conn, actor_id).await?;
    let target = User::find_by_id(conn, target_id).await?;

    if !can_manage(&actor, &target) {
        return Err(ServiceError::AccessDenied);
    }

    Ok((actor, target))
}

/// Paginated, filterable customer listing
/// GET /api/v1/users
#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "Users",
    operation_id = "listUsers",
    params(ListQuery),
    responses(
        (status = 200, description = "{items, total_count}"),
        (status = 400, description = "Unknown filter/sort field or malformed filters")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(params): Query<ListQuery>,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    match list_customers(&mut conn, auth_user.company_id, &params).await {
        Ok(page) => Json(json!({
            "items": page.items,
            "total_count": page.total_count,
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// The authenticated user's own record
/// GET /api/v1/users/current
#[utoipa::path(
    get,
    path = "/v1/users/current",
    tag = "Users",
    operation_id = "currentUser",
    responses((status = 200, description = "Authenticated user")),
    security(("bearerAuth" = []))
)]
pub async fn current(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    match User::find_by_id(&mut conn, auth_user.user_id).await {
        Ok(user) => Json(json!({ "item": user })).into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Customer detail view with screening answers and order counters
/// GET /api/v1/users/:id
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    tag = "Users",
    operation_id = "viewUser",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Customer detail"),
        (status = 403, description = "Admin-level or cross-tenant target"),
        (status = 404, description = "Unknown user")
    ),
    security(("bearerAuth" = []))
)]
pub async fn view(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let (_, target) = match load_managed_pair(&mut conn, auth_user.user_id, user_id).await {
        Ok(pair) => pair,
        Err(e) => return e.into_response(),
    };

    let answers = match QuestionAnswer::with_questions_for_user(&mut conn, target.id).await {
        Ok(answers) => answers,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let map_questions: Vec<AnsweredQuestion> = answers
        .into_iter()
        .map(|(answer, question)| AnsweredQuestion {
            question: question.map(|q| q.question),
            answer: answer.answer,
        })
        .collect();

    let product_purchased = match Order::count_for_user(&mut conn, target.id).await {
        Ok(count) => count,
        Err(e) => return ServiceError::from(e).into_response(),
    };
    let count_feedbacks = match Order::done_count_for_user(&mut conn, target.id).await {
        Ok(count) => count,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let mut item = match serde_json::to_value(&target) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return ServiceError::InternalError.into_response(),
    };
    item.insert("map_questions".to_string(), json!(map_questions));
    item.insert("product_purchased".to_string(), json!(product_purchased));
    item.insert("count_feedbacks".to_string(), json!(count_feedbacks));

    Json(json!({ "item": item })).into_response()
}

/// Partial update of a customer record
/// PUT /api/v1/users/:id
#[utoipa::path(
    put,
    path = "/v1/users/{id}",
    tag = "Users",
    operation_id = "updateUser",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user"),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin-level or cross-tenant target")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }
    if let Err(e) = request.validated_preference() {
        return ServiceError::ValidationError(e).into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let (_, target) = match load_managed_pair(&mut conn, auth_user.user_id, user_id).await {
        Ok(pair) => pair,
        Err(e) => return e.into_response(),
    };

    match User::update(&mut conn, target.id, request.into_changeset()).await {
        Ok(user) => Json(json!({ "item": user })).into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Public self-registration on a tenant storefront. Screening answers are
/// recorded against their (possibly since-replaced) questions; any wrong
/// answer leaves the account inactive pending manual approval.
/// POST /api/v1/users/register
#[utoipa::path(
    post,
    path = "/v1/users/register",
    tag = "Users",
    operation_id = "registerUser",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered user"),
        (status = 404, description = "Unknown domain or question"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Host(host): Host,
    Json(request): Json<RegisterRequest>,
) -> impl IntoResponse {
    use std::str::FromStr;

    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }
    if let Some(ref preference) = request.payment_preference {
        if let Err(e) = crate::models::user::PaymentPreference::from_str(preference) {
            return ServiceError::ValidationError(e).into_response();
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

    match User::find_by_email(&mut conn, &request.email).await {
        Ok(Some(_)) => {
            return ServiceError::Conflict(format!("User {} already exists", request.email))
                .into_response();
        },
        Ok(None) => {},
        Err(e) => return ServiceError::from(e).into_response(),
    }

    let password = random_password(10);
    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(_) => return ServiceError::InternalError.into_response(),
    };

    let user = match User::create(
        &mut conn,
        NewUser {
            company_id: company.id,
            email: request.email.clone(),
            password_hash,
            name: request.name.clone(),
            phone_number: request.phone_number.clone(),
            convomat_user_id: None,
            payment_preference: request.payment_preference.clone(),
            is_admin: false,
            is_super_admin: false,
            is_active: false,
        },
    )
    .await
    {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let mut qualified = true;
    for submission in &request.answers {
        let question =
            match CompanyQuestion::find_with_trashed(&mut conn, submission.question_id).await {
                Ok(question) => question,
                Err(e) => return ServiceError::from(e).into_response(),
            };

        let correct = question.is_correct_answer(&submission.answer);
        if !correct {
            qualified = false;
        }

        if let Err(e) = QuestionAnswer::create(
            &mut conn,
            NewQuestionAnswer {
                user_id: user.id,
                question_id: question.id,
                answer: submission.answer.clone(),
                is_correct: correct,
            },
        )
        .await
        {
            return ServiceError::from(e).into_response();
        }
    }

    let user = if qualified {
        let activated = match User::update(
            &mut conn,
            user.id,
            UserUpdate {
                is_active: Some(true),
                ..UserUpdate::default()
            },
        )
        .await
        {
            Ok(user) => user,
            Err(e) => return ServiceError::from(e).into_response(),
        };

        state
            .notifications
            .notify_from_template(&company, &activated, "welcome_qualified_user")
            .await;
        activated
    } else {
        state
            .notifications
            .notify_from_template(&company, &user, "welcome_non_qualified_user")
            .await;
        user
    };

    Json(json!({ "item": user })).into_response()
}

/// Admin creating an active customer account directly
/// POST /api/v1/users
#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "Users",
    operation_id = "createUser",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Customer created"),
        (status = 404, description = "Unknown domain"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Host(host): Host,
    Json(request): Json<CreateUserRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }

    if !auth_user.is_admin {
        return ServiceError::AccessDenied.into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let company = match identify_tenant(&mut conn, &host).await {
        Ok(company) => company,
        Err(e) => return e.into_response(),
    };

    match User::find_by_email(&mut conn, &request.email).await {
        Ok(Some(_)) => {
            return ServiceError::Conflict(format!("User {} already exists", request.email))
                .into_response();
        },
        Ok(None) => {},
        Err(e) => return ServiceError::from(e).into_response(),
    }

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(_) => return ServiceError::InternalError.into_response(),
    };

    let user = match User::create(
        &mut conn,
        NewUser {
            company_id: company.id,
            email: request.email.clone(),
            password_hash,
            name: request.name.clone(),
            phone_number: request.phone_number.clone(),
            convomat_user_id: None,
            payment_preference: None,
            is_admin: false,
            is_super_admin: false,
            is_active: true,
        },
    )
    .await
    {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    state
        .notifications
        .notify_from_template(&company, &user, "email_welcome_new_customer_created_by_admin")
        .await;

    StatusCode::CREATED.into_response()
}

/// Remove a customer; a still-inactive account gets the declined
/// questionnaire notification first.
/// DELETE /api/v1/users/:id
#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 201, description = "Customer removed"),
        (status = 403, description = "Admin-level or cross-tenant target"),
        (status = 404, description = "Unknown user")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let (_, target) = match load_managed_pair(&mut conn, auth_user.user_id, user_id).await {
        Ok(pair) => pair,
        Err(e) => return e.into_response(),
    };

    if !target.is_active {
        let company =
            match crate::models::company::Company::find_by_id(&mut conn, target.company_id).await {
                Ok(company) => company,
                Err(e) => return ServiceError::from(e).into_response(),
            };

        state
            .notifications
            .notify_from_template(&company, &target, "declined_user_questionnaire")
            .await;
    }

    match User::delete(&mut conn, target.id).await {
        Ok(_) => StatusCode::CREATED.into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Flip the ban flag
/// POST /api/v1/users/:id/ban
#[utoipa::path(
    post,
    path = "/v1/users/{id}/ban",
    tag = "Users",
    operation_id = "banUser",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User with toggled ban flag"),
        (status = 403, description = "Admin-level or cross-tenant target")
    ),
    security(("bearerAuth" = []))
)]
pub async fn ban(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let (_, target) = match load_managed_pair(&mut conn, auth_user.user_id, user_id).await {
        Ok(pair) => pair,
        Err(e) => return e.into_response(),
    };

    match User::update(
        &mut conn,
        target.id,
        UserUpdate {
            is_banned: Some(!target.is_banned),
            ..UserUpdate::default()
        },
    )
    .await
    {
        Ok(user) => Json(json!({ "item": user })).into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Approve a pending customer: only inactive AND not-banned accounts
/// transition; everything else is a no-op echo.
/// POST /api/v1/users/:id/approve
#[utoipa::path(
    post,
    path = "/v1/users/{id}/approve",
    tag = "Users",
    operation_id = "approveUser",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User, activated when the transition applied"),
        (status = 403, description = "Admin-level or cross-tenant target")
    ),
    security(("bearerAuth" = []))
)]
pub async fn approve(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let (_, target) = match load_managed_pair(&mut conn, auth_user.user_id, user_id).await {
        Ok(pair) => pair,
        Err(e) => return e.into_response(),
    };

    if target.is_active || target.is_banned {
        return Json(json!({ "item": target })).into_response();
    }

    let user = match User::update(
        &mut conn,
        target.id,
        UserUpdate {
            is_active: Some(true),
            ..UserUpdate::default()
        },
    )
    .await
    {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let company = match crate::models::company::Company::find_by_id(&mut conn, user.company_id).await
    {
        Ok(company) => company,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    state
        .notifications
        .notify_from_template(&company, &user, "approved_user_questionnaire")
        .await;

    Json(json!({ "item": user })).into_response()
}

/// Generate and deliver a fresh random password
/// POST /api/v1/users/:id/reset-password
#[utoipa::path(
    post,
    path = "/v1/users/{id}/reset-password",
    tag = "Users",
    operation_id = "resetUserPassword",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 201, description = "Password reset and notification sent"),
        (status = 403, description = "Admin-level or cross-tenant target")
    ),
    security(("bearerAuth" = []))
)]
pub async fn reset_password(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let (_, target) = match load_managed_pair(&mut conn, auth_user.user_id, user_id).await {
        Ok(pair) => pair,
        Err(e) => return e.into_response(),
    };

    let password = random_password(20);
    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(_) => return ServiceError::InternalError.into_response(),
    };

    let user = match User::update(
        &mut conn,
        target.id,
        UserUpdate {
            password_hash: Some(password_hash),
            ..UserUpdate::default()
        },
    )
    .await
    {
        Ok(user) => user,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    state.notifications.notify_password_changed(&user, &password).await;

    StatusCode::CREATED.into_response()
}

/// Resolve and link an external review profile to the calling user
/// POST /api/v1/users/link-amazon
#[utoipa::path(
    post,
    path = "/v1/users/link-amazon",
    tag = "Users",
    operation_id = "linkAmazonProfile",
    request_body = LinkAmazonRequest,
    responses(
        (status = 200, description = "User with linked profile"),
        (status = 400, description = "Profile URL did not resolve")
    ),
    security(("bearerAuth" = []))
)]
pub async fn link_amazon(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(request): Json<LinkAmazonRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let profile = match state
        .convomat
        .get_amazon_profile_by_url(&request.amazon_profile_url)
        .await
    {
        Ok(profile) => profile,
        Err(e) => return ServiceError::from(e).into_response(),
    };

    let profile_id = match profile.user_id.filter(|u| !u.is_empty()) {
        Some(uid) => uid,
        None => {
            return ServiceError::GatewayRejected("Amazon profile not found.".to_string())
                .into_response();
        },
    };

    match User::update(
        &mut conn,
        auth_user.user_id,
        UserUpdate {
            amazon_id: Some(Some(profile_id)),
            ..UserUpdate::default()
        },
    )
    .await
    {
        Ok(user) => Json(json!({ "item": user })).into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}
