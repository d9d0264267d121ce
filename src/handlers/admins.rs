// Platform admin directory handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Host;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::company::{Company, NewCompany},
    models::user::{CreateAdminRequest, NewUser, UpdateUserRequest, User, UserUpdate},
    schema::{companies, users},
    services::tenant::identify_tenant,
    services::user_directory::list_admins,
    utils::list_query::ListQuery,
    utils::password::{hash_password, random_password},
    utils::service_error::{pool_error, ServiceError},
};

/// Admin row re-read with the owning tenant's domain
async fn admin_with_domain(
    conn: &mut AsyncPgConnection,
    admin_id: Uuid,
) -> Result<(User, Option<String>), diesel::result::Error> {
    users::table
        .inner_join(companies::table)
        .filter(users::id.eq(admin_id))
        .select((User::as_select(), companies::domain))
        .first::<(User, Option<String>)>(conn)
        .await
}

fn require_super_admin(auth_user: &AuthenticatedUser) -> Result<(), ServiceError> {
    if auth_user.is_super_admin {
        Ok(())
    } else {
        Err(ServiceError::AccessDenied)
    }
}

/// Paginated, filterable admin listing with joined tenant domains
/// GET /api/v1/admins
#[utoipa::path(
    get,
    path = "/v1/admins",
    tag = "Admins",
    operation_id = "listAdmins",
    params(ListQuery),
    responses(
        (status = 200, description = "{items, total_count}"),
        (status = 400, description = "Unknown filter/sort field or malformed filters"),
        (status = 403, description = "Caller is not a platform operator")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(params): Query<ListQuery>,
) -> impl IntoResponse {
    if let Err(e) = require_super_admin(&auth_user) {
        return e.into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    match list_admins(&mut conn, &params).await {
        Ok(page) => Json(json!({
            "items": page.items,
            "total_count": page.total_count,
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Admin detail view
/// GET /api/v1/admins/:id
#[utoipa::path(
    get,
    path = "/v1/admins/{id}",
    tag = "Admins",
    operation_id = "viewAdmin",
    params(("id" = Uuid, Path, description = "Admin user ID")),
    responses(
        (status = 200, description = "Admin user"),
        (status = 403, description = "Caller is not a platform operator"),
        (status = 404, description = "Unknown admin")
    ),
    security(("bearerAuth" = []))
)]
pub async fn view(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(e) = require_super_admin(&auth_user) {
        return e.into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    match User::find_by_id(&mut conn, user_id).await {
        Ok(user) => Json(json!({ "item": user })).into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Update an admin; the response row carries the tenant domain
/// PUT /api/v1/admins/:id
#[utoipa::path(
    put,
    path = "/v1/admins/{id}",
    tag = "Admins",
    operation_id = "updateAdmin",
    params(("id" = Uuid, Path, description = "Admin user ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated admin with tenant domain"),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Caller is not a platform operator")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    if let Err(e) = require_super_admin(&auth_user) {
        return e.into_response();
    }
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    if let Err(e) = User::update(&mut conn, user_id, request.into_changeset()).await {
        return ServiceError::from(e).into_response();
    }

    match admin_with_domain(&mut conn, user_id).await {
        Ok((user, domain)) => {
            let mut item = match serde_json::to_value(&user) {
                Ok(serde_json::Value::Object(map)) => map,
                _ => return ServiceError::InternalError.into_response(),
            };
            item.insert("domain".to_string(), json!(domain));
            Json(json!({ "item": item })).into_response()
        },
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Admin self-signup: a fresh tenant plus its first admin account
/// POST /api/v1/admins
#[utoipa::path(
    post,
    path = "/v1/admins",
    tag = "Admins",
    operation_id = "createAdmin",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Tenant and admin created"),
        (status = 404, description = "Unknown domain"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Host(host): Host,
    Json(request): Json<CreateAdminRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return ServiceError::from(e).into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    // Signup happens on the platform's own domain
    if let Err(e) = identify_tenant(&mut conn, &host).await {
        return e.into_response();
    }

    match User::find_by_email(&mut conn, &request.email).await {
        Ok(Some(_)) => {
            return ServiceError::Conflict(format!("User {} already exists", request.email))
                .into_response();
        },
        Ok(None) => {},
        Err(e) => return ServiceError::from(e).into_response(),
    }

    let company = match Company::create(&mut conn, NewCompany::default()).await {
        Ok(company) => company,
        Err(e) => return ServiceError::from(e).into_response(),
    };

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
            phone_number: None,
            convomat_user_id: request.convomat_user_id.clone(),
            payment_preference: None,
            is_admin: true,
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
        .notify_admin_created(&user, &request.password)
        .await;

    StatusCode::CREATED.into_response()
}

/// Remove an admin account
/// DELETE /api/v1/admins/:id
#[utoipa::path(
    delete,
    path = "/v1/admins/{id}",
    tag = "Admins",
    operation_id = "deleteAdmin",
    params(("id" = Uuid, Path, description = "Admin user ID")),
    responses(
        (status = 201, description = "Admin removed"),
        (status = 403, description = "Caller is not a platform operator")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(e) = require_super_admin(&auth_user) {
        return e.into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    match User::delete(&mut conn, user_id).await {
        Ok(_) => StatusCode::CREATED.into_response(),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// Generate and deliver a fresh random password for an admin
/// POST /api/v1/admins/:id/reset-password
#[utoipa::path(
    post,
    path = "/v1/admins/{id}/reset-password",
    tag = "Admins",
    operation_id = "resetAdminPassword",
    params(("id" = Uuid, Path, description = "Admin user ID")),
    responses(
        (status = 201, description = "Password reset and notification sent"),
        (status = 403, description = "Caller is not a platform operator")
    ),
    security(("bearerAuth" = []))
)]
pub async fn reset_password(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(e) = require_super_admin(&auth_user) {
        return e.into_response();
    }

    let mut conn = match state.diesel_pool.get().await {
        Ok(conn) => conn,
        Err(e) => return pool_error(e).into_response(),
    };

    let password = random_password(20);
    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(_) => return ServiceError::InternalError.into_response(),
    };

    let user = match User::update(
        &mut conn,
        user_id,
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
