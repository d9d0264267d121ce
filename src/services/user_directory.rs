// User directory listing core
// One generic filter/search/sort/paginate pipeline with two scopes:
// tenant customers and platform admins (the latter enriched with the
// owning tenant's domain through a companies join).

use diesel::dsl::{InnerJoin, IntoBoxed};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use uuid::Uuid;

use crate::models::user::User;
use crate::schema::{companies, users};
use crate::utils::list_query::{contains_pattern, FilterOp, ListQuery, RawFilter, SortDir};
use crate::utils::service_error::ServiceError;

/// Filterable/sortable user directory columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFilterField {
    Id,
    IsActive,
    Name,
    PhoneNumber,
    Email,
    ConvomatUserId,
    Domain,
}

impl UserFilterField {
    fn parse(key: &str) -> Option<Self> {
        match key {
            "id" => Some(UserFilterField::Id),
            "is_active" => Some(UserFilterField::IsActive),
            "name" => Some(UserFilterField::Name),
            "phone_number" => Some(UserFilterField::PhoneNumber),
            "email" => Some(UserFilterField::Email),
            "convomat_user_id" => Some(UserFilterField::ConvomatUserId),
            "domain" => Some(UserFilterField::Domain),
            _ => None,
        }
    }
}

/// Per-scope whitelist: which fields match exactly and which by substring
#[derive(Debug, Clone, Copy)]
pub struct FilterWhitelist {
    pub exact: &'static [UserFilterField],
    pub contains: &'static [UserFilterField],
}

pub const CUSTOMER_WHITELIST: FilterWhitelist = FilterWhitelist {
    exact: &[UserFilterField::Id, UserFilterField::IsActive],
    contains: &[
        UserFilterField::Name,
        UserFilterField::PhoneNumber,
        UserFilterField::Email,
    ],
};

pub const ADMIN_WHITELIST: FilterWhitelist = FilterWhitelist {
    exact: &[UserFilterField::Id],
    contains: &[
        UserFilterField::Name,
        UserFilterField::ConvomatUserId,
        UserFilterField::PhoneNumber,
        UserFilterField::Email,
        UserFilterField::Domain,
    ],
};

/// Filter pair resolved against a whitelist
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub field: UserFilterField,
    pub op: FilterOp,
    pub value: String,
}

/// Resolve raw {key, value} pairs against a scope whitelist. Unknown keys
/// are rejected at the boundary instead of being silently dropped.
pub fn resolve_filters(
    raw: Vec<RawFilter>,
    whitelist: &FilterWhitelist,
) -> Result<Vec<ResolvedFilter>, ServiceError> {
    raw.into_iter()
        .map(|filter| {
            let field = UserFilterField::parse(&filter.key).ok_or_else(|| {
                ServiceError::ValidationError(format!("Unknown filter field: {}", filter.key))
            })?;

            let op = if whitelist.exact.contains(&field) {
                FilterOp::Exact
            } else if whitelist.contains.contains(&field) {
                FilterOp::Contains
            } else {
                return Err(ServiceError::ValidationError(format!(
                    "Unknown filter field: {}",
                    filter.key
                )));
            };

            Ok(ResolvedFilter {
                field,
                op,
                value: filter.value,
            })
        })
        .collect()
}

/// Sortable columns; the primary key is the default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Id,
    Name,
    Email,
    CreatedAt,
}

impl UserSortField {
    pub fn parse(raw: Option<&str>) -> Result<Self, ServiceError> {
        match raw {
            None | Some("") | Some("id") => Ok(UserSortField::Id),
            Some("name") => Ok(UserSortField::Name),
            Some("email") => Ok(UserSortField::Email),
            Some("created_at") => Ok(UserSortField::CreatedAt),
            Some(other) => Err(ServiceError::ValidationError(format!(
                "Unknown sort field: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerPage {
    pub items: Vec<User>,
    pub total_count: i64,
}

/// Admin directory row enriched with the owning tenant's domain
#[derive(Debug, Serialize)]
pub struct AdminRow {
    #[serde(flatten)]
    pub user: User,
    pub domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminPage {
    pub items: Vec<AdminRow>,
    pub total_count: i64,
}

type BoxedCustomerQuery<'a> = users::BoxedQuery<'a, Pg>;
type BoxedAdminQuery<'a> = IntoBoxed<'a, InnerJoin<users::table, companies::table>, Pg>;

fn parse_uuid(value: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(value)
        .map_err(|_| ServiceError::ValidationError(format!("Invalid id filter: {}", value)))
}

fn parse_bool(value: &str) -> Result<bool, ServiceError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ServiceError::ValidationError(format!(
            "Invalid boolean filter: {}",
            other
        ))),
    }
}

fn customer_base(company: Uuid) -> BoxedCustomerQuery<'static> {
    users::table
        .into_boxed()
        .filter(users::is_admin.eq(false))
        .filter(users::company_id.eq(company))
}

fn apply_customer_filters(
    mut query: BoxedCustomerQuery<'static>,
    filters: &[ResolvedFilter],
    search: Option<&str>,
) -> Result<BoxedCustomerQuery<'static>, ServiceError> {
    for filter in filters {
        query = match filter.field {
            UserFilterField::Id => query.filter(users::id.eq(parse_uuid(&filter.value)?)),
            UserFilterField::IsActive => {
                query.filter(users::is_active.eq(parse_bool(&filter.value)?))
            },
            UserFilterField::Name => {
                query.filter(users::name.like(contains_pattern(&filter.value)))
            },
            UserFilterField::PhoneNumber => {
                query.filter(users::phone_number.like(contains_pattern(&filter.value)))
            },
            UserFilterField::Email => {
                query.filter(users::email.like(contains_pattern(&filter.value)))
            },
            // Whitelist resolution keeps these out of the customer scope
            UserFilterField::ConvomatUserId | UserFilterField::Domain => query,
        };
    }

    if let Some(term) = search.filter(|t| !t.is_empty()) {
        let pattern = contains_pattern(term);
        query = query.filter(
            users::name
                .like(pattern.clone())
                .or(users::convomat_user_id.like(pattern)),
        );
    }

    Ok(query)
}

fn order_customer_query(
    query: BoxedCustomerQuery<'static>,
    sort: UserSortField,
    dir: SortDir,
) -> BoxedCustomerQuery<'static> {
    match (sort, dir) {
        (UserSortField::Id, SortDir::Asc) => query.order(users::id.asc()),
        (UserSortField::Id, SortDir::Desc) => query.order(users::id.desc()),
        (UserSortField::Name, SortDir::Asc) => query.order(users::name.asc()),
        (UserSortField::Name, SortDir::Desc) => query.order(users::name.desc()),
        (UserSortField::Email, SortDir::Asc) => query.order(users::email.asc()),
        (UserSortField::Email, SortDir::Desc) => query.order(users::email.desc()),
        (UserSortField::CreatedAt, SortDir::Asc) => query.order(users::created_at.asc()),
        (UserSortField::CreatedAt, SortDir::Desc) => query.order(users::created_at.desc()),
    }
}

/// Customer listing scoped to one tenant.
/// The total count runs against the filtered/searched query before
/// limit/offset are applied (rebuild query for count).
pub async fn list_customers(
    conn: &mut AsyncPgConnection,
    company: Uuid,
    params: &ListQuery,
) -> Result<CustomerPage, ServiceError> {
    let filters = resolve_filters(params.decode_filters()?, &CUSTOMER_WHITELIST)?;
    let sort = UserSortField::parse(params.sort.as_deref())?;

    let count_query =
        apply_customer_filters(customer_base(company), &filters, params.search.as_deref())?;
    let total_count = count_query.count().get_result::<i64>(conn).await?;

    let query =
        apply_customer_filters(customer_base(company), &filters, params.search.as_deref())?;
    let items = order_customer_query(query, sort, params.sort_dir())
        .limit(params.limit())
        .offset(params.offset())
        .load::<User>(conn)
        .await?;

    Ok(CustomerPage { items, total_count })
}

fn admin_base() -> BoxedAdminQuery<'static> {
    users::table
        .inner_join(companies::table)
        .into_boxed()
        .filter(users::is_admin.eq(true))
}

fn apply_admin_filters(
    mut query: BoxedAdminQuery<'static>,
    filters: &[ResolvedFilter],
    search: Option<&str>,
) -> Result<BoxedAdminQuery<'static>, ServiceError> {
    for filter in filters {
        query = match filter.field {
            UserFilterField::Id => query.filter(users::id.eq(parse_uuid(&filter.value)?)),
            UserFilterField::Name => {
                query.filter(users::name.like(contains_pattern(&filter.value)))
            },
            UserFilterField::ConvomatUserId => {
                query.filter(users::convomat_user_id.like(contains_pattern(&filter.value)))
            },
            UserFilterField::PhoneNumber => {
                query.filter(users::phone_number.like(contains_pattern(&filter.value)))
            },
            UserFilterField::Email => {
                query.filter(users::email.like(contains_pattern(&filter.value)))
            },
            UserFilterField::Domain => {
                query.filter(companies::domain.like(contains_pattern(&filter.value)))
            },
            // Whitelist resolution keeps this out of the admin scope
            UserFilterField::IsActive => query,
        };
    }

    if let Some(term) = search.filter(|t| !t.is_empty()) {
        let pattern = contains_pattern(term);
        query = query.filter(
            users::name
                .like(pattern.clone())
                .or(users::convomat_user_id.like(pattern)),
        );
    }

    Ok(query)
}

fn order_admin_query(
    query: BoxedAdminQuery<'static>,
    sort: UserSortField,
    dir: SortDir,
) -> BoxedAdminQuery<'static> {
    match (sort, dir) {
        (UserSortField::Id, SortDir::Asc) => query.order(users::id.asc()),
        (UserSortField::Id, SortDir::Desc) => query.order(users::id.desc()),
        (UserSortField::Name, SortDir::Asc) => query.order(users::name.asc()),
        (UserSortField::Name, SortDir::Desc) => query.order(users::name.desc()),
        (UserSortField::Email, SortDir::Asc) => query.order(users::email.asc()),
        (UserSortField::Email, SortDir::Desc) => query.order(users::email.desc()),
        (UserSortField::CreatedAt, SortDir::Asc) => query.order(users::created_at.asc()),
        (UserSortField::CreatedAt, SortDir::Desc) => query.order(users::created_at.desc()),
    }
}

/// Platform admin listing, each row joined to its tenant's domain.
pub async fn list_admins(
    conn: &mut AsyncPgConnection,
    params: &ListQuery,
) -> Result<AdminPage, ServiceError> {
    let filters = resolve_filters(params.decode_filters()?, &ADMIN_WHITELIST)?;
    let sort = UserSortField::parse(params.sort.as_deref())?;

    let count_query = apply_admin_filters(admin_base(), &filters, params.search.as_deref())?;
    let total_count = count_query.count().get_result::<i64>(conn).await?;

    let query = apply_admin_filters(admin_base(), &filters, params.search.as_deref())?;
    let rows = order_admin_query(query, sort, params.sort_dir())
        .limit(params.limit())
        .offset(params.offset())
        .select((User::as_select(), companies::domain))
        .load::<(User, Option<String>)>(conn)
        .await?;

    let items = rows
        .into_iter()
        .map(|(user, domain)| AdminRow { user, domain })
        .collect();

    Ok(AdminPage { items, total_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(key: &str, value: &str) -> RawFilter {
        RawFilter {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn whitelist_assigns_match_mode() {
        let resolved = resolve_filters(
            vec![raw("is_active", "true"), raw("name", "ann")],
            &CUSTOMER_WHITELIST,
        )
        .unwrap();

        assert_eq!(resolved[0].op, FilterOp::Exact);
        assert_eq!(resolved[0].field, UserFilterField::IsActive);
        assert_eq!(resolved[1].op, FilterOp::Contains);
        assert_eq!(resolved[1].field, UserFilterField::Name);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = resolve_filters(vec![raw("password_hash", "x")], &CUSTOMER_WHITELIST)
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));

        // Known field but outside this scope's whitelist
        let err = resolve_filters(vec![raw("domain", "acme")], &CUSTOMER_WHITELIST).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));

        // Same key is legal in the admin scope
        let ok = resolve_filters(vec![raw("domain", "acme")], &ADMIN_WHITELIST).unwrap();
        assert_eq!(ok[0].op, FilterOp::Contains);
    }

    #[test]
    fn is_active_is_exact_only_for_customers() {
        assert!(resolve_filters(vec![raw("is_active", "1")], &ADMIN_WHITELIST).is_err());
    }

    #[test]
    fn sort_field_defaults_to_primary_key() {
        assert_eq!(UserSortField::parse(None).unwrap(), UserSortField::Id);
        assert_eq!(UserSortField::parse(Some("")).unwrap(), UserSortField::Id);
        assert_eq!(
            UserSortField::parse(Some("name")).unwrap(),
            UserSortField::Name
        );
        assert!(UserSortField::parse(Some("password_hash")).is_err());
    }

    #[test]
    fn bool_filter_parsing() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("yes").is_err());
    }
}
