// Listing core: filter whitelists, escaping, pagination arithmetic

use revly_backend_core::services::user_directory::{
    resolve_filters, UserFilterField, UserSortField, ADMIN_WHITELIST, CUSTOMER_WHITELIST,
};
use revly_backend_core::utils::list_query::{
    contains_pattern, escape_like, FilterOp, ListQuery, RawFilter, SortDir,
};
use revly_backend_core::utils::service_error::ServiceError;

fn query_with_filters(filters: &str) -> ListQuery {
    ListQuery {
        page: None,
        per_page: None,
        sort: None,
        sort_dir: None,
        filters: Some(filters.to_string()),
        search: None,
    }
}

#[tokio::test]
async fn filters_decode_and_resolve_against_customer_whitelist() {
    let query = query_with_filters(
        r#"[{"key":"is_active","value":"true"},{"key":"email","value":"ann@"}]"#,
    );

    let resolved = resolve_filters(query.decode_filters().unwrap(), &CUSTOMER_WHITELIST).unwrap();

    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[0].field, UserFilterField::IsActive);
    assert_eq!(resolved[0].op, FilterOp::Exact);
    assert_eq!(resolved[1].field, UserFilterField::Email);
    assert_eq!(resolved[1].op, FilterOp::Contains);
}

#[tokio::test]
async fn unknown_filter_keys_are_rejected_not_dropped() {
    let query = query_with_filters(r#"[{"key":"password_hash","value":"x"}]"#);

    let err = resolve_filters(query.decode_filters().unwrap(), &CUSTOMER_WHITELIST).unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // A key whitelisted in one scope is still rejected in the other
    let query = query_with_filters(r#"[{"key":"domain","value":"acme"}]"#);
    assert!(resolve_filters(query.decode_filters().unwrap(), &CUSTOMER_WHITELIST).is_err());
    assert!(resolve_filters(query.decode_filters().unwrap(), &ADMIN_WHITELIST).is_ok());
}

#[tokio::test]
async fn malformed_filter_json_is_a_validation_error() {
    let query = query_with_filters("{broken");
    assert!(matches!(
        query.decode_filters(),
        Err(ServiceError::ValidationError(_))
    ));
}

#[tokio::test]
async fn wildcard_characters_are_escaped_literal() {
    // A caller-supplied "%" or "_" must not act as a wildcard
    assert_eq!(escape_like("100%"), "100\\%");
    assert_eq!(escape_like("a_b"), "a\\_b");
    assert_eq!(escape_like("c\\d"), "c\\\\d");

    // The contains pattern wraps only the escaped value
    assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
}

#[tokio::test]
async fn pagination_is_one_based_with_count_independent_skip() {
    let query = ListQuery {
        page: Some(4),
        per_page: Some(25),
        sort: None,
        sort_dir: None,
        filters: None,
        search: None,
    };

    assert_eq!(query.page_index(), 3);
    assert_eq!(query.limit(), 25);
    assert_eq!(query.offset(), 75);
}

#[tokio::test]
async fn sort_parsing_defaults_and_rejections() {
    assert_eq!(UserSortField::parse(None).unwrap(), UserSortField::Id);
    assert_eq!(
        UserSortField::parse(Some("created_at")).unwrap(),
        UserSortField::CreatedAt
    );
    assert!(UserSortField::parse(Some("secret_column")).is_err());

    assert_eq!(SortDir::parse(Some("ASC")), SortDir::Asc);
    assert_eq!(SortDir::parse(Some("whatever")), SortDir::Desc);
}

#[tokio::test]
async fn ordered_filter_sequence_is_preserved() {
    let query = query_with_filters(
        r#"[{"key":"name","value":"b"},{"key":"name","value":"a"},{"key":"id","value":"5e9c0a8e-0a1f-4cf9-b6dd-5d1f4f2a7b10"}]"#,
    );
    let raw: Vec<RawFilter> = query.decode_filters().unwrap();

    assert_eq!(raw[0].value, "b");
    assert_eq!(raw[1].value, "a");
    assert_eq!(raw[2].key, "id");
}
