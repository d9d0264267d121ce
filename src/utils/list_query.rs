// Generic list endpoint parameters: filters, search, sort, pagination
//
// Filters arrive JSON-encoded in the query string as an ordered array of
// {key, value} pairs. Keys are resolved against a per-entity whitelist at
// the boundary; unknown keys are rejected rather than silently dropped.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::utils::service_error::ServiceError;

pub const DEFAULT_PER_PAGE: i64 = 10;

/// Query-string parameters shared by every list endpoint
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Sort field, defaults to the primary key
    pub sort: Option<String>,
    pub sort_dir: Option<String>,
    /// JSON-encoded array of {key, value} filter pairs
    pub filters: Option<String>,
    /// Free-text substring search
    pub search: Option<String>,
}

/// A single decoded filter pair, not yet resolved against a whitelist
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawFilter {
    pub key: String,
    pub value: String,
}

/// Match mode assigned to a filter key by the entity whitelist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Exact,
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    /// Case-insensitive "asc" sorts ascending; anything else descending,
    /// matching the storage engine default the original relied on.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortDir::Asc,
            _ => SortDir::Desc,
        }
    }
}

impl ListQuery {
    /// Zero-based page index derived from the 1-based input page number
    pub fn page_index(&self) -> i64 {
        (self.page.unwrap_or(1) - 1).max(0)
    }

    pub fn limit(&self) -> i64 {
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if per_page < 1 {
            DEFAULT_PER_PAGE
        } else {
            per_page
        }
    }

    pub fn offset(&self) -> i64 {
        self.limit() * self.page_index()
    }

    pub fn sort_dir(&self) -> SortDir {
        SortDir::parse(self.sort_dir.as_deref())
    }

    /// Decode the JSON filters parameter. An absent or empty parameter is
    /// an empty filter set; malformed JSON is a validation error.
    pub fn decode_filters(&self) -> Result<Vec<RawFilter>, ServiceError> {
        match self.filters.as_deref() {
            None | Some("") => Ok(Vec::new()),
            Some(raw) => serde_json::from_str::<Vec<RawFilter>>(raw)
                .map_err(|e| ServiceError::ValidationError(format!("Malformed filters: {}", e))),
        }
    }
}

/// Escape the three wildcard-significant characters so a caller-supplied
/// value is matched literally inside a LIKE pattern.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(ch);
            },
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// LIKE pattern matching anywhere in the column
pub fn contains_pattern(raw: &str) -> String {
    format!("%{}%", escape_like(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, per_page: Option<i64>) -> ListQuery {
        ListQuery {
            page,
            per_page,
            sort: None,
            sort_dir: None,
            filters: None,
            search: None,
        }
    }

    #[test]
    fn pagination_is_one_based() {
        let q = query(Some(1), Some(10));
        assert_eq!(q.offset(), 0);
        assert_eq!(q.limit(), 10);

        let q = query(Some(3), Some(25));
        assert_eq!(q.offset(), 50);
        assert_eq!(q.limit(), 25);
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let q = query(None, None);
        assert_eq!(q.page_index(), 0);
        assert_eq!(q.limit(), DEFAULT_PER_PAGE);

        // page 0 and negative pages clamp to the first page
        assert_eq!(query(Some(0), None).page_index(), 0);
        assert_eq!(query(Some(-4), None).page_index(), 0);
        assert_eq!(query(None, Some(-1)).limit(), DEFAULT_PER_PAGE);
    }

    #[test]
    fn sort_dir_is_case_insensitive_and_defaults_desc() {
        assert_eq!(SortDir::parse(Some("asc")), SortDir::Asc);
        assert_eq!(SortDir::parse(Some("ASC")), SortDir::Asc);
        assert_eq!(SortDir::parse(Some("desc")), SortDir::Desc);
        assert_eq!(SortDir::parse(Some("sideways")), SortDir::Desc);
        assert_eq!(SortDir::parse(None), SortDir::Desc);
    }

    #[test]
    fn escape_like_renders_wildcards_literal() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn decode_filters_accepts_ordered_pairs() {
        let mut q = query(None, None);
        q.filters = Some(r#"[{"key":"name","value":"ann"},{"key":"id","value":"7"}]"#.to_string());
        let filters = q.decode_filters().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].key, "name");
        assert_eq!(filters[1].value, "7");
    }

    #[test]
    fn decode_filters_rejects_malformed_json() {
        let mut q = query(None, None);
        q.filters = Some("{not json".to_string());
        assert!(matches!(
            q.decode_filters(),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn decode_filters_empty_is_no_filters() {
        let mut q = query(None, None);
        assert!(q.decode_filters().unwrap().is_empty());
        q.filters = Some(String::new());
        assert!(q.decode_filters().unwrap().is_empty());
    }
}
