// Host-based tenant resolution
// Every storefront request carries the tenant's domain in the Host header.

use diesel_async::AsyncPgConnection;
use tracing::instrument;

use crate::models::company::Company;
use crate::utils::service_error::ServiceError;

/// Strip an optional port from a Host header value
pub fn normalize_host(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

/// Resolve the tenant owning the request host, or fail with 404.
#[instrument(skip(conn))]
pub async fn identify_tenant(
    conn: &mut AsyncPgConnection,
    host: &str,
) -> Result<Company, ServiceError> {
    let domain = normalize_host(host);

    match Company::find_by_domain(conn, domain).await {
        Ok(Some(company)) => Ok(company),
        Ok(None) => Err(ServiceError::DomainNotFound),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_host_strips_port() {
        assert_eq!(normalize_host("shop.example.com:8443"), "shop.example.com");
        assert_eq!(normalize_host("shop.example.com"), "shop.example.com");
    }
}
