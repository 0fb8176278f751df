use axum::http::HeaderMap;
use kasira_domain::AuditMetadata;

/// Captures the client address and user agent recorded with audit entries.
pub(crate) fn extract_request_context(headers: &HeaderMap) -> AuditMetadata {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    let user_agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    AuditMetadata { ip, user_agent }
}
