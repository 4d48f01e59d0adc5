use crate::{error::PurchaseError, handlers::AppState};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

/// Guards routes that spend from the purchasing account.
pub async fn require_purchase_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, PurchaseError> {
    authorize(state.api_key.as_deref(), &request)?;
    Ok(next.run(request).await)
}

/// Guards routes that sign as the contract owner.
pub async fn require_admin_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, PurchaseError> {
    authorize(state.admin_api_key.as_deref(), &request)?;
    Ok(next.run(request).await)
}

fn authorize(expected: Option<&str>, request: &Request) -> Result<(), PurchaseError> {
    let Some(expected) = expected else {
        return Err(PurchaseError::Unauthorized(
            "no API key configured for this route".to_string(),
        ));
    };

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| PurchaseError::Unauthorized("missing bearer token".to_string()))?;

    if !keys_match(presented.trim().as_bytes(), expected.as_bytes()) {
        tracing::warn!(path = %request.uri().path(), "Rejected request with wrong API key");
        return Err(PurchaseError::Unauthorized("invalid API key".to_string()));
    }

    Ok(())
}

/// Compares without stopping at the first differing byte.
fn keys_match(presented: &[u8], expected: &[u8]) -> bool {
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http};

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/api/purchase");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn accepts_matching_bearer_token() {
        assert!(authorize(Some("secret"), &request(Some("Bearer secret"))).is_ok());
    }

    #[test]
    fn rejects_missing_wrong_or_unconfigured_keys() {
        for (expected, header) in [
            (Some("secret"), None),
            (Some("secret"), Some("Bearer secreT")),
            (Some("secret"), Some("Bearer secret-longer")),
            (Some("secret"), Some("Basic secret")),
            (None, Some("Bearer secret")),
        ] {
            assert!(
                matches!(
                    authorize(expected, &request(header)),
                    Err(PurchaseError::Unauthorized(_))
                ),
                "{header:?} accepted"
            );
        }
    }
}
