//! SSD bearer token verification → claims + raw token in request extensions.
//!
//! Flow:
//! - read `Authorization`, falling back to `X-OpsMx-Auth`
//! - strip the `Bearer ` scheme and verify the token
//! - on success, publish claims and token for `claims_from_context` / `token_from_context`
//! - on any failure, answer 401 with a fixed body; the reason only goes to the log

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::{AuthRejection, VerifyError};
use crate::extractors::auth_ctx;
use crate::services::auth::{Claims, Verifier};

pub const FALLBACK_AUTH_HEADER: HeaderName = HeaderName::from_static("x-opsmx-auth");
pub const BEARER_PREFIX: &str = "Bearer ";

/// Protect every route of `router` with SSD token verification.
///
/// Example:
/// ```ignore
/// let verifier = ssd_jwt_auth::build_verifier(&VerifierConfig::from_env()?)?;
/// let api = middleware::auth::apply(api::routes(), verifier);
/// app = app.nest("/api/v1", api);
/// ```
pub fn apply<S>(router: Router<S>, verifier: Arc<Verifier>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(verifier, access_middleware))
}

pub async fn access_middleware(
    State(verifier): State<Arc<Verifier>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthRejection> {
    let (claims, token) = match authenticate(&verifier, req.headers()) {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(
                error = %err,
                kind = err.kind(),
                method = %req.method(),
                path = %req.uri().path(),
                "ssd token verification failed"
            );
            return Err(AuthRejection);
        }
    };

    // handed to handlers via extensions
    auth_ctx::insert(req.extensions_mut(), claims, &token);

    Ok(next.run(req).await)
}

/// Extract and verify the request's token without touching the request.
pub fn authenticate(
    verifier: &Verifier,
    headers: &HeaderMap,
) -> Result<(Claims, String), VerifyError> {
    let token = extract_token(headers)?;
    let claims = verifier.verify(token)?;
    Ok((claims, token.to_string()))
}

/// The token following `Bearer ` in `Authorization` or, when that is absent,
/// `X-OpsMx-Auth`. Empty when neither header is set.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, VerifyError> {
    let Some(value) =
        non_empty(headers, &header::AUTHORIZATION).or_else(|| non_empty(headers, &FALLBACK_AUTH_HEADER))
    else {
        return Ok("");
    };

    let value = value
        .to_str()
        .map_err(|_| VerifyError::malformed("authorization header is not visible ASCII"))?;

    value
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| VerifyError::malformed("authorization header does not use the Bearer scheme"))
}

fn non_empty<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a HeaderValue> {
    headers.get(name).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_static(*name),
                HeaderValue::from_static(*value),
            );
        }
        map
    }

    #[test]
    fn prefers_authorization_header() {
        let map = headers(&[
            ("authorization", "Bearer primary"),
            ("x-opsmx-auth", "Bearer fallback"),
        ]);
        assert_eq!(extract_token(&map).unwrap(), "primary");
    }

    #[test]
    fn falls_back_to_opsmx_header() {
        let map = headers(&[("x-opsmx-auth", "Bearer fallback")]);
        assert_eq!(extract_token(&map).unwrap(), "fallback");
    }

    #[test]
    fn empty_authorization_counts_as_absent() {
        let map = headers(&[("authorization", ""), ("x-opsmx-auth", "Bearer fallback")]);
        assert_eq!(extract_token(&map).unwrap(), "fallback");
    }

    #[test]
    fn no_headers_yield_empty_token() {
        assert_eq!(extract_token(&HeaderMap::new()).unwrap(), "");
    }

    #[test]
    fn wrong_scheme_is_malformed() {
        for value in ["Basic dXNlcjpwYXNz", "bearer lower", "Bearer", "token"] {
            let map = headers(&[("x-opsmx-auth", value)]);
            assert!(
                matches!(extract_token(&map), Err(VerifyError::MalformedToken(_))),
                "{value:?} should be rejected"
            );
        }
    }
}
