use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use log::warn;
use sha2::{Digest, Sha256};

use crate::{config::AdminConfig, errors::AppError};

/// Proof that the request carried the admin bearer token.
///
/// Extraction fails with 401 when the header is missing or wrong, and for
/// every request when no admin key is configured.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

/// Compares digests so the check does not short-circuit on the first differing byte
fn tokens_match(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn authorize(req: &HttpRequest) -> Result<AdminAuth, AppError> {
    let expected = req
        .app_data::<web::Data<AdminConfig>>()
        .and_then(|config| config.api_key.clone())
        .ok_or_else(|| {
            warn!("Admin endpoint requested but ADMIN_API_KEY is not configured");
            AppError::Unauthorized
        })?;

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AppError::Unauthorized)?;

    if tokens_match(presented, &expected) {
        Ok(AdminAuth)
    } else {
        warn!("Rejected admin request for {}", req.path());
        Err(AppError::Unauthorized)
    }
}

impl FromRequest for AdminAuth {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authorize(req))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    fn admin(key: Option<&str>) -> web::Data<AdminConfig> {
        web::Data::new(AdminConfig {
            api_key: key.map(String::from),
        })
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("secret", "secret"));
        assert!(!tokens_match("secret", "secret2"));
        assert!(!tokens_match("", "secret"));
    }

    #[test]
    fn test_valid_bearer_is_accepted() {
        let req = TestRequest::default()
            .app_data(admin(Some("s3cret")))
            .insert_header((header::AUTHORIZATION, "Bearer s3cret"))
            .to_http_request();
        assert!(authorize(&req).is_ok());
    }

    #[test]
    fn test_wrong_or_missing_token_is_rejected() {
        let wrong = TestRequest::default()
            .app_data(admin(Some("s3cret")))
            .insert_header((header::AUTHORIZATION, "Bearer guess"))
            .to_http_request();
        assert!(matches!(authorize(&wrong), Err(AppError::Unauthorized)));

        let basic = TestRequest::default()
            .app_data(admin(Some("s3cret")))
            .insert_header((header::AUTHORIZATION, "Basic s3cret"))
            .to_http_request();
        assert!(authorize(&basic).is_err());

        let missing = TestRequest::default()
            .app_data(admin(Some("s3cret")))
            .to_http_request();
        assert!(authorize(&missing).is_err());
    }

    #[test]
    fn test_unconfigured_key_rejects_everything() {
        let req = TestRequest::default()
            .app_data(admin(None))
            .insert_header((header::AUTHORIZATION, "Bearer "))
            .to_http_request();
        assert!(authorize(&req).is_err());
    }
}
