// gateway-server/src/auth.rs
use crate::error::PublishError;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use common::{validate_identity_token, Config};
use futures_util::future::{ready, Ready};

const AUTH_HEADER: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";
const TOKEN_HEADER: &str = "X-Auth-Token";

/// Outcome of the authentication gate, resolved before the handler body
/// runs. Extraction itself never rejects the request: the handler decides
/// what to do with an unauthenticated caller, so that failures still get
/// the JSON-RPC error envelope instead of a transport-level error page.
#[derive(Debug, Clone)]
pub enum ClientIdentity {
    /// Valid token; identity is the token's subject.
    Authenticated { identity: String },
    /// A token was presented but did not validate.
    Failed { reason: String },
    /// No token at all.
    Anonymous,
}

impl ClientIdentity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, ClientIdentity::Authenticated { .. })
    }

    pub fn auth_failed(&self) -> bool {
        matches!(self, ClientIdentity::Failed { .. })
    }

    pub fn identity(&self) -> Option<&str> {
        match self {
            ClientIdentity::Authenticated { identity } => Some(identity),
            _ => None,
        }
    }

    /// The gate itself: an identity, or the error that ends the request
    /// before any filesystem or network side effect.
    pub fn require(&self) -> Result<&str, PublishError> {
        match self {
            ClientIdentity::Authenticated { identity } => Ok(identity),
            ClientIdentity::Failed { reason } => Err(PublishError::AuthFailed(reason.clone())),
            ClientIdentity::Anonymous => Err(PublishError::Unauthenticated),
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    if let Some(value) = req.headers().get(AUTH_HEADER) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix(BEARER_PREFIX) {
                return Some(token.to_string());
            }
        }
    }

    req.headers()
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn resolve(req: &HttpRequest) -> ClientIdentity {
    let token = match bearer_token(req) {
        Some(token) => token,
        None => return ClientIdentity::Anonymous,
    };

    let secret = match req.app_data::<web::Data<Config>>() {
        Some(config) => config.jwt_secret.clone(),
        None => {
            tracing::error!("Auth gate running without configuration");
            return ClientIdentity::Failed {
                reason: "authentication unavailable".to_string(),
            };
        }
    };

    match validate_identity_token(&token, secret.as_bytes()) {
        Ok(identity) => ClientIdentity::Authenticated { identity },
        Err(e) => {
            tracing::warn!("Token validation failed: {}", e);
            ClientIdentity::Failed {
                reason: e.to_string(),
            }
        }
    }
}

impl FromRequest for ClientIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(resolve(req)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use common::generate_identity_token;

    fn test_config() -> web::Data<Config> {
        web::Data::new(Config {
            jwt_secret: "test_secret".to_string(),
            ..Config::default()
        })
    }

    #[actix_web::test]
    async fn test_valid_bearer_token_resolves_identity() {
        let token = generate_identity_token("abc123", b"test_secret").unwrap();
        let req = TestRequest::default()
            .app_data(test_config())
            .insert_header((AUTH_HEADER, format!("Bearer {}", token)))
            .to_http_request();

        let identity = resolve(&req);
        assert!(identity.is_authenticated());
        assert_eq!(identity.identity(), Some("abc123"));
        assert_eq!(identity.require().unwrap(), "abc123");
    }

    #[actix_web::test]
    async fn test_missing_token_is_anonymous() {
        let req = TestRequest::default()
            .app_data(test_config())
            .to_http_request();

        let identity = resolve(&req);
        assert!(!identity.is_authenticated());
        assert!(!identity.auth_failed());
        assert!(matches!(
            identity.require(),
            Err(PublishError::Unauthenticated)
        ));
    }

    #[actix_web::test]
    async fn test_bad_token_is_failed() {
        let req = TestRequest::default()
            .app_data(test_config())
            .insert_header((TOKEN_HEADER, "garbage"))
            .to_http_request();

        let identity = resolve(&req);
        assert!(identity.auth_failed());
        assert!(matches!(identity.require(), Err(PublishError::AuthFailed(_))));
    }
}
