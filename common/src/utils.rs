// common/src/utils.rs
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Setup tracing for consistent logging across services
pub fn setup_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Generate a random alphanumeric token of the given length
pub fn generate_secure_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // identity (account ID)
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at time
}

// Token lifetime in seconds (24 hours)
const TOKEN_TTL: usize = 86400;

/// Issue an identity token for an authenticated caller
pub fn generate_identity_token(
    identity: &str,
    secret: &[u8],
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs() as usize;

    let claims = JwtClaims {
        sub: identity.to_string(),
        iat: now,
        exp: now + TOKEN_TTL,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

/// Validate an identity token and extract the caller identity
pub fn validate_identity_token(
    token: &str,
    secret: &[u8],
) -> Result<String, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<JwtClaims>(token, &DecodingKey::from_secret(secret), &validation)?;

    Ok(token_data.claims.sub)
}
