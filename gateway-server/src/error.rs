// gateway-server/src/error.rs
use actix_web::HttpResponse;
use serde_json::{json, Value};
use thiserror::Error;

/// Everything that can terminate the publish pipeline. All variants reach
/// the caller as an error envelope with HTTP 200 (status-code neutrality:
/// clients parse the body for the error shape, never the transport status).
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("could not parse publish request: {0}")]
    MalformedRequest(String),

    #[error("unexpected file_path value: {0}")]
    UnexpectedFilepath(String),

    #[error("bid must be a decimal number, got: {0}")]
    InvalidBid(String),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] std::io::Error),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("backend rejected the request")]
    BackendRejected(Value),
}

impl PublishError {
    /// Wrap an internal invariant violation as a request-scoped failure.
    /// Keeps unexpected faults inside one response instead of taking the
    /// serving process down.
    pub fn internal(message: impl Into<String>) -> Self {
        PublishError::StorageFailure(std::io::Error::new(
            std::io::ErrorKind::Other,
            message.into(),
        ))
    }

    pub fn code(&self) -> i64 {
        match self {
            PublishError::Unauthenticated => -32084,
            PublishError::AuthFailed(_) => -32085,
            PublishError::MalformedRequest(_) => -32600,
            PublishError::UnexpectedFilepath(_) => -32602,
            PublishError::InvalidBid(_) => -32602,
            PublishError::StorageFailure(_) => -32603,
            PublishError::BackendUnavailable(_) => -32086,
            // Relayed verbatim; the backend's own code is inside the value
            PublishError::BackendRejected(_) => -32000,
        }
    }

    /// The JSON-RPC-shaped error body written back to the client.
    /// Backend errors are relayed verbatim; everything else carries the
    /// gateway's own code and message.
    pub fn envelope(&self) -> Value {
        match self {
            PublishError::BackendRejected(error) => json!({ "error": error }),
            other => json!({
                "error": {
                    "code": other.code(),
                    "message": other.to_string(),
                }
            }),
        }
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::Ok().json(self.envelope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_envelope_shape() {
        let error = PublishError::InvalidBid("abc".to_string());
        let envelope = error.envelope();
        assert_eq!(envelope["error"]["code"], -32602);
        assert!(envelope["error"]["message"]
            .as_str()
            .unwrap()
            .contains("abc"));
        assert!(envelope.get("result").is_none());
    }

    #[test]
    fn test_backend_error_relayed_verbatim() {
        let backend_error = json!({"code": -26, "message": "insufficient funds", "data": {"kind": "wallet"}});
        let error = PublishError::BackendRejected(backend_error.clone());
        assert_eq!(error.envelope()["error"], backend_error);
    }

    #[test]
    fn test_internal_fault_maps_to_storage_class() {
        let error = PublishError::internal("sentinel mismatch after validation");
        assert_eq!(error.code(), -32603);
    }
}
