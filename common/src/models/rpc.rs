// common/src/models/rpc.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC request: a method name plus a parameter object.
/// Used both for client-submitted publish queries and for calls
/// to the backend publishing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl RpcRequest {
    pub fn new(method: &str, params: Value) -> Self {
        Self {
            method: method.to_string(),
            params,
            jsonrpc: Some("2.0".to_string()),
            id: Some(Value::from(1)),
        }
    }
}

/// A JSON-RPC response envelope: exactly one of `result` or `error`
/// is populated. Serialized with the empty side omitted, so a success
/// body reads `{"result": ...}` and a failure body `{"error": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl RpcResponse {
    pub fn success(result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: Value) -> Self {
        Self {
            result: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_omits_error() {
        let envelope = RpcResponse::success(json!({"claim_id": "abc"}));
        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body, json!({"result": {"claim_id": "abc"}}));
    }

    #[test]
    fn test_failure_envelope_omits_result() {
        let envelope = RpcResponse::failure(json!({"code": -32600, "message": "bad"}));
        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body, json!({"error": {"code": -32600, "message": "bad"}}));
    }

    #[test]
    fn test_request_decodes_without_id() {
        let raw = r#"{"method":"publish","params":{"name":"myshow"}}"#;
        let request: RpcRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.method, "publish");
        assert!(request.id.is_none());
    }
}
