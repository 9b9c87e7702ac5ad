// gateway-server/src/forwarder.rs
use crate::error::PublishError;
use crate::query::OutboundRequest;
use async_trait::async_trait;
use common::models::rpc::{RpcRequest, RpcResponse};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// The backend publishing service, seen from the gateway. One logical
/// connection, safe to share across concurrent requests; each call is a
/// self-contained request/response exchange.
#[async_trait]
pub trait StreamPublisher: Send + Sync {
    async fn stream_create(&self, request: &OutboundRequest) -> Result<Value, PublishError>;
}

/// JSON-RPC client for the backend publishing service. The gateway is a
/// relay here: backend results and errors pass through unchanged.
pub struct RpcForwarder {
    client: reqwest::Client,
    rpc_url: String,
    timeout: Duration,
}

// Backend wire shape for a stream_create call. The backend takes the
// bid as a decimal string.
#[derive(Serialize)]
struct StreamCreateCall<'a> {
    name: &'a str,
    file_path: &'a str,
    bid: String,
    identity: &'a str,
    #[serde(flatten)]
    options: &'a Map<String, Value>,
}

impl RpcForwarder {
    pub fn new(rpc_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            rpc_url,
            timeout,
        }
    }
}

#[async_trait]
impl StreamPublisher for RpcForwarder {
    async fn stream_create(&self, request: &OutboundRequest) -> Result<Value, PublishError> {
        let params = serde_json::to_value(StreamCreateCall {
            name: &request.name,
            file_path: &request.file_path,
            bid: request.bid.to_string(),
            identity: &request.identity,
            options: &request.options,
        })
        .map_err(|e| PublishError::internal(format!("encoding stream_create call: {}", e)))?;

        let call = RpcRequest::new("stream_create", params);

        tracing::debug!("Calling backend stream_create at {}", self.rpc_url);

        let response = self
            .client
            .post(&self.rpc_url)
            .timeout(self.timeout)
            .json(&call)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PublishError::BackendUnavailable(format!(
                        "backend call exceeded {}s deadline",
                        self.timeout.as_secs()
                    ))
                } else {
                    PublishError::BackendUnavailable(e.to_string())
                }
            })?;

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| PublishError::BackendUnavailable(format!("undecodable reply: {}", e)))?;

        if let Some(error) = envelope.error {
            return Err(PublishError::BackendRejected(error));
        }

        envelope.result.ok_or_else(|| {
            PublishError::BackendUnavailable("backend returned neither result nor error".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stream_create_call_wire_shape() {
        let mut options = Map::new();
        options.insert("title".to_string(), json!("My Show"));

        let wire = serde_json::to_value(StreamCreateCall {
            name: "myshow",
            file_path: "/tmp/uploads/abc123/r4nd0m_video.mp4",
            bid: 0.1f64.to_string(),
            identity: "abc123",
            options: &options,
        })
        .unwrap();

        assert_eq!(
            wire,
            json!({
                "name": "myshow",
                "file_path": "/tmp/uploads/abc123/r4nd0m_video.mp4",
                "bid": "0.1",
                "identity": "abc123",
                "title": "My Show"
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_maps_to_unavailable() {
        // Nothing listens on this port
        let forwarder = RpcForwarder::new(
            "http://127.0.0.1:1".to_string(),
            Duration::from_millis(200),
        );
        let request = OutboundRequest {
            name: "myshow".to_string(),
            file_path: "/tmp/uploads/abc123/r4nd0m_video.mp4".to_string(),
            bid: 0.1,
            identity: "abc123".to_string(),
            options: Map::new(),
        };

        let result = forwarder.stream_create(&request).await;
        assert!(matches!(result, Err(PublishError::BackendUnavailable(_))));
    }
}
