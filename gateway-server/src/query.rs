// gateway-server/src/query.rs
use crate::error::PublishError;
use common::models::rpc::RpcRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Placeholder the legitimate client integration sends in `file_path`,
/// signaling "substitute the real staging path here". Anything else is
/// treated as an injection attempt.
pub const FILE_PATH_SENTINEL: &str = "__POST_FILE__";

// Parameter keys only the server may populate. Stripped from the
// pass-through options before the overrides are applied.
const RESERVED_KEYS: [&str; 3] = ["file_path", "identity", "account_id"];

/// The declared shape of a client publish query. Anything outside the
/// named fields is collected into `options` and passed through to the
/// backend untouched (minus the reserved keys).
#[derive(Debug, Deserialize)]
struct StreamCreateParams {
    name: String,
    bid: String,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(flatten)]
    options: Map<String, Value>,
}

/// A fully-formed backend call. Every field here is safe to forward
/// verbatim: `file_path` and `identity` are server-computed, never
/// client-derived.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutboundRequest {
    pub name: String,
    pub file_path: String,
    pub bid: f64,
    pub identity: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

/// Decode a raw client JSON-RPC body, validate it, and merge in the
/// server-authoritative fields. Overrides are the last mutation: by the
/// time `file_path` and `identity` are set, every client field has
/// already been decoded, so nothing can reintroduce client values.
pub fn build_outbound_request(
    raw: &[u8],
    final_path: &Path,
    identity: &str,
) -> Result<OutboundRequest, PublishError> {
    let request: RpcRequest = serde_json::from_slice(raw)
        .map_err(|e| PublishError::MalformedRequest(e.to_string()))?;

    let mut params: StreamCreateParams = serde_json::from_value(request.params)
        .map_err(|e| PublishError::MalformedRequest(format!("params: {}", e)))?;

    match params.file_path.as_deref() {
        Some(FILE_PATH_SENTINEL) => {}
        other => {
            return Err(PublishError::UnexpectedFilepath(
                other.unwrap_or("<missing>").to_string(),
            ))
        }
    }

    let bid = params
        .bid
        .parse::<f64>()
        .map_err(|_| PublishError::InvalidBid(params.bid.clone()))?;

    for key in RESERVED_KEYS {
        params.options.remove(key);
    }

    Ok(OutboundRequest {
        name: params.name,
        file_path: final_path.to_string_lossy().into_owned(),
        bid,
        identity: identity.to_string(),
        options: params.options,
    })
}
