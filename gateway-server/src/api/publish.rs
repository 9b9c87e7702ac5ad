// gateway-server/src/api/publish.rs
use crate::auth::ClientIdentity;
use crate::error::PublishError;
use crate::forwarder::StreamPublisher;
use crate::query::build_outbound_request;
use crate::staging::StagingAllocator;
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Responder};
use common::models::rpc::RpcResponse;
use futures_util::TryStreamExt;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

// Multipart field names the client integration uses
pub const FILE_FIELD: &str = "file";
pub const JSONRPC_PAYLOAD_FIELD: &str = "json_payload";

/// Shared per-worker state for the publish pipeline.
pub struct AppState {
    pub allocator: StagingAllocator,
    pub publisher: Arc<dyn StreamPublisher>,
}

#[get("/")]
pub async fn api_index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "Publish Gateway API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// Upload-and-publish pipeline. Stages run strictly in order:
// Authenticating -> StagingFile -> Merging -> Forwarding -> Responding.
// Every outcome, success or failure, is an HTTP 200 whose body carries
// the result or the error envelope.
#[post("/publish")]
pub async fn publish(
    identity: ClientIdentity,
    payload: Multipart,
    state: web::Data<AppState>,
) -> HttpResponse {
    // Authenticating: nothing may touch the filesystem or the backend
    // before this check passes.
    let identity = match identity.require() {
        Ok(identity) => identity.to_string(),
        Err(e) => {
            tracing::warn!("Rejected unauthenticated publish request: {}", e);
            return e.into_response();
        }
    };

    let upload_id = Uuid::new_v4();
    tracing::info!("Publish request {} from identity {}", upload_id, identity);

    match run_pipeline(&identity, upload_id, payload, &state).await {
        Ok(result) => match serde_json::to_string_pretty(&RpcResponse::success(result)) {
            Ok(body) => HttpResponse::Ok()
                .content_type("application/json")
                .body(body),
            Err(e) => {
                tracing::error!("Failed to serialize backend result: {}", e);
                PublishError::internal("unserializable backend result").into_response()
            }
        },
        Err(e) => {
            tracing::error!("Publish request {} failed: {}", upload_id, e);
            e.into_response()
        }
    }
}

async fn run_pipeline(
    identity: &str,
    upload_id: Uuid,
    mut payload: Multipart,
    state: &web::Data<AppState>,
) -> Result<Value, PublishError> {
    let mut staged_path: Option<PathBuf> = None;
    let mut raw_query: Option<Vec<u8>> = None;

    // StagingFile: walk the multipart fields, streaming the upload into
    // a staging file and buffering the JSON-RPC payload. A stream error
    // here (client disconnect, bad framing) ends the request before any
    // backend call; the staging handle closes on every exit path.
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| PublishError::MalformedRequest(e.to_string()))?
    {
        let field_name = field.name().to_string();
        match field_name.as_str() {
            FILE_FIELD => {
                let original_name = field
                    .content_disposition()
                    .get_filename()
                    .unwrap_or("upload")
                    .to_string();

                let mut staging = state.allocator.allocate(identity, &original_name).await?;
                let mut written: u64 = 0;

                while let Some(chunk) = field
                    .try_next()
                    .await
                    .map_err(|e| PublishError::MalformedRequest(format!("upload aborted: {}", e)))?
                {
                    staging.write_chunk(&chunk).await?;
                    written += chunk.len() as u64;
                }

                // Flush, sync and close before the path leaves this scope
                let path = staging.finalize().await?;
                tracing::debug!(
                    "Upload {} staged {} bytes at {}",
                    upload_id,
                    written,
                    path.display()
                );
                staged_path = Some(path);
            }
            JSONRPC_PAYLOAD_FIELD => {
                let mut buf = Vec::new();
                while let Some(chunk) = field
                    .try_next()
                    .await
                    .map_err(|e| PublishError::MalformedRequest(e.to_string()))?
                {
                    buf.extend_from_slice(&chunk);
                }
                raw_query = Some(buf);
            }
            other => {
                tracing::debug!("Upload {} ignoring multipart field {:?}", upload_id, other);
                while field
                    .try_next()
                    .await
                    .map_err(|e| PublishError::MalformedRequest(e.to_string()))?
                    .is_some()
                {}
            }
        }
    }

    let staged_path = staged_path.ok_or_else(|| {
        PublishError::MalformedRequest(format!("missing multipart field '{}'", FILE_FIELD))
    })?;
    let raw_query = raw_query.ok_or_else(|| {
        PublishError::MalformedRequest(format!("missing multipart field '{}'", JSONRPC_PAYLOAD_FIELD))
    })?;

    // Merging: decode the client query and apply the server-authoritative
    // overrides last.
    let outbound = build_outbound_request(&raw_query, &staged_path, identity)?;

    // Forwarding: relay the merged call; the result passes through as-is.
    state.publisher.stream_create(&outbound).await
}
