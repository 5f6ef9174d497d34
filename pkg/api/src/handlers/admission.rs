use axum::{Json, body::Bytes, extract::State};
use k8s_openapi::api::core::v1::Pod;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use pkg_compute::Placement;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{Instrument, error, info, info_span};

use crate::AppState;
use crate::error::ApiError;

/// Outcome of a review, before it is rendered for a given endpoint.
#[derive(Debug)]
pub enum Decision {
    /// Admit unchanged: non-Pod kind, or nowhere to place the pod.
    Allow,
    /// Admit and pin the pod to the chosen target.
    Place(Placement),
}

/// JSON patch pinning a pod to `selector`.
pub fn node_selector_patch(selector: &HashMap<String, String>) -> Value {
    json!([{
        "op": "add",
        "path": "/spec/nodeSelector",
        "value": selector,
    }])
}

pub async fn mutate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AdmissionReview<DynamicObject>>, ApiError> {
    respond(&state, &body, true).await
}

pub async fn validate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AdmissionReview<DynamicObject>>, ApiError> {
    respond(&state, &body, false).await
}

async fn respond(
    state: &AppState,
    body: &[u8],
    with_patch: bool,
) -> Result<Json<AdmissionReview<DynamicObject>>, ApiError> {
    state.metrics.requests.inc();
    let result = review(state, body, with_patch).await;
    if result.is_err() {
        state.metrics.errors.inc();
    }
    result.map(Json)
}

async fn review(
    state: &AppState,
    body: &[u8],
    with_patch: bool,
) -> Result<AdmissionReview<DynamicObject>, ApiError> {
    let req = parse_request(body)?;
    let span = info_span!(
        "admission",
        uid = %req.uid,
        kind = %req.kind.kind,
        name = %req.name,
        namespace = req.namespace.as_deref().unwrap_or_default(),
        operation = ?req.operation,
    );

    async {
        let decision = admit(state, &req).await.inspect_err(|e| {
            error!("Admission {} for {} failed: {}", req.uid, req.name, e);
        })?;

        let mut response = AdmissionResponse::from(&req);
        if let (true, Decision::Place(placement)) = (with_patch, &decision) {
            let patch = node_selector_patch(&placement.node().selector);
            let patch: json_patch::Patch = serde_json::from_value(patch)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            response = response
                .with_patch(patch)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            state.metrics.patched.inc();
            info!(
                "Patched nodeSelector onto {} ({} node {})",
                req.name,
                placement.source(),
                placement.node().display_name()
            );
        }
        Ok::<_, ApiError>(response.into_review())
    }
    .instrument(span)
    .await
}

pub fn parse_request(body: &[u8]) -> Result<AdmissionRequest<DynamicObject>, ApiError> {
    let review: AdmissionReview<DynamicObject> = serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidInput(format!("malformed admission review: {}", e)))?;
    TryInto::<AdmissionRequest<DynamicObject>>::try_into(review).map_err(|e| ApiError::InvalidInput(e.to_string()))
}

/// Decide where the object under review should run.
pub async fn admit(
    state: &AppState,
    req: &AdmissionRequest<DynamicObject>,
) -> Result<Decision, ApiError> {
    if req.kind.kind != "Pod" {
        return Ok(Decision::Allow);
    }

    let object = req
        .object
        .as_ref()
        .ok_or_else(|| ApiError::InvalidInput("admission request carries no object".into()))?;
    let pod: Pod = serde_json::to_value(object)
        .and_then(serde_json::from_value)
        .map_err(|e| ApiError::InvalidInput(format!("object is not a Pod: {}", e)))?;

    let placed = tokio::time::timeout(state.request_timeout, state.compute.place_pod(&pod))
        .await
        .map_err(|_| ApiError::DeadlineExceeded(state.request_timeout))?;

    match placed {
        Ok(placement) => {
            match &placement {
                Placement::Cluster(_) => state.metrics.placed_in_cluster.inc(),
                Placement::Catalog { .. } => state.metrics.placed_from_catalog.inc(),
            }
            Ok(Decision::Place(placement))
        }
        Err(e) if e.is_no_target() => {
            state.metrics.no_target.inc();
            info!("No placement target for {}, admitting unchanged", req.name);
            Ok(Decision::Allow)
        }
        Err(e) => Err(e.into()),
    }
}
