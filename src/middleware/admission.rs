use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::access::{AdmissionFilter, Decision, RealIpResolver};
use crate::error::ApiError;

/// Message returned to denied callers
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied from your IP address";

/// Shared state for the admission middleware
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    pub filter: AdmissionFilter,
    pub resolver: RealIpResolver,
}

impl AdmissionGate {
    pub fn new(filter: AdmissionFilter, resolver: RealIpResolver) -> Self {
        Self { filter, resolver }
    }
}

/// Client address resolved by the admission middleware, available to handlers
#[derive(Clone, Debug)]
pub struct ClientIp(pub String);

/// Rejects every request whose real client address fails the allowlist
pub async fn admission_middleware(
    State(gate): State<Arc<AdmissionGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let client_ip = gate.resolver.resolve(&request);

    match gate.filter.evaluate(&client_ip) {
        Decision::Allow(reason) => {
            tracing::trace!(ip = %client_ip, ?reason, "Request admitted");
            request.extensions_mut().insert(ClientIp(client_ip));
            next.run(request).await
        }
        Decision::Deny(reason) => {
            tracing::warn!(
                ip = %client_ip,
                path = %request.uri().path(),
                reason = reason.as_str(),
                "Access denied from IP"
            );
            ApiError::forbidden(ACCESS_DENIED_MESSAGE).into_response()
        }
    }
}
