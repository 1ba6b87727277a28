//! SCIM request authorization middleware.
//!
//! Runs every request through the [`RequestAuthorizationGate`] and stores the
//! resolved [`Tenant`] in the request extensions for downstream handlers.
//! Failures short-circuit with a SCIM error body.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{RequestAuthorizationGate, Tenant},
    scim::ScimErrorResponse,
};

pub async fn scim_auth_middleware(
    State(gate): State<Arc<RequestAuthorizationGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ScimErrorResponse> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let tenant: Tenant = gate.authorize(header.as_deref()).await.map_err(|e| {
        tracing::warn!(
            method = %req.method(),
            path = %req.uri().path(),
            error = %e,
            "SCIM request rejected"
        );
        ScimErrorResponse::from(e)
    })?;

    req.extensions_mut().insert(tenant);
    Ok(next.run(req).await)
}
