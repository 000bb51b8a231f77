//! HTTP Basic authentication middleware

use crate::types::IngressError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use piiscrub_core::{AuthError, AuthGate, parse_basic};
use piiscrub_observability::Metrics;
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Clone)]
pub struct AuthState {
    pub gate: Arc<AuthGate>,
    pub metrics: Arc<Metrics>,
}

/// Check credentials and attach the caller's `Identity` to the request
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic);

    let checked = state
        .gate
        .check(presented.as_ref().map(|(u, p)| (u.as_str(), p.as_str())));

    match checked {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(err) => {
            let reason = match err {
                AuthError::MissingCredentials => "missing_credentials",
                AuthError::InvalidCredentials => "invalid_credentials",
                AuthError::NotConfigured => "not_configured",
            };

            if err == AuthError::NotConfigured {
                error!("Authentication is enabled but API credentials are not configured");
            } else {
                warn!(reason, "Authentication failed");
                state.metrics.record_auth_failure(reason);
            }

            IngressError::from(err).into_response()
        }
    }
}
