use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use estate_desk::api::BackendClient;
use estate_desk::applications::SortKey;
use estate_desk::auth::{AuthContext, SessionCache, SessionToken};
use estate_desk::config::AppConfig;
use estate_desk::error::AppError;
use estate_desk::interviews::{FailureKind, ResolverState, ScheduleSummary};
use estate_desk::notifications::{NotificationFeed, NotificationSubscription};
use metrics_exporter_prometheus::PrometheusHandle;
use std::convert::Infallible;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    /// Client configured with the service token; handlers rebind it to the
    /// caller's credentials before use.
    pub(crate) backend: BackendClient,
    pub(crate) notifications: Arc<NotificationSubscription>,
    pub(crate) sessions: Arc<SessionCache>,
}

impl AppState {
    pub(crate) fn backend_for(&self, context: &AuthContext) -> BackendClient {
        self.backend.for_context(context)
    }
}

/// Auth context of the incoming request, read from the bearer header.
pub(crate) struct Viewer(pub(crate) AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        Ok(Self(AuthContext::from_authorization(header)))
    }
}

/// Client for one-shot CLI commands. An explicit `--token` wins over
/// `PORTAL_SERVICE_TOKEN`.
pub(crate) fn cli_backend(
    config: &AppConfig,
    token: Option<String>,
) -> Result<BackendClient, estate_desk::api::ApiError> {
    let client = BackendClient::new(&config.backend)?;
    Ok(match token.and_then(SessionToken::new) {
        Some(token) => client.with_session(token),
        None => client,
    })
}

/// Final state of a one-shot interview lookup as a response. Incomplete input
/// is the caller's fault; a failed fetch is the backend's.
pub(crate) fn schedule_or_error(state: ResolverState) -> Result<ScheduleSummary, AppError> {
    match state {
        ResolverState::Ready(summary) => Ok(*summary),
        ResolverState::Failed {
            kind: FailureKind::Fetch,
            message,
        } => Err(AppError::Upstream(message)),
        ResolverState::Failed {
            kind: FailureKind::MissingInput,
            message,
        } => Err(AppError::Invalid(message)),
        ResolverState::Idle | ResolverState::Loading => Err(AppError::Invalid(
            "an applicant id is required".to_string(),
        )),
    }
}

pub(crate) fn parse_feed(raw: &str) -> Result<NotificationFeed, String> {
    NotificationFeed::parse(raw).ok_or_else(|| {
        format!("unknown feed '{raw}' (expected all, job-applications or property-inquiries)")
    })
}

pub(crate) fn parse_sort_key(raw: &str) -> Result<SortKey, String> {
    SortKey::parse(raw)
        .ok_or_else(|| format!("unknown sort column '{raw}' (expected name, position, status or applied-at)"))
}
