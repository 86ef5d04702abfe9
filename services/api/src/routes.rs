use crate::infra::{schedule_or_error, AppState, Viewer};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use estate_desk::applications::{TablePage, TableQuery};
use estate_desk::auth::AuthContext;
use estate_desk::dashboard::DashboardStats;
use estate_desk::error::AppError;
use estate_desk::interviews::{RescheduleResolver, ScheduleSummary};
use estate_desk::loan::{LoanQuote, LoanTerms};
use estate_desk::notifications::{Notification, NotificationDigest, NotificationFeed};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::Ordering;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NotificationsQuery {
    #[serde(default)]
    pub(crate) unread_only: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct NotificationsResponse {
    pub(crate) feed: NotificationFeed,
    pub(crate) digest: NotificationDigest,
    pub(crate) notifications: Vec<Notification>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InterviewQuery {
    #[serde(default)]
    pub(crate) email: Option<String>,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/notifications", get(notifications_endpoint))
        .route("/api/v1/dashboard", get(dashboard_endpoint))
        .route("/api/v1/applications", get(applications_endpoint))
        .route("/api/v1/interviews/:applicant_id", get(interview_endpoint))
        .route("/api/v1/loan/quote", post(loan_quote_endpoint))
        .with_state(state)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Latest polled list. The list was fetched with the service token, so the
/// caller's own session is confirmed with the backend first. The digest always
/// covers the whole feed, even when only unread items are returned.
pub(crate) async fn notifications_endpoint(
    State(state): State<AppState>,
    Viewer(auth): Viewer,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<NotificationsResponse>, AppError> {
    let session = auth.require()?;
    state.sessions.verify(&state.backend, session).await?;

    let mut notifications = state.notifications.snapshot();
    let digest = NotificationDigest::from_notifications(&notifications);
    if query.unread_only {
        notifications.retain(|notification| !notification.is_read);
    }

    Ok(Json(NotificationsResponse {
        feed: state.notifications.feed(),
        digest,
        notifications,
    }))
}

pub(crate) async fn dashboard_endpoint(
    State(state): State<AppState>,
    Viewer(auth): Viewer,
) -> Result<Json<DashboardStats>, AppError> {
    auth.require()?;
    let client = state.backend_for(&auth);
    let stats = DashboardStats::load(&client, state.notifications.digest()).await?;
    Ok(Json(stats))
}

pub(crate) async fn applications_endpoint(
    State(state): State<AppState>,
    Viewer(auth): Viewer,
    Query(query): Query<TableQuery>,
) -> Result<Json<TablePage>, AppError> {
    auth.require()?;
    let rows = state.backend_for(&auth).job_applications().await?;
    Ok(Json(query.apply(&rows)?))
}

/// Public: applicants reach this from the link in their invitation email.
pub(crate) async fn interview_endpoint(
    State(state): State<AppState>,
    Path(applicant_id): Path<String>,
    Query(query): Query<InterviewQuery>,
) -> Result<Json<ScheduleSummary>, AppError> {
    let resolver = RescheduleResolver::new(state.backend_for(&AuthContext::Anonymous));

    let outcome = resolver
        .load(Some(&applicant_id), query.email.as_deref())
        .await;
    Ok(Json(schedule_or_error(outcome)?))
}

pub(crate) async fn loan_quote_endpoint(
    Json(terms): Json<LoanTerms>,
) -> Result<Json<LoanQuote>, AppError> {
    Ok(Json(terms.quote()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use estate_desk::api::{ApiError, BackendClient};
    use estate_desk::auth::SessionCache;
    use estate_desk::config::{BackendConfig, PollingConfig};
    use estate_desk::notifications::{NotificationPoller, NotificationSource};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{header as header_is, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedFeed(Vec<Notification>);

    #[async_trait]
    impl NotificationSource for FixedFeed {
        async fn fetch_notifications(
            &self,
            _feed: NotificationFeed,
        ) -> Result<Vec<Notification>, ApiError> {
            Ok(self.0.clone())
        }
    }

    fn sample_notifications() -> Vec<Notification> {
        serde_json::from_value(json!([
            {
                "id": 1,
                "message": "New application from Dana",
                "type": "info",
                "isRead": false,
                "createdAt": "2024-02-01T10:00:00Z"
            },
            {
                "id": 2,
                "message": "Inquiry answered",
                "type": "success",
                "isRead": true,
                "createdAt": "2024-02-01T11:00:00Z"
            }
        ]))
        .expect("fixture notifications")
    }

    async fn app_with(server: &MockServer, notifications: Vec<Notification>) -> Router {
        let base = server.uri().parse().expect("mock server uri");
        let backend = BackendClient::new(&BackendConfig::new(base)).expect("client builds");

        let expect_update = !notifications.is_empty();
        let mut subscription = NotificationPoller::new(
            Arc::new(FixedFeed(notifications)),
            NotificationFeed::All,
            &PollingConfig::default(),
        )
        .spawn();
        if expect_update {
            subscription.changed().await.expect("first poll lands");
        }

        router(AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            backend,
            notifications: Arc::new(subscription),
            sessions: Arc::new(SessionCache::new(Duration::from_secs(60))),
        })
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).expect("request builds")
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_and_readiness_report_status() {
        let server = MockServer::start().await;
        let app = app_with(&server, Vec::new()).await;

        let response = app
            .clone()
            .oneshot(get_request("/health", None))
            .await
            .expect("health responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], "ok");

        let response = app
            .oneshot(get_request("/ready", None))
            .await
            .expect("ready responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], "ready");
    }

    #[tokio::test]
    async fn notifications_require_a_session() {
        let server = MockServer::start().await;
        let app = app_with(&server, sample_notifications()).await;

        let response = app
            .oneshot(get_request("/api/v1/notifications", None))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            read_json(response).await["error"],
            "sign in to view this page"
        );
    }

    #[tokio::test]
    async fn notifications_reject_a_token_the_backend_does_not_know() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header_is("authorization", "Bearer forged-session"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        let app = app_with(&server, sample_notifications()).await;

        let response = app
            .oneshot(get_request("/api/v1/notifications", Some("forged-session")))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn notifications_serve_the_polled_list_to_a_confirmed_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header_is("authorization", "Bearer admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
            .expect(1)
            .mount(&server)
            .await;
        let app = app_with(&server, sample_notifications()).await;

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(get_request(
                    "/api/v1/notifications?unread_only=true",
                    Some("admin"),
                ))
                .await
                .expect("responds");
            assert_eq!(response.status(), StatusCode::OK);

            let body = read_json(response).await;
            assert_eq!(body["feed"], "all");
            assert_eq!(body["digest"]["total"], 2);
            assert_eq!(body["digest"]["unread"], 1);
            assert_eq!(body["notifications"].as_array().map(Vec::len), Some(1));
            assert_eq!(body["notifications"][0]["message"], "New application from Dana");
        }
    }

    #[tokio::test]
    async fn dashboard_forwards_caller_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/stats"))
            .and(header_is("authorization", "Bearer admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_jobs": 3,
                "open_jobs": 2,
                "total_applications": 14,
                "pending_applications": 5
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/inquiries/stats"))
            .and(header_is("authorization", "Bearer admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_inquiries": 9,
                "unread_inquiries": 4,
                "responded_inquiries": 5
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = app_with(&server, sample_notifications()).await;
        let response = app
            .oneshot(get_request("/api/v1/dashboard", Some("admin")))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["jobs"]["open_jobs"], 2);
        assert_eq!(body["open_items"], 9);
        assert_eq!(body["notifications"]["unread"], 1);
    }

    #[tokio::test]
    async fn rejected_backend_session_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let app = app_with(&server, Vec::new()).await;
        let response = app
            .oneshot(get_request("/api/v1/dashboard", Some("expired")))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn applications_are_filtered_and_paged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/job-applications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "Ana", "email": "ana@example.com", "position": "Porter",
                  "status": "pending", "applied_at": "2024-03-01T09:00:00Z" },
                { "id": 2, "name": "Ben", "email": "ben@example.com", "position": "Agent",
                  "status": "rejected", "applied_at": "2024-03-02T09:00:00Z" },
                { "id": 3, "name": "Cy", "email": "cy@example.com", "position": "Agent",
                  "status": "pending", "applied_at": "2024-03-03T09:00:00Z" }
            ])))
            .mount(&server)
            .await;

        let app = app_with(&server, Vec::new()).await;
        let response = app
            .clone()
            .oneshot(get_request(
                "/api/v1/applications?status=pending&sort=name&direction=ascending&page_size=1",
                Some("admin"),
            ))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["page_count"], 2);
        assert_eq!(body["rows"][0]["name"], "Ana");

        let response = app
            .oneshot(get_request("/api/v1/applications?page_size=0", Some("admin")))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn interview_lookup_is_public() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reschedule/42"))
            .and(query_param("email", "a@b.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "appointment": {
                    "admin_schedule": "2024-01-10T09:00:00Z",
                    "admin_message": "bring ID"
                },
                "reschedule": {
                    "status": "no request",
                    "requested_date": null,
                    "applicant_message": null
                },
                "applicant": { "name": "Jo", "email": "a@b.com", "position": "Porter" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = app_with(&server, Vec::new()).await;
        let response = app
            .oneshot(get_request("/api/v1/interviews/42?email=a@b.com", None))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["applicant_id"], "42");
        assert_eq!(body["interview"]["date"], "2024-01-10T09:00:00Z");
        assert_eq!(body["interview"]["admin_message"], "bring ID");
        assert_eq!(body["interview"]["applicant_message"], Value::Null);
        assert_eq!(body["status_label"], "No request");
    }

    #[tokio::test]
    async fn interview_without_email_never_calls_backend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let app = app_with(&server, Vec::new()).await;
        let response = app
            .oneshot(get_request("/api/v1/interviews/42", None))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn interview_backend_failure_is_a_gateway_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reschedule/42"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let app = app_with(&server, Vec::new()).await;
        let response = app
            .oneshot(get_request("/api/v1/interviews/42?email=a@b.com", None))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            read_json(response).await["error"],
            "failed to fetch reschedule details"
        );
    }

    #[tokio::test]
    async fn loan_quote_validates_terms() {
        let server = MockServer::start().await;
        let app = app_with(&server, Vec::new()).await;

        let quote = |body: Value| {
            Request::builder()
                .method("POST")
                .uri("/api/v1/loan/quote")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request builds")
        };

        let response = app
            .clone()
            .oneshot(quote(json!({
                "principal": 200000.0,
                "annual_rate_percent": 6.0,
                "years": 30
            })))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["monthly_payment"], 1199.1);

        let response = app
            .oneshot(quote(json!({
                "principal": 200000.0,
                "annual_rate_percent": 6.0,
                "years": 0
            })))
            .await
            .expect("responds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
