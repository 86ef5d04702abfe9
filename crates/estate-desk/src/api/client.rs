use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::models::{EmailRequest, InquiryStats, JobStats, UserSummary};
use super::ApiError;
use crate::applications::{ApplicationForm, JobApplicationRow, ResumeUpload, SubmissionReceipt};
use crate::auth::{AuthContext, SessionCheck, SessionToken};
use crate::config::BackendConfig;
use crate::interviews::{ApplicantId, RescheduleLookup, RescheduleSource};
use crate::notifications::{Notification, NotificationFeed, NotificationSource};

/// HTTP client for the backend. Cloning is cheap and shares the connection
/// pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    session: Option<SessionToken>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl);
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("estate-desk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            session: config.service_token.as_deref().and_then(SessionToken::new),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Copy of this client that authenticates as `token`.
    pub fn with_session(&self, token: SessionToken) -> Self {
        Self {
            session: Some(token),
            ..self.clone()
        }
    }

    /// Copy of this client that carries exactly the caller's credentials.
    pub fn for_context(&self, context: &AuthContext) -> Self {
        Self {
            session: match context {
                AuthContext::Authenticated(session) => Some(session.token.clone()),
                AuthContext::Anonymous => None,
            },
            ..self.clone()
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.session {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            debug!(%status, path, "backend rejected request");
            return Err(ApiError::Status {
                status,
                path: path.to_string(),
            });
        }
        Ok(response)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let path = url.path().to_string();
        let response = self.send(self.request(Method::GET, url), &path).await?;
        response.json::<T>().await.map_err(ApiError::Decode)
    }

    async fn post_email(&self, segments: &[&str], email: &str) -> Result<(), ApiError> {
        let email = required("email", email)?;
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        let builder = self
            .request(Method::POST, url)
            .json(&EmailRequest { email });
        self.send(builder, &path).await?;
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, ApiError> {
        self.get_json(self.endpoint(&["users"])?).await
    }

    /// Profile of whoever the current session belongs to.
    pub async fn current_user(&self) -> Result<UserSummary, ApiError> {
        self.get_json(self.endpoint(&["auth", "me"])?).await
    }

    pub async fn job_stats(&self) -> Result<JobStats, ApiError> {
        self.get_json(self.endpoint(&["jobs", "stats"])?).await
    }

    pub async fn inquiry_stats(&self) -> Result<InquiryStats, ApiError> {
        self.get_json(self.endpoint(&["inquiries", "stats"])?).await
    }

    pub async fn job_applications(&self) -> Result<Vec<JobApplicationRow>, ApiError> {
        self.get_json(self.endpoint(&["job-applications"])?).await
    }

    pub async fn notifications(
        &self,
        feed: NotificationFeed,
    ) -> Result<Vec<Notification>, ApiError> {
        self.get_json(self.endpoint(feed.path_segments())?).await
    }

    pub async fn reschedule_lookup(
        &self,
        applicant_id: &ApplicantId,
        email: &str,
    ) -> Result<RescheduleLookup, ApiError> {
        let applicant_id = required("applicant id", applicant_id.as_str())?;
        let email = required("email", email)?;

        let mut url = self.endpoint(&["reschedule", applicant_id])?;
        url.query_pairs_mut().append_pair("email", email);
        self.get_json(url).await
    }

    pub async fn subscribe_newsletter(&self, email: &str) -> Result<(), ApiError> {
        self.post_email(&["newsletter", "subscribe"], email).await
    }

    pub async fn unsubscribe(&self, email: &str) -> Result<(), ApiError> {
        self.post_email(&["unsubscribe"], email).await
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), ApiError> {
        self.post_email(&["reset-password"], email).await
    }

    /// Multipart submission of the careers form with the resume attached.
    pub async fn submit_application(
        &self,
        form: &ApplicationForm,
        resume: ResumeUpload,
    ) -> Result<SubmissionReceipt, ApiError> {
        let name = required("name", &form.name)?;
        let email = required("email", &form.email)?;
        let position = required("position", &form.position)?;
        if resume.bytes.is_empty() {
            return Err(ApiError::MissingInput("resume"));
        }

        let ResumeUpload {
            file_name,
            content_type,
            bytes,
        } = resume;
        let resume_part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&content_type)
            .map_err(|_| ApiError::InvalidContentType(content_type.clone()))?;

        let mut body = Form::new()
            .text("name", name.to_string())
            .text("email", email.to_string())
            .text("phone", form.phone.trim().to_string())
            .text("position", position.to_string());
        if let Some(letter) = form.cover_letter.as_deref().map(str::trim) {
            if !letter.is_empty() {
                body = body.text("cover_letter", letter.to_string());
            }
        }
        body = body.part("resume", resume_part);

        let url = self.endpoint(&["job-applications"])?;
        let path = url.path().to_string();
        let response = self
            .send(self.request(Method::POST, url).multipart(body), &path)
            .await?;
        response
            .json::<SubmissionReceipt>()
            .await
            .map_err(ApiError::Decode)
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::MissingInput(field))
    } else {
        Ok(trimmed)
    }
}

#[async_trait]
impl NotificationSource for BackendClient {
    async fn fetch_notifications(
        &self,
        feed: NotificationFeed,
    ) -> Result<Vec<Notification>, ApiError> {
        self.notifications(feed).await
    }
}

#[async_trait]
impl SessionCheck for BackendClient {
    async fn check_session(&self, token: &SessionToken) -> Result<(), ApiError> {
        self.with_session(token.clone()).current_user().await?;
        Ok(())
    }
}

#[async_trait]
impl RescheduleSource for BackendClient {
    async fn reschedule_lookup(
        &self,
        applicant_id: &ApplicantId,
        email: &str,
    ) -> Result<RescheduleLookup, ApiError> {
        BackendClient::reschedule_lookup(self, applicant_id, email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        let config = BackendConfig::new(Url::parse(base).expect("valid base url"));
        BackendClient::new(&config).expect("client builds")
    }

    #[test]
    fn endpoint_joins_segments_under_base_path() {
        let client = client("http://backend.test/api/");
        let url = client
            .endpoint(&["notifications", "job-applications"])
            .expect("endpoint builds");
        assert_eq!(
            url.as_str(),
            "http://backend.test/api/notifications/job-applications"
        );
    }

    #[test]
    fn endpoint_handles_base_without_trailing_slash() {
        let client = client("http://backend.test/api");
        let url = client.endpoint(&["users"]).expect("endpoint builds");
        assert_eq!(url.as_str(), "http://backend.test/api/users");
    }

    #[test]
    fn endpoint_percent_encodes_identifiers() {
        let client = client("http://backend.test");
        let url = client
            .endpoint(&["reschedule", "42/../admin"])
            .expect("endpoint builds");
        assert_eq!(url.path(), "/reschedule/42%2F..%2Fadmin");
    }

    #[test]
    fn rejects_non_base_urls() {
        let config = BackendConfig::new(Url::parse("mailto:ops@example.com").expect("valid url"));
        assert!(matches!(
            BackendClient::new(&config),
            Err(ApiError::InvalidBaseUrl)
        ));
    }

    #[test]
    fn context_switch_replaces_service_token() {
        let mut config = BackendConfig::new(Url::parse("http://backend.test").expect("url"));
        config.service_token = Some("service".to_string());
        let client = BackendClient::new(&config).expect("client builds");
        assert!(client.session.is_some());

        let anonymous = client.for_context(&AuthContext::Anonymous);
        assert!(anonymous.session.is_none());
    }
}
