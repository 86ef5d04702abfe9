//! Explicit authentication context.
//!
//! The context is built once at the request root and handed to whatever needs
//! it; protected views call [`AuthContext::require`] before rendering anything.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::api::ApiError;

/// Opaque token issued by the backend at login.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Returns `None` for blank tokens.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the token itself.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthContext {
    #[default]
    Anonymous,
    Authenticated(Session),
}

impl AuthContext {
    pub fn authenticated(token: SessionToken) -> Self {
        Self::Authenticated(Session { token })
    }

    /// Parse an `Authorization` header value. Anything other than a non-empty
    /// bearer token yields an anonymous context.
    pub fn from_authorization(header: Option<&str>) -> Self {
        let Some(value) = header else {
            return Self::Anonymous;
        };

        let mut parts = value.trim().splitn(2, ' ');
        let scheme = parts.next().unwrap_or_default();
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Self::Anonymous;
        }

        match parts.next().and_then(SessionToken::new) {
            Some(token) => Self::authenticated(token),
            None => Self::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn require(&self) -> Result<&Session, AuthError> {
        match self {
            Self::Authenticated(session) => Ok(session),
            Self::Anonymous => Err(AuthError::Unauthenticated),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("sign in to view this page")]
    Unauthenticated,
}

/// Asks the backend whether a token still belongs to a live session.
#[async_trait]
pub trait SessionCheck: Send + Sync {
    async fn check_session(&self, token: &SessionToken) -> Result<(), ApiError>;
}

/// Sessions the backend confirmed recently. Data the server fetched with its
/// own credentials is only handed out after the caller's token passes here.
/// Rejections are not remembered.
#[derive(Debug)]
pub struct SessionCache {
    ttl: Duration,
    confirmed: Mutex<HashMap<SessionToken, Instant>>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            confirmed: Mutex::new(HashMap::new()),
        }
    }

    pub async fn verify<C>(&self, checker: &C, session: &Session) -> Result<(), ApiError>
    where
        C: SessionCheck + ?Sized,
    {
        if self.is_fresh(&session.token) {
            return Ok(());
        }

        checker.check_session(&session.token).await?;

        let now = Instant::now();
        let mut confirmed = self.lock();
        confirmed.retain(|_, expires| *expires > now);
        confirmed.insert(session.token.clone(), now + self.ttl);
        Ok(())
    }

    fn is_fresh(&self, token: &SessionToken) -> bool {
        let now = Instant::now();
        self.lock()
            .get(token)
            .is_some_and(|expires| *expires > now)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionToken, Instant>> {
        self.confirmed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_produces_session() {
        let context = AuthContext::from_authorization(Some("Bearer abc123"));
        let session = context.require().expect("authenticated");
        assert_eq!(session.token.as_str(), "abc123");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let context = AuthContext::from_authorization(Some("bearer   padded "));
        assert_eq!(
            context.require().map(|s| s.token.as_str().to_string()),
            Ok("padded".to_string())
        );
    }

    #[test]
    fn missing_or_foreign_headers_are_anonymous() {
        for header in [None, Some(""), Some("Bearer"), Some("Bearer   "), Some("Basic Zm9v")] {
            let context = AuthContext::from_authorization(header);
            assert_eq!(context, AuthContext::Anonymous, "header {header:?}");
            assert_eq!(context.require(), Err(AuthError::Unauthenticated));
        }
    }

    #[test]
    fn debug_output_hides_token() {
        let token = SessionToken::new("secret-value").expect("token");
        assert!(!format!("{token:?}").contains("secret-value"));
    }

    struct CountingCheck {
        accept: bool,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl CountingCheck {
        fn new(accept: bool) -> Self {
            Self {
                accept,
                calls: std::sync::atomic::AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionCheck for CountingCheck {
        async fn check_session(&self, _token: &SessionToken) -> Result<(), ApiError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if self.accept {
                Ok(())
            } else {
                Err(ApiError::Status {
                    status: reqwest::StatusCode::UNAUTHORIZED,
                    path: "/auth/me".to_string(),
                })
            }
        }
    }

    fn session(raw: &str) -> Session {
        Session {
            token: SessionToken::new(raw).expect("token"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_session_is_reused_until_it_expires() {
        let cache = SessionCache::new(Duration::from_secs(60));
        let checker = CountingCheck::new(true);
        let admin = session("admin");

        cache.verify(&checker, &admin).await.expect("accepted");
        cache.verify(&checker, &admin).await.expect("cached");
        assert_eq!(checker.calls(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.verify(&checker, &admin).await.expect("rechecked");
        assert_eq!(checker.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_token_is_checked_every_time() {
        let cache = SessionCache::new(Duration::from_secs(60));
        let checker = CountingCheck::new(false);
        let forged = session("forged");

        for _ in 0..2 {
            let err = cache
                .verify(&checker, &forged)
                .await
                .expect_err("rejected");
            assert!(err.is_unauthorized());
        }
        assert_eq!(checker.calls(), 2);
    }
}
