use crate::api::ApiError;
use crate::applications::TableError;
use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::loan::LoanError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Export(csv::Error),
    Auth(AuthError),
    Backend(ApiError),
    Table(TableError),
    Loan(LoanError),
    Invalid(String),
    Upstream(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::Auth(err) => write!(f, "{}", err),
            AppError::Backend(err) => write!(f, "{}", err),
            AppError::Table(err) => write!(f, "{}", err),
            AppError::Loan(err) => write!(f, "{}", err),
            AppError::Invalid(message) | AppError::Upstream(message) => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Auth(err) => Some(err),
            AppError::Backend(err) => Some(err),
            AppError::Table(err) => Some(err),
            AppError::Loan(err) => Some(err),
            AppError::Invalid(_) | AppError::Upstream(_) => None,
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Backend(err) if err.is_unauthorized() => StatusCode::UNAUTHORIZED,
            AppError::Backend(ApiError::MissingInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Backend(ApiError::Status { status, .. })
                if *status == StatusCode::NOT_FOUND =>
            {
                StatusCode::NOT_FOUND
            }
            AppError::Backend(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Table(_) | AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::Loan(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Export(value)
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Backend(value)
    }
}

impl From<TableError> for AppError {
    fn from(value: TableError) -> Self {
        Self::Table(value)
    }
}

impl From<LoanError> for AppError {
    fn from(value: LoanError) -> Self {
        Self::Loan(value)
    }
}
