use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use std::env;
use std::fmt::{self, Debug};
use tokio_tungstenite::tungstenite;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredential,
    ConnectionExhausted,
    TransientNetworkFailure,
    Unauthorized,
    Forbidden,
    NotFound,
    Upstream,
    InvalidTransition,
    InvalidInput,
    GeolocationUnavailable,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self.code {
            3 | 6 => ErrorKind::TransientNetworkFailure,
            4 => ErrorKind::Upstream,
            100 => ErrorKind::InvalidTransition,
            101 => ErrorKind::InvalidInput,
            200 => ErrorKind::MissingCredential,
            201 => ErrorKind::ConnectionExhausted,
            202 => ErrorKind::GeolocationUnavailable,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            _ => ErrorKind::Internal,
        }
    }

    pub fn is_invalid_transition_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidTransition
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        decode_error(err)
    }
}

impl From<tungstenite::Error> for Error {
    fn from(err: tungstenite::Error) -> Self {
        channel_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Unauthorized | ErrorKind::MissingCredential => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidTransition => StatusCode::CONFLICT,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::TransientNetworkFailure
            | ErrorKind::ConnectionExhausted
            | ErrorKind::GeolocationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error_message = match self.kind() {
            ErrorKind::Internal => "Internal Server Error",
            _ => self.message.as_str(),
        };

        let body = Json(json!({
            "code": self.code,
            "kind": self.kind(),
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn status_error(status: u16) -> Error {
    match status {
        401 => unauthorized_error(),
        403 => forbidden_error(),
        404 => not_found_error(),
        500..=599 => upstream_error(),
        _ => invalid_input_error(),
    }
}

pub fn invalid_transition_error() -> Error {
    Error {
        code: 100,
        message: "invalid transition".into(),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

pub fn missing_credential_error() -> Error {
    Error {
        code: 200,
        message: "missing credential".into(),
    }
}

pub fn connection_exhausted_error() -> Error {
    Error {
        code: 201,
        message: "dispatch connection exhausted".into(),
    }
}

pub fn geolocation_unavailable_error() -> Error {
    Error {
        code: 202,
        message: "geolocation unavailable".into(),
    }
}

pub fn unauthorized_error() -> Error {
    Error {
        code: 401,
        message: "authentication failed".into(),
    }
}

pub fn forbidden_error() -> Error {
    Error {
        code: 403,
        message: "access denied".into(),
    }
}

pub fn not_found_error() -> Error {
    Error {
        code: 404,
        message: "not found".into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn decode_error<T: Debug>(_: T) -> Error {
    Error {
        code: 2,
        message: "decode error".into(),
    }
}

pub fn reqwest_error(_: reqwest::Error) -> Error {
    Error {
        code: 3,
        message: "reqwest error".into(),
    }
}

pub fn upstream_error() -> Error {
    Error {
        code: 4,
        message: "upstream error".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

pub fn channel_error<T: Debug>(_: T) -> Error {
    Error {
        code: 6,
        message: "dispatch channel error".into(),
    }
}

pub fn disconnected_error() -> Error {
    Error {
        code: 6,
        message: "dispatch channel closed".into(),
    }
}
