use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if let Some(err) = err.find::<ApiError>() {
        err.clone()
    } else if err.is_not_found() {
        ApiError::new(ApiErrorCode::NotFound, "no such route")
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        ApiError::new(ApiErrorCode::InvalidToken, e.to_string())
    } else if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        ApiError::new(ApiErrorCode::InvalidArgument, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        ApiError::new(ApiErrorCode::InvalidArgument, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiError::new(ApiErrorCode::MethodNotAllowed, "method not allowed")
    } else {
        warn!("Unhandled rejection: {:?}", err);
        ApiError::new(ApiErrorCode::InternalError, "internal error")
    };

    let status = error.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(error));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> Self {
        warn!("Internal error: {}", error);
        Self::new(ApiErrorCode::InternalError, "internal error")
    }
}

impl reject::Reject for ApiError {}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Invalid argument")]
    InvalidArgument,
    #[error("Not found")]
    NotFound,
    #[error("Conflict")]
    Conflict,
    #[error("Transaction aborted, retry")]
    TransactionAborted,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::Conflict => StatusCode::CONFLICT,
            ApiErrorCode::TransactionAborted => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InvalidToken | ApiErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RelationError> for ApiError {
    fn from(error: RelationError) -> Self {
        let code = match error.kind() {
            ErrorKind::InvalidArgument => ApiErrorCode::InvalidArgument,
            ErrorKind::NotFound => ApiErrorCode::NotFound,
            ErrorKind::Conflict => ApiErrorCode::Conflict,
            ErrorKind::TransactionAborted => ApiErrorCode::TransactionAborted,
            ErrorKind::Internal => return ApiError::internal(error),
        };
        ApiError::new(code, error.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::TokenInvalid => ApiError::new(ApiErrorCode::InvalidToken, error.to_string()),
            AuthError::TokenExpired => ApiError::new(ApiErrorCode::TokenExpired, error.to_string()),
            AuthError::InternalError(e) => ApiError::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_errors_map_to_distinct_statuses() {
        let cases = [
            (RelationError::SelfAction, StatusCode::BAD_REQUEST),
            (RelationError::UserNotFound, StatusCode::NOT_FOUND),
            (RelationError::AlreadyFollowing, StatusCode::CONFLICT),
            (
                RelationError::TransactionAborted("deadline".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                RelationError::Store("disk on fire".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).code.status(), status);
        }
    }

    #[test]
    fn internal_details_are_not_echoed() {
        let error = ApiError::from(RelationError::Store("password=hunter2".into()));
        assert!(!error.message.contains("hunter2"));
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        assert_eq!(
            ApiError::from(AuthError::TokenExpired).code.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
