use std::convert::Infallible;

use serde::Serialize;
use warp::{
    http::StatusCode,
    reject::{Reject, Rejection},
    reply::Reply,
};

/// Wire-level error: the status code and message a failed request resolves to.
#[derive(Debug, Clone, Serialize)]
pub struct Error {
    pub code: u16,
    pub info: Option<String>,
}

impl Error {
    pub fn new(code: u16, info: &str) -> Self {
        Self {
            code,
            info: Some(info.to_string()),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) {}", self.code, self.info.as_deref().unwrap_or(""))
    }
}

impl std::error::Error for Error {}

impl Reject for Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request")]
    InvalidRequest,
    #[error("Conflict")]
    Conflict,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid session")]
    InvalidSession,
    #[error("Forbidden")]
    Forbidden,
    #[error("Not found")]
    NotFound,
    #[error("Internal server error")]
    InternalServerError,
}

impl ApiError {
    /// Conflicts surface as 400 rather than 409, matching the public API contract.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::InvalidRequest => 400,
            ApiError::Conflict => 400,
            ApiError::Unauthorized => 401,
            ApiError::InvalidSession => 401,
            ApiError::Forbidden => 403,
            ApiError::NotFound => 404,
            ApiError::InternalServerError => 500,
        }
    }

    pub fn new(self, info: &str) -> Error {
        Error::new(self.status(), info)
    }

    pub fn default(self) -> Error {
        Error::new(self.status(), &self.to_string())
    }
}

/// Rejection recovery for consumers mounting the SDK's filters: resolves any
/// rejection into a JSON body carrying the mapped status code.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let error = if let Some(error) = err.find::<Error>() {
        error.clone()
    } else if err.is_not_found() {
        ApiError::NotFound.default()
    } else if err.find::<warp::reject::MissingCookie>().is_some() {
        ApiError::Unauthorized.default()
    } else if err.find::<warp::body::BodyDeserializeError>().is_some() {
        ApiError::InvalidRequest.default()
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        ApiError::InternalServerError.default()
    };

    let status =
        StatusCode::from_u16(error.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Ok(warp::reply::with_status(warp::reply::json(&error), status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::InvalidRequest.status(), 400);
        assert_eq!(ApiError::Conflict.status(), 400);
        assert_eq!(ApiError::Unauthorized.status(), 401);
        assert_eq!(ApiError::InvalidSession.status(), 401);
        assert_eq!(ApiError::Forbidden.status(), 403);
        assert_eq!(ApiError::NotFound.status(), 404);
        assert_eq!(ApiError::InternalServerError.status(), 500);
    }

    #[test]
    fn new_carries_info() {
        let error = ApiError::NotFound.new("No recipe exists with specified id");
        assert_eq!(error.code, 404);
        assert_eq!(
            error.info.as_deref(),
            Some("No recipe exists with specified id")
        );
    }

    #[test]
    fn default_uses_kind_message() {
        let error = ApiError::Conflict.default();
        assert_eq!(error.code, 400);
        assert_eq!(error.info.as_deref(), Some("Conflict"));
    }
}
