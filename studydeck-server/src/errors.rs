use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use studydeck_classroom::{AuthError, DatabaseError, MembershipError, SetError};
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{0}")]
    AccessDenied(String),
    /// The class would be left without an administrator
    #[error("{0}")]
    LastAdmin(String),
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Unknown privacy status: {0}")]
    UnknownPrivacy(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("A superuser already exists")]
    SuperuserExists,
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::AccessDenied(_) => StatusCode::FORBIDDEN,
            Self::LastAdmin(_) => StatusCode::CONFLICT,
            Self::UnknownRole(_) => StatusCode::BAD_REQUEST,
            Self::UnknownPrivacy(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::SuperuserExists => StatusCode::CONFLICT,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.as_status_code(), self.to_string()).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::SuperuserExists => Self::SuperuserExists,
            AuthError::Db(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<MembershipError> for ServerError {
    fn from(value: MembershipError) -> Self {
        match value {
            MembershipError::NotAMember => Self::NotFound {
                resource: "class membership",
                identifier: "user",
            },
            MembershipError::MemberNotFound(_) => Self::NotFound {
                resource: "class member",
                identifier: "user",
            },
            MembershipError::Unauthorized => Self::AccessDenied(value.to_string()),
            MembershipError::LastAdmin => Self::LastAdmin(value.to_string()),
            MembershipError::UnknownRole(role) => Self::UnknownRole(role),
            MembershipError::Db(e) => e.into(),
        }
    }
}

impl From<SetError> for ServerError {
    fn from(value: SetError) -> Self {
        match value {
            SetError::NotAMember => Self::AccessDenied(value.to_string()),
            SetError::Db(e) => e.into(),
        }
    }
}
