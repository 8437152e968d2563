use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use runcrew_db::UniqueViolation;
use runcrew_types::validation::FieldViolation;

/// Stable error codes consumed by whatever boundary layer embeds the
/// services. The serialized names must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFoundUser,
    AlreadyExistEmail,
    AlreadyExistPhone,
    InvalidPassword,
    EncryptionError,
    InvalidInput,
    NotFoundCrew,
    AlreadyExistCrew,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFoundUser => "NOT_FOUND_USER",
            Self::AlreadyExistEmail => "ALREADY_EXIST_EMAIL",
            Self::AlreadyExistPhone => "ALREADY_EXIST_PHONE",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::EncryptionError => "ENCRYPTION_ERROR",
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFoundCrew => "NOT_FOUND_CREW",
            Self::AlreadyExistCrew => "ALREADY_EXIST_CREW",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFoundUser => "user not found",
            Self::AlreadyExistEmail => "email is already registered",
            Self::AlreadyExistPhone => "phone number is already registered",
            Self::InvalidPassword => "password does not match",
            Self::EncryptionError => "failed to process credentials",
            Self::InvalidInput => "request failed validation",
            Self::NotFoundCrew => "crew not found",
            Self::AlreadyExistCrew => "crew name is already taken",
            Self::InternalError => "internal error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{}", .0.message())]
    Domain(ErrorCode),

    #[error("invalid input: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Domain(code) => *code,
            Self::Validation(_) => ErrorCode::InvalidInput,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Map a storage write error, turning UNIQUE failures into the matching
    /// "already exists" code.
    pub fn from_store(err: anyhow::Error) -> Self {
        let code = match err.downcast_ref::<UniqueViolation>() {
            Some(v) if v.column == "email" => ErrorCode::AlreadyExistEmail,
            Some(v) if v.column == "phone_number" => ErrorCode::AlreadyExistPhone,
            Some(v) if v.column == "crew_name" => ErrorCode::AlreadyExistCrew,
            _ => return Self::Internal(err),
        };
        Self::Domain(code)
    }

    /// Credential flows report any non-domain failure as `ENCRYPTION_ERROR`
    /// so clients see one code for crypto and storage faults alike.
    pub(crate) fn into_credential_error(self) -> Self {
        match self {
            Self::Internal(err) => {
                warn!("Credential operation failed: {:#}", err);
                Self::Domain(ErrorCode::EncryptionError)
            }
            other => other,
        }
    }
}

impl From<ErrorCode> for ServiceError {
    fn from(code: ErrorCode) -> Self {
        Self::Domain(code)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_to_their_stable_names() {
        for code in [
            ErrorCode::NotFoundUser,
            ErrorCode::AlreadyExistEmail,
            ErrorCode::AlreadyExistPhone,
            ErrorCode::InvalidPassword,
            ErrorCode::EncryptionError,
            ErrorCode::NotFoundCrew,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn unique_violations_map_to_domain_codes() {
        let err = anyhow::Error::new(UniqueViolation {
            table: "members".into(),
            column: "phone_number".into(),
        });
        assert_eq!(ServiceError::from_store(err).code(), ErrorCode::AlreadyExistPhone);

        let other = ServiceError::from_store(anyhow::anyhow!("disk full"));
        assert_eq!(other.code(), ErrorCode::InternalError);
    }

    #[test]
    fn credential_collapse_keeps_domain_codes() {
        let internal = ServiceError::Internal(anyhow::anyhow!("bad hash"));
        assert_eq!(internal.into_credential_error().code(), ErrorCode::EncryptionError);

        let domain = ServiceError::Domain(ErrorCode::InvalidPassword);
        assert_eq!(domain.into_credential_error().code(), ErrorCode::InvalidPassword);
    }

    #[test]
    fn validation_message_lists_fields() {
        let err = ServiceError::Validation(vec![
            FieldViolation {
                field: "email",
                message: "must not be blank".into(),
            },
            FieldViolation {
                field: "name",
                message: "must not be blank".into(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "invalid input: email: must not be blank, name: must not be blank"
        );
    }
}
