use thiserror::Error;

use crate::auth::matrix::Operation;
use crate::db::StoreError;

pub type CoreResult<T> = core::result::Result<T, CoreError>;

/// Failure of a ledger, goal or account operation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not permitted to {operation}")]
    Forbidden { operation: Operation },

    #[error("{collection}/{id} not found")]
    NotFound { collection: &'static str, id: String },

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error(transparent)]
    NotAuthenticated(#[from] NotAuthenticated),
}

#[derive(Debug, Error)]
#[error("no authenticated identity")]
pub struct NotAuthenticated;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("delta must not be zero")]
    ZeroDelta,

    #[error("delta {0} is outside -{max}..={max}", max = crate::constants::DELTA_MAGNITUDE_MAX)]
    DeltaOutOfRange(i64),

    #[error("'{0}' is not a YYYY-MM-DD date")]
    MalformedDate(String),

    #[error("unknown reason code '{0}'")]
    UnknownReasonCode(String),

    #[error("a reason is required when the reason code is 'other'")]
    MissingReasonText,

    #[error("goal point must be positive, got {0}")]
    InvalidGoalPoint(i64),

    #[error("goal label must not be empty")]
    EmptyGoalLabel,

    #[error("display name must not be empty")]
    EmptyDisplayName,

    #[error("display name is longer than {max} characters", max = crate::constants::DISPLAY_NAME_MAX_CHARS)]
    DisplayNameTooLong,

    #[error("{0} cannot be changed")]
    ImmutableField(&'static str),

    #[error("page size must not be negative, got {0}")]
    NegativePageLimit(i64),
}

impl CoreError {
    pub fn forbidden(operation: Operation) -> Self {
        CoreError::Forbidden { operation }
    }

    pub fn not_found(collection: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            collection,
            id: id.to_string(),
        }
    }
}
