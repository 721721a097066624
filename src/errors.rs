use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;

use crate::models::{BookingStatus, Money};

/// Caller-correctable failures. Nothing has been written when one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("new checkout date {requested} must be after the current checkout date {current}")]
    CheckoutNotAfterCurrent {
        current: NaiveDate,
        requested: NaiveDate,
    },

    #[error("an extension must add at least one night")]
    NoAdditionalNights,

    #[error("payment amount {payment} must be between 0.00 and {total}")]
    PaymentOutOfRange { payment: Money, total: Money },

    #[error("no rooms selected for extension")]
    NoRoomsSelected,

    #[error("room {0} is not part of this booking")]
    UnknownRoom(String),

    #[error("status \"{}\" cannot be set directly, use its dedicated flow", .0.name())]
    ForbiddenStatus(BookingStatus),

    #[error("a booking cannot move from \"{}\" to \"{}\"", .from.name(), .to.name())]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("booking still has an outstanding balance of {remaining}, settle payment before checking out")]
    OutstandingBalance { remaining: Money },

    #[error("status id {0} is not in the status catalog")]
    UnknownStatus(i64),

    #[error("only approved or checked-in bookings can be extended (booking is \"{}\")", .0.name())]
    NotExtendable(BookingStatus),

    #[error("room {room_number} is full ({occupancy} of {capacity} occupants)")]
    RoomFull {
        room_number: String,
        occupancy: u32,
        capacity: u32,
    },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("booking is \"{}\", visitors can no longer be logged against it", .0.name())]
    BookingClosed(BookingStatus),

    #[error("visitor log {0} is already closed")]
    VisitorClosed(i64),

    #[error("cannot {action} while {step}")]
    OutOfStep {
        action: &'static str,
        step: &'static str,
    },

    #[error("extension amount is too large to represent")]
    AmountOverflow,

    #[error("booking {0} has inconsistent dates or amounts")]
    InconsistentBooking(i64),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConflictError {
    #[error("room {room_number} was already extended under {reference}")]
    RoomAlreadyExtended {
        room_number: String,
        reference: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("{0}")]
    Collaborator(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl EngineError {
    /// Wraps a data source/sink failure, keeping its message verbatim.
    pub fn collaborator(err: anyhow::Error) -> Self {
        EngineError::Collaborator(format!("{err:#}"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Engine(EngineError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Engine(EngineError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Engine(EngineError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Engine(EngineError::Collaborator(_)) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
