use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use turnstile_booking::{ReserveError, RoomError};
use turnstile_core::SeatingError;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Reserve(#[from] ReserveError),
    #[error(transparent)]
    Seating(#[from] SeatingError),
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Reserve(error) => match error {
                ReserveError::LimitExceeded { .. } | ReserveError::EmptySelection => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ReserveError::Conflict { .. } | ReserveError::LockExpired { .. } => {
                    StatusCode::CONFLICT
                }
                ReserveError::NoActiveSelection => StatusCode::NOT_FOUND,
                ReserveError::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
                ReserveError::Seating(error) => seating_status(error),
            },
            Self::Seating(error) => seating_status(error),
            Self::Room(RoomError::UnknownConcert(_)) => StatusCode::NOT_FOUND,
        }
    }
}

fn seating_status(error: &SeatingError) -> StatusCode {
    match error {
        SeatingError::Conflict { .. } | SeatingError::ConcertExists { .. } => StatusCode::CONFLICT,
        SeatingError::UnknownConcert { .. } | SeatingError::UnknownSeat { .. } => {
            StatusCode::NOT_FOUND
        }
        SeatingError::Integrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.as_status_code(), self.to_string()).into_response()
    }
}
