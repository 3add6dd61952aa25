mod locks;
mod seat;
mod store;

pub use locks::*;
pub use seat::*;
pub use store::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeatingError {
    /// The seat is not in the state the requested transition expects.
    /// Callers are told which seat failed, no retry happens automatically.
    #[error("Seat {seat_id} is not available, its current status is {current:?}")]
    Conflict { seat_id: SeatId, current: SeatStatus },
    #[error("Concert {concert_id} has no registered seat map")]
    UnknownConcert { concert_id: ConcertId },
    #[error("Seat {seat_id} does not exist in this concert")]
    UnknownSeat { seat_id: SeatId },
    #[error("A seat map is already registered for concert {concert_id}")]
    ConcertExists { concert_id: ConcertId },
    /// An invariant of the seat store was violated. This is unrecoverable
    /// and must never be silently repaired.
    #[error("Seat store integrity violation: {0}")]
    Integrity(String),
}

impl SeatingError {
    /// Whether the error is the seat simply being taken, as opposed to a
    /// misuse of the engine or a fatal condition.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SeatingError::Conflict { .. })
    }
}
