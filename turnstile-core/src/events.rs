use crossbeam::channel::{Receiver, Sender};

use crate::{ConcertId, SeatId, SeatStatus, SessionId};

pub type EventSender = Sender<SeatingEvent>;
pub type EventReceiver = Receiver<SeatingEvent>;

/// Describes the events that can be emitted by the seating engine.
#[derive(Debug, Clone)]
pub enum SeatingEvent {
    /// A seat moved to a new status.
    SeatStatusUpdate {
        concert_id: ConcertId,
        seat_id: SeatId,
        /// The status after the transition.
        new_status: SeatStatus,
        /// The session owning the hold, present while the seat is locked.
        locked_by: Option<SessionId>,
    },
}

impl SeatingEvent {
    /// The concert this event belongs to, used for room-scoped fan-out.
    pub fn concert_id(&self) -> ConcertId {
        match self {
            SeatingEvent::SeatStatusUpdate { concert_id, .. } => *concert_id,
        }
    }
}
