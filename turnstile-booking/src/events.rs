use turnstile_core::{ConcertId, SeatId, SeatStatus, SeatingEvent, SessionId};

/// Events fanned out to the subscribers of a concert's room.
#[derive(Debug, Clone)]
pub enum BoxOfficeEvent {
    /// A seat moved to a new status. Consumed by clients to re-render a
    /// single seat without reloading the whole map.
    SeatUpdate {
        concert_id: ConcertId,
        seat_id: SeatId,
        status: SeatStatus,
        locked_by: Option<SessionId>,
    },
    /// A booking was finalized for this concert.
    BookingConfirmed {
        concert_id: ConcertId,
        seat_ids: Vec<SeatId>,
        reference: String,
    },
}

impl BoxOfficeEvent {
    /// Convert an engine event to a room-facing event.
    pub fn from_seating_event(event: SeatingEvent) -> Self {
        match event {
            SeatingEvent::SeatStatusUpdate {
                concert_id,
                seat_id,
                new_status,
                locked_by,
            } => Self::SeatUpdate {
                concert_id,
                seat_id,
                status: new_status,
                locked_by,
            },
        }
    }

    pub fn concert_id(&self) -> ConcertId {
        match self {
            Self::SeatUpdate { concert_id, .. } => *concert_id,
            Self::BookingConfirmed { concert_id, .. } => *concert_id,
        }
    }
}
