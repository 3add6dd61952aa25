use chrono::{DateTime, Utc};
use turnstile_core::{ConcertId, Id, Seat, SeatId, SessionId};

use crate::reference_code;

pub type BookingId = Id<Booking>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed,
}

/// A finalized purchase of one or more seats. Only ever created after every
/// requested seat was held by the same session and payment went through.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: BookingId,
    /// Short human-readable code shown to the buyer.
    pub reference: String,
    pub concert_id: ConcertId,
    pub session_id: SessionId,
    pub seat_ids: Vec<SeatId>,
    /// Total amount in minor currency units.
    pub total: u32,
    pub payment_ref: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub(crate) fn confirmed(
        concert_id: ConcertId,
        session_id: SessionId,
        seats: &[Seat],
        payment_ref: String,
    ) -> Self {
        Self {
            id: BookingId::new(),
            reference: reference_code(6),
            concert_id,
            session_id,
            seat_ids: seats.iter().map(|s| s.id.clone()).collect(),
            total: seats.iter().map(|s| s.price).sum(),
            payment_ref,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        }
    }
}
