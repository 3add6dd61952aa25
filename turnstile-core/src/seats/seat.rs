use chrono::{DateTime, Utc};

/// Identifies a concert. Concerts themselves are owned by an external
/// catalog, the engine only knows their seat maps.
pub type ConcertId = i32;

/// A stable, caller-supplied seat identifier, e.g. "A-12".
pub type SeatId = String;

/// An opaque token identifying a buyer's session.
pub type SessionId = String;

/// The pricing category of a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatTier {
    Standard,
    Premium,
    Vip,
}

impl SeatTier {
    /// The price of a seat in this tier, in minor currency units.
    pub fn price(&self) -> u32 {
        match self {
            SeatTier::Standard => 4500,
            SeatTier::Premium => 7500,
            SeatTier::Vip => 12_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatStatus {
    Available,
    Locked,
    Booked,
}

/// A single seat in a concert's seat map.
///
/// `locked_by` and `lock_expires_at` are present if and only if the status
/// is [SeatStatus::Locked]. The store upholds this, everything else only
/// observes it.
#[derive(Debug, Clone)]
pub struct Seat {
    pub id: SeatId,
    /// Positional, not used by the engine itself.
    pub row: u32,
    pub column: u32,
    pub tier: SeatTier,
    /// Derived from the tier at creation, in minor currency units. Immutable.
    pub price: u32,
    pub status: SeatStatus,
    pub locked_by: Option<SessionId>,
    pub lock_expires_at: Option<DateTime<Utc>>,
}

/// A seat definition as supplied by the seat map of a concert.
#[derive(Debug, Clone)]
pub struct NewSeat {
    pub id: SeatId,
    pub row: u32,
    pub column: u32,
    pub tier: SeatTier,
}

impl Seat {
    pub fn new(definition: NewSeat) -> Self {
        Self {
            id: definition.id,
            row: definition.row,
            column: definition.column,
            tier: definition.tier,
            price: definition.tier.price(),
            status: SeatStatus::Available,
            locked_by: None,
            lock_expires_at: None,
        }
    }
}
