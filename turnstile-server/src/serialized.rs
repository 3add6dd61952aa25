//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use serde::Serialize;
use turnstile_booking::Booking as BookingRecord;
use turnstile_core::{Seat as CoreSeat, SeatStatus as CoreSeatStatus, SeatTier};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SeatStatus {
    Available,
    Locked,
    Booked,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    id: String,
    row: u32,
    column: u32,
    tier: &'static str,
    price: u32,
    status: SeatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    locked_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lock_expires_at: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    id: u64,
    reference: String,
    concert_id: i32,
    session_id: String,
    seat_ids: Vec<String>,
    total: u32,
    status: &'static str,
    created_at: String,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<SeatStatus> for CoreSeatStatus {
    fn to_serialized(&self) -> SeatStatus {
        match self {
            CoreSeatStatus::Available => SeatStatus::Available,
            CoreSeatStatus::Locked => SeatStatus::Locked,
            CoreSeatStatus::Booked => SeatStatus::Booked,
        }
    }
}

impl ToSerialized<Seat> for CoreSeat {
    fn to_serialized(&self) -> Seat {
        Seat {
            id: self.id.clone(),
            row: self.row,
            column: self.column,
            tier: tier_name(self.tier),
            price: self.price,
            status: self.status.to_serialized(),
            locked_by: self.locked_by.clone(),
            lock_expires_at: self.lock_expires_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl ToSerialized<Booking> for BookingRecord {
    fn to_serialized(&self) -> Booking {
        Booking {
            id: self.id.value(),
            reference: self.reference.clone(),
            concert_id: self.concert_id,
            session_id: self.session_id.clone(),
            seat_ids: self.seat_ids.clone(),
            total: self.total,
            status: "confirmed",
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

fn tier_name(tier: SeatTier) -> &'static str {
    match tier {
        SeatTier::Standard => "standard",
        SeatTier::Premium => "premium",
        SeatTier::Vip => "vip",
    }
}
