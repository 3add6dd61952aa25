mod connection;
mod room;

use thiserror::Error;
use turnstile_core::{ArcedStore, ConcertId, SeatingContext};

pub use connection::*;
pub use room::*;

use crate::{BoxOfficeContext, BoxOfficeEvent};

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Concert {0} has no registered seat map")]
    UnknownConcert(ConcertId),
}

/// Tracks which connection is subscribed to which concert's real-time
/// channel, for scoped fan-out and cleanup on disconnect.
#[derive(Clone)]
pub struct RoomManager {
    seating: SeatingContext,
    rooms: ArcedStore<ConcertId, Room>,
}

impl RoomManager {
    pub fn new(context: &BoxOfficeContext) -> Self {
        Self {
            seating: context.seating.clone(),
            rooms: context.rooms.clone(),
        }
    }

    /// Subscribes a new connection to a concert's room. The returned handle
    /// is the subscription: dropping it is the disconnect notification and
    /// purges the connection without an explicit leave.
    pub fn join(&self, concert_id: ConcertId) -> Result<RoomConnectionHandle, RoomError> {
        self.seating
            .concert(concert_id)
            .map_err(|_| RoomError::UnknownConcert(concert_id))?;

        let room = self
            .rooms
            .entry(concert_id)
            .or_insert_with(|| Room::new(concert_id).into())
            .clone();

        Ok(room.connect(&self.rooms))
    }

    /// Explicitly removes a connection from a concert's room.
    pub fn leave(&self, concert_id: ConcertId, connection_id: RoomConnectionId) {
        if let Some(room) = self.rooms.get(&concert_id) {
            room.remove_connection(connection_id)
        }
    }

    pub fn members_of(&self, concert_id: ConcertId) -> Vec<RoomConnectionId> {
        self.rooms
            .get(&concert_id)
            .map(|room| room.members())
            .unwrap_or_default()
    }

    /// Fans an event out to every subscriber of a concert's room. Purely
    /// side-effect free beyond delivery, and never fails the caller: a
    /// missing or empty room only delays real-time visibility, the seat
    /// store stays authoritative.
    pub fn broadcast(&self, concert_id: ConcertId, event: BoxOfficeEvent) {
        if let Some(room) = self.rooms.get(&concert_id) {
            room.broadcast(event)
        }
    }
}
