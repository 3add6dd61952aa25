use log::info;
use parking_lot::Mutex;
use turnstile_core::{ArcedStore, ConcertId};

use crate::BoxOfficeEvent;

use super::{RoomConnection, RoomConnectionHandle, RoomConnectionId};

/// A concert's real-time channel, holding the connections currently
/// subscribed to its seat updates.
pub struct Room {
    concert_id: ConcertId,
    connections: Mutex<Vec<RoomConnection>>,
}

impl Room {
    pub fn new(concert_id: ConcertId) -> Self {
        Self {
            concert_id,
            connections: Default::default(),
        }
    }

    pub fn concert_id(&self) -> ConcertId {
        self.concert_id
    }

    /// Adds a new connection and returns the handle that keeps it alive.
    pub fn connect(&self, rooms: &ArcedStore<ConcertId, Room>) -> RoomConnectionHandle {
        let connection = RoomConnection::new();
        let handle = connection.handle(self.concert_id, rooms.clone());

        self.connections.lock().push(connection);

        info!(
            "Connection {} joined the room for concert {}",
            handle.connection_id(),
            self.concert_id
        );

        handle
    }

    /// Called when a [RoomConnectionHandle] is dropped or a connection
    /// leaves explicitly.
    pub fn remove_connection(&self, connection_id: RoomConnectionId) {
        self.connections.lock().retain(|c| c.id != connection_id);

        info!(
            "Connection {} left the room for concert {}",
            connection_id, self.concert_id
        );
    }

    /// Delivers an event to every connection in the room.
    pub fn broadcast(&self, event: BoxOfficeEvent) {
        let connections = self.connections.lock();

        for connection in connections.iter() {
            connection.send(event.clone())
        }
    }

    pub fn members(&self) -> Vec<RoomConnectionId> {
        self.connections.lock().iter().map(|c| c.id).collect()
    }
}
