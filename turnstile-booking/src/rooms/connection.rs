use std::{
    collections::VecDeque,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, Waker},
};

use futures_util::Stream;
use parking_lot::Mutex;
use turnstile_core::{ArcedStore, ConcertId, Id};

use crate::BoxOfficeEvent;

use super::Room;

pub type RoomConnectionId = Id<RoomConnection>;

/// Represents a subscriber's presence in a concert's room.
pub struct RoomConnection {
    pub id: RoomConnectionId,
    /// Events delivered but not yet consumed, oldest first.
    pending_events: Arc<Mutex<VecDeque<BoxOfficeEvent>>>,
    waker: Arc<Mutex<Option<Waker>>>,
}

/// A handle to a room subscription, yielding events as a [Stream]. When
/// dropped, the [RoomConnection] is purged from its room. Seat holds of the
/// session behind the connection are untouched, expiry owns those.
pub struct RoomConnectionHandle {
    connection_id: RoomConnectionId,
    concert_id: ConcertId,
    /// Required to remove the connection when dropped
    rooms: ArcedStore<ConcertId, Room>,
    /// A reference to [RoomConnection]'s pending events
    pending_events: Arc<Mutex<VecDeque<BoxOfficeEvent>>>,
    /// A reference to [RoomConnection]'s stored [Waker]
    waker: Arc<Mutex<Option<Waker>>>,
}

impl RoomConnection {
    pub(super) fn new() -> Self {
        Self {
            id: RoomConnectionId::new(),
            pending_events: Default::default(),
            waker: Default::default(),
        }
    }

    pub(super) fn send(&self, event: BoxOfficeEvent) {
        self.pending_events.lock().push_back(event);

        if let Some(waker) = self.waker.lock().take() {
            waker.wake()
        }
    }

    pub(super) fn handle(
        &self,
        concert_id: ConcertId,
        rooms: ArcedStore<ConcertId, Room>,
    ) -> RoomConnectionHandle {
        RoomConnectionHandle {
            connection_id: self.id,
            concert_id,
            rooms,
            pending_events: self.pending_events.clone(),
            waker: self.waker.clone(),
        }
    }
}

impl RoomConnectionHandle {
    pub fn connection_id(&self) -> RoomConnectionId {
        self.connection_id
    }

    pub fn concert_id(&self) -> ConcertId {
        self.concert_id
    }
}

impl Stream for RoomConnectionHandle {
    type Item = BoxOfficeEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut pending_events = self.pending_events.lock();

        // Oldest first, so per-seat delivery order matches emission order
        if let Some(event) = pending_events.pop_front() {
            return Poll::Ready(Some(event));
        }

        *self.waker.lock() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for RoomConnectionHandle {
    fn drop(&mut self) {
        if let Some(room) = self.rooms.get(&self.concert_id) {
            room.remove_connection(self.connection_id)
        }
    }
}
