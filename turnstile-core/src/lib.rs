use crossbeam::channel::unbounded;
use dashmap::DashMap;
use std::sync::Arc;

mod config;
mod events;
mod seats;
mod util;

pub use config::*;
pub use events::*;
pub use seats::*;
pub use util::*;

// Reduces verbosity
pub type ArcedStore<K, V> = Arc<DashMap<K, Arc<V>>>;

/// The turnstile seating engine, facilitating seat state, locking, and expiry.
pub struct Seating {
    locks: LockManager,
    context: SeatingContext,

    event_receiver: EventReceiver,
}

/// A type passed to various components of the engine, to access seat state and emit events.
#[derive(Clone)]
pub struct SeatingContext {
    pub config: Config,

    event_sender: EventSender,

    pub concerts: ArcedStore<ConcertId, ConcertSeating>,
}

impl Seating {
    pub fn new(config: Config) -> Seating {
        let (event_sender, event_receiver) = unbounded();

        let context = SeatingContext {
            config,
            event_sender,

            concerts: Default::default(),
        };

        let locks = LockManager::new(&context);

        Seating {
            locks,
            context,
            event_receiver,
        }
    }

    /// Registers a concert's seat map with the engine.
    pub fn register_concert(
        &self,
        concert_id: ConcertId,
        seats: Vec<NewSeat>,
    ) -> Result<(), SeatingError> {
        self.context.register_concert(concert_id, seats)
    }

    /// Returns an authoritative snapshot of every seat in a concert.
    pub fn seats_of(&self, concert_id: ConcertId) -> Result<Vec<Seat>, SeatingError> {
        Ok(self.context.concert(concert_id)?.seats())
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    pub fn context(&self) -> &SeatingContext {
        &self.context
    }

    /// Receive events from the engine, blocking until one arrives.
    pub fn wait_for_event(&self) -> SeatingEvent {
        self.event_receiver
            .recv()
            .expect("event is received without error")
    }

    /// Receive an event if one is immediately available.
    pub fn poll_event(&self) -> Option<SeatingEvent> {
        self.event_receiver.try_recv().ok()
    }
}

impl SeatingContext {
    pub fn emit(&self, event: SeatingEvent) {
        self.event_sender.send(event).expect("event is sent");
    }

    pub fn register_concert(
        &self,
        concert_id: ConcertId,
        seats: Vec<NewSeat>,
    ) -> Result<(), SeatingError> {
        if self.concerts.contains_key(&concert_id) {
            return Err(SeatingError::ConcertExists { concert_id });
        }

        let seating = ConcertSeating::new(self, concert_id, seats);
        self.concerts.insert(concert_id, seating.into());

        Ok(())
    }

    /// Returns the seating of a concert, if it is registered.
    pub fn concert(&self, concert_id: ConcertId) -> Result<Arc<ConcertSeating>, SeatingError> {
        self.concerts
            .get(&concert_id)
            .map(|c| c.clone())
            .ok_or(SeatingError::UnknownConcert { concert_id })
    }
}
