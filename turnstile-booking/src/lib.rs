mod booking;
mod coordinator;
mod events;
mod payment;
mod rooms;
mod util;

use std::{sync::Arc, thread};

use log::info;
use parking_lot::Mutex;

pub use booking::*;
pub use coordinator::*;
pub use events::*;
pub use payment::*;
pub use rooms::*;
pub use util::*;

use turnstile_core::{
    ArcedStore, ConcertId, Config, LockManager, NewSeat, Seat, Seating, SeatingContext,
    SeatingError,
};

/// The turnstile box office, facilitating seat reservations, bookings, and
/// real-time room fan-out.
pub struct BoxOffice {
    seating: Arc<Seating>,

    pub coordinator: ReservationCoordinator,
    pub rooms: RoomManager,
}

/// A type passed to various components of the box office, to access state,
/// finalize payment, and reach room subscribers.
#[derive(Clone)]
pub struct BoxOfficeContext {
    pub seating: SeatingContext,
    pub gateway: SharedGateway,

    pub rooms: ArcedStore<ConcertId, Room>,
    pub bookings: Arc<Mutex<Vec<Booking>>>,
}

impl BoxOffice {
    pub fn new(config: Config, gateway: SharedGateway) -> Self {
        let seating = Arc::new(Seating::new(config));

        let context = BoxOfficeContext {
            seating: seating.context().clone(),
            gateway,

            rooms: Default::default(),
            bookings: Default::default(),
        };

        let coordinator = ReservationCoordinator::new(&context);
        let rooms = RoomManager::new(&context);

        Self {
            seating,
            coordinator,
            rooms,
        }
    }

    /// Starts the expiry sweeper and the event pump. Call once.
    pub fn run(&self) {
        spawn_sweeper_thread(&self.seating);
        spawn_event_pump_thread(&self.seating, &self.rooms);
    }

    /// Registers a concert's seat map with the engine.
    pub fn register_concert(
        &self,
        concert_id: ConcertId,
        seats: Vec<NewSeat>,
    ) -> Result<(), SeatingError> {
        self.seating.register_concert(concert_id, seats)?;
        info!("Registered seat map for concert {}", concert_id);

        Ok(())
    }

    /// Returns an authoritative snapshot of every seat in a concert.
    pub fn seats_of(&self, concert_id: ConcertId) -> Result<Vec<Seat>, SeatingError> {
        self.seating.seats_of(concert_id)
    }

    pub fn seating(&self) -> &Seating {
        &self.seating
    }
}

/// Periodically recycles seat holds whose deadline has passed.
fn spawn_sweeper_thread(seating: &Arc<Seating>) {
    let locks = LockManager::new(seating.context());
    let interval = seating.context().config.sweep_interval();

    thread::spawn(move || loop {
        thread::sleep(interval);

        let recycled = locks.expire_sweep(chrono::Utc::now());

        if !recycled.is_empty() {
            info!("Recycled {} expired seat holds", recycled.len());
        }
    });
}

/// Drains engine events in emission order and fans them out to the rooms
/// they belong to. A single thread, so per-seat event order survives the
/// trip to subscribers.
fn spawn_event_pump_thread(seating: &Arc<Seating>, rooms: &RoomManager) {
    let seating = seating.clone();
    let rooms = rooms.clone();

    thread::spawn(move || loop {
        let event = seating.wait_for_event();

        rooms.broadcast(event.concert_id(), BoxOfficeEvent::from_seating_event(event));
    });
}
