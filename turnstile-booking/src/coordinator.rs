use chrono::Utc;
use dashmap::DashMap;
use log::info;
use thiserror::Error;
use turnstile_core::{
    ConcertId, LockManager, Seat, SeatId, SeatStatus, SeatingError, SessionId, TransitionActor,
};

use crate::{Booking, BoxOfficeContext, BoxOfficeEvent, ChargeRequest};

#[derive(Debug, Error)]
pub enum ReserveError {
    #[error("Selection of {requested} seats exceeds the limit of {max}")]
    LimitExceeded { requested: usize, max: usize },
    #[error("A selection must contain at least one seat")]
    EmptySelection,
    #[error("Seat {seat_id} is no longer available")]
    Conflict { seat_id: SeatId, current: SeatStatus },
    #[error("The hold on seat {seat_id} lapsed before the booking completed")]
    LockExpired { seat_id: SeatId },
    #[error("There is no active selection to act on")]
    NoActiveSelection,
    #[error("Payment was declined: {0}")]
    PaymentDeclined(String),
    #[error(transparent)]
    Seating(#[from] SeatingError),
}

/// The lifecycle of a single selection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// The session has no attempt for this concert.
    Idle,
    /// Locks are being acquired seat by seat.
    Pending,
    /// Every requested seat is held by the session.
    AllLocked,
    /// The attempt became a booking.
    Confirmed,
    /// The attempt failed after taking locks, and every lock was released.
    RolledBack,
}

/// A session's selection attempt for one concert.
#[derive(Debug, Clone)]
pub struct Selection {
    pub seat_ids: Vec<SeatId>,
    pub state: AttemptState,
}

/// Turns a client's seat selection into lock acquisitions and, on
/// confirmation, into a booking.
///
/// Acquisition is seat by seat but the attempt is all-or-nothing: the first
/// conflict releases everything acquired so far, in acquisition order, and
/// fails the whole attempt.
pub struct ReservationCoordinator {
    context: BoxOfficeContext,
    locks: LockManager,
    selections: DashMap<(ConcertId, SessionId), Selection>,
}

impl ReservationCoordinator {
    pub fn new(context: &BoxOfficeContext) -> Self {
        Self {
            context: context.clone(),
            locks: LockManager::new(&context.seating),
            selections: Default::default(),
        }
    }

    /// Attempts to hold every requested seat for the session. Replaces any
    /// previous selection the session had for this concert.
    ///
    /// The size cap is enforced before any lock is attempted, so an
    /// oversized request has zero side effects.
    pub fn select_seats(
        &self,
        concert_id: ConcertId,
        seat_ids: Vec<SeatId>,
        session_id: &SessionId,
    ) -> Result<Vec<Seat>, ReserveError> {
        let max = self.context.seating.config.max_seats_per_order;
        let seat_ids = dedupe(seat_ids);

        if seat_ids.is_empty() {
            return Err(ReserveError::EmptySelection);
        }

        if seat_ids.len() > max {
            return Err(ReserveError::LimitExceeded {
                requested: seat_ids.len(),
                max,
            });
        }

        self.release_selection(concert_id, session_id);

        let key = (concert_id, session_id.clone());

        self.selections.insert(
            key.clone(),
            Selection {
                seat_ids: seat_ids.clone(),
                state: AttemptState::Pending,
            },
        );

        let mut acquired: Vec<Seat> = Vec::new();

        for seat_id in &seat_ids {
            match self.locks.acquire(concert_id, seat_id, session_id, Utc::now()) {
                Ok(seat) => acquired.push(seat),
                Err(error) => {
                    // Compensating releases, in acquisition order
                    for seat in &acquired {
                        let _ = self.locks.release(concert_id, &seat.id, session_id);
                    }

                    self.selections.insert(
                        key,
                        Selection {
                            seat_ids,
                            state: AttemptState::RolledBack,
                        },
                    );

                    return Err(reserve_error(error));
                }
            }
        }

        self.selections.insert(
            key,
            Selection {
                seat_ids,
                state: AttemptState::AllLocked,
            },
        );

        info!(
            "Session {} holds {} seats for concert {}",
            session_id,
            acquired.len(),
            concert_id
        );

        Ok(acquired)
    }

    /// Releases the session's held seats immediately, rather than waiting
    /// for their TTL to free them for other buyers.
    pub fn cancel_selection(
        &self,
        concert_id: ConcertId,
        session_id: &SessionId,
    ) -> Result<(), ReserveError> {
        if self.release_selection(concert_id, session_id) {
            info!(
                "Session {} cancelled its selection for concert {}",
                session_id, concert_id
            );

            Ok(())
        } else {
            Err(ReserveError::NoActiveSelection)
        }
    }

    /// Finalizes the session's held selection into a booking.
    ///
    /// Every hold is re-validated and extended before the charge, the
    /// gateway's verdict is treated as opaque, and only then is each seat
    /// handed over from its hold to the booking in a single transition.
    /// Any failure along the way rolls the whole attempt back.
    pub async fn confirm_booking(
        &self,
        concert_id: ConcertId,
        session_id: &SessionId,
        payment_ref: String,
    ) -> Result<Booking, ReserveError> {
        let key = (concert_id, session_id.clone());

        let seat_ids = {
            let entry = self
                .selections
                .get(&key)
                .ok_or(ReserveError::NoActiveSelection)?;

            if entry.state != AttemptState::AllLocked {
                return Err(ReserveError::NoActiveSelection);
            }

            entry.seat_ids.clone()
        };

        let concert = self.context.seating.concert(concert_id)?;
        let now = Utc::now();

        // Re-validate and refresh every hold before charging
        let mut held: Vec<Seat> = Vec::new();

        for seat_id in &seat_ids {
            match self.locks.extend(concert_id, seat_id, session_id, now) {
                Ok(seat) => held.push(seat),
                Err(_) => {
                    self.roll_back(concert_id, session_id);

                    return Err(ReserveError::LockExpired {
                        seat_id: seat_id.clone(),
                    });
                }
            }
        }

        let charge = ChargeRequest {
            concert_id,
            session_id: session_id.clone(),
            payment_ref: payment_ref.clone(),
            amount: held.iter().map(|s| s.price).sum(),
        };

        if let Err(error) = self.context.gateway.charge(charge).await {
            self.roll_back(concert_id, session_id);

            return Err(ReserveError::PaymentDeclined(error.to_string()));
        }

        // Hand each seat over from its hold to the booking
        let mut booked: Vec<Seat> = Vec::new();

        for seat_id in &seat_ids {
            let result = concert.apply_transition(
                seat_id,
                SeatStatus::Locked,
                SeatStatus::Booked,
                TransitionActor::Session(session_id.clone()),
                Utc::now(),
            );

            match result {
                Ok(seat) => booked.push(seat),
                Err(_) => {
                    // Undo the partially completed handoff
                    for seat in &booked {
                        let _ = concert.apply_transition(
                            &seat.id,
                            SeatStatus::Booked,
                            SeatStatus::Available,
                            TransitionActor::Session(session_id.clone()),
                            Utc::now(),
                        );
                    }

                    self.roll_back(concert_id, session_id);

                    return Err(ReserveError::LockExpired {
                        seat_id: seat_id.clone(),
                    });
                }
            }
        }

        let booking = Booking::confirmed(concert_id, session_id.clone(), &booked, payment_ref);

        self.context.bookings.lock().push(booking.clone());
        self.selections.insert(
            key,
            Selection {
                seat_ids,
                state: AttemptState::Confirmed,
            },
        );

        info!(
            "Booking {} confirmed for session {} with {} seats",
            booking.reference,
            session_id,
            booking.seat_ids.len()
        );

        if let Some(room) = self.context.rooms.get(&concert_id) {
            room.broadcast(BoxOfficeEvent::BookingConfirmed {
                concert_id,
                seat_ids: booking.seat_ids.clone(),
                reference: booking.reference.clone(),
            });
        }

        Ok(booking)
    }

    /// The state of a session's latest attempt for a concert.
    pub fn selection_state(&self, concert_id: ConcertId, session_id: &SessionId) -> AttemptState {
        self.selections
            .get(&(concert_id, session_id.clone()))
            .map(|s| s.state)
            .unwrap_or(AttemptState::Idle)
    }

    /// All confirmed bookings for a concert.
    pub fn bookings_for(&self, concert_id: ConcertId) -> Vec<Booking> {
        self.context
            .bookings
            .lock()
            .iter()
            .filter(|b| b.concert_id == concert_id)
            .cloned()
            .collect()
    }

    /// Removes the session's attempt and releases any seats it still holds.
    /// Returns whether there was a live attempt to release.
    fn release_selection(&self, concert_id: ConcertId, session_id: &SessionId) -> bool {
        let key = (concert_id, session_id.clone());

        let Some((_, selection)) = self.selections.remove(&key) else {
            return false;
        };

        let live = matches!(
            selection.state,
            AttemptState::Pending | AttemptState::AllLocked
        );

        if live {
            for seat_id in &selection.seat_ids {
                let _ = self.locks.release(concert_id, seat_id, session_id);
            }
        }

        live
    }

    /// Releases whatever the attempt still holds and marks it rolled back.
    fn roll_back(&self, concert_id: ConcertId, session_id: &SessionId) {
        let key = (concert_id, session_id.clone());

        let Some((_, selection)) = self.selections.remove(&key) else {
            return;
        };

        for seat_id in &selection.seat_ids {
            let _ = self.locks.release(concert_id, seat_id, session_id);
        }

        self.selections.insert(
            key,
            Selection {
                seat_ids: selection.seat_ids,
                state: AttemptState::RolledBack,
            },
        );
    }
}

fn reserve_error(error: SeatingError) -> ReserveError {
    match error {
        SeatingError::Conflict { seat_id, current } => ReserveError::Conflict { seat_id, current },
        other => ReserveError::Seating(other),
    }
}

/// Removes repeated seat ids while preserving the requested order.
fn dedupe(seat_ids: Vec<SeatId>) -> Vec<SeatId> {
    let mut seen = std::collections::HashSet::new();

    seat_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use turnstile_core::{Config, NewSeat, SeatTier};

    use super::*;
    use crate::{AcceptAllGateway, BookingStatus, BoxOffice, PaymentError, PaymentGateway};

    struct DecliningGateway;

    #[async_trait]
    impl PaymentGateway for DecliningGateway {
        async fn charge(&self, _request: ChargeRequest) -> Result<(), PaymentError> {
            Err(PaymentError::Declined {
                reason: "card declined".to_string(),
            })
        }
    }

    fn box_office_with(gateway: crate::SharedGateway) -> BoxOffice {
        let office = BoxOffice::new(Config::default(), gateway);

        let seats = (1..=12)
            .map(|column| NewSeat {
                id: format!("A-{column}"),
                row: 1,
                column,
                tier: SeatTier::Standard,
            })
            .collect();

        office.register_concert(1, seats).unwrap();
        office
    }

    fn box_office() -> BoxOffice {
        box_office_with(Arc::new(AcceptAllGateway))
    }

    fn seat_status(office: &BoxOffice, seat_id: &str) -> SeatStatus {
        office
            .seating()
            .context()
            .concert(1)
            .unwrap()
            .seat(&seat_id.to_string())
            .unwrap()
            .status
    }

    #[test]
    fn test_partial_conflict_rolls_everything_back() {
        let office = box_office();
        let alice = "alice".to_string();
        let bob = "bob".to_string();

        // Bob takes A-2 first
        office
            .coordinator
            .select_seats(1, vec!["A-2".to_string()], &bob)
            .unwrap();

        let result =
            office
                .coordinator
                .select_seats(1, vec!["A-1".to_string(), "A-2".to_string()], &alice);

        assert!(
            matches!(result, Err(ReserveError::Conflict { ref seat_id, .. }) if seat_id == "A-2"),
            "the attempt should fail on the seat bob holds"
        );
        assert_eq!(
            seat_status(&office, "A-1"),
            SeatStatus::Available,
            "the seat alice did acquire should be released again"
        );
        assert_eq!(
            office.coordinator.selection_state(1, &alice),
            AttemptState::RolledBack
        );
    }

    #[test]
    fn test_oversized_selection_has_no_side_effects() {
        let office = box_office();
        let session = "alice".to_string();

        let seat_ids: Vec<_> = (1..=11).map(|n| format!("A-{n}")).collect();
        let result = office.coordinator.select_seats(1, seat_ids, &session);

        assert!(matches!(
            result,
            Err(ReserveError::LimitExceeded {
                requested: 11,
                max: 10
            })
        ));

        for n in 1..=11 {
            assert_eq!(seat_status(&office, &format!("A-{n}")), SeatStatus::Available);
        }

        assert!(
            office.seating().poll_event().is_none(),
            "no lock should have been attempted"
        );
        assert_eq!(
            office.coordinator.selection_state(1, &session),
            AttemptState::Idle
        );
    }

    #[test]
    fn test_duplicate_seat_ids_collapse() {
        let office = box_office();
        let session = "alice".to_string();

        let held = office
            .coordinator
            .select_seats(
                1,
                vec!["A-1".to_string(), "A-1".to_string(), "A-2".to_string()],
                &session,
            )
            .unwrap();

        assert_eq!(held.len(), 2);
    }

    #[test]
    fn test_reselection_replaces_the_previous_holds() {
        let office = box_office();
        let session = "alice".to_string();

        office
            .coordinator
            .select_seats(1, vec!["A-1".to_string()], &session)
            .unwrap();
        office
            .coordinator
            .select_seats(1, vec!["A-2".to_string()], &session)
            .unwrap();

        assert_eq!(seat_status(&office, "A-1"), SeatStatus::Available);
        assert_eq!(seat_status(&office, "A-2"), SeatStatus::Locked);
    }

    #[test]
    fn test_cancel_frees_the_seats_immediately() {
        let office = box_office();
        let session = "alice".to_string();

        office
            .coordinator
            .select_seats(1, vec!["A-1".to_string(), "A-2".to_string()], &session)
            .unwrap();

        office.coordinator.cancel_selection(1, &session).unwrap();

        assert_eq!(seat_status(&office, "A-1"), SeatStatus::Available);
        assert_eq!(seat_status(&office, "A-2"), SeatStatus::Available);

        let again = office.coordinator.cancel_selection(1, &session);
        assert!(matches!(again, Err(ReserveError::NoActiveSelection)));
    }

    #[tokio::test]
    async fn test_confirmation_books_every_seat() {
        let office = box_office();
        let session = "alice".to_string();

        office
            .coordinator
            .select_seats(1, vec!["A-1".to_string(), "A-2".to_string()], &session)
            .unwrap();

        let booking = office
            .coordinator
            .confirm_booking(1, &session, "pay_123".to_string())
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.total, 2 * SeatTier::Standard.price());
        assert_eq!(booking.seat_ids, vec!["A-1", "A-2"]);

        for seat_id in ["A-1", "A-2"] {
            let seat = office
                .seating()
                .context()
                .concert(1)
                .unwrap()
                .seat(&seat_id.to_string())
                .unwrap();

            assert_eq!(seat.status, SeatStatus::Booked);
            assert!(seat.locked_by.is_none(), "handoff should clear the owner");
            assert!(seat.lock_expires_at.is_none());
        }

        assert_eq!(office.coordinator.bookings_for(1).len(), 1);
        assert_eq!(
            office.coordinator.selection_state(1, &session),
            AttemptState::Confirmed
        );
    }

    #[tokio::test]
    async fn test_payment_decline_releases_the_holds() {
        let office = box_office_with(Arc::new(DecliningGateway));
        let session = "alice".to_string();

        office
            .coordinator
            .select_seats(1, vec!["A-1".to_string(), "A-2".to_string()], &session)
            .unwrap();

        let result = office
            .coordinator
            .confirm_booking(1, &session, "pay_123".to_string())
            .await;

        assert!(matches!(result, Err(ReserveError::PaymentDeclined(_))));
        assert_eq!(seat_status(&office, "A-1"), SeatStatus::Available);
        assert_eq!(seat_status(&office, "A-2"), SeatStatus::Available);
        assert_eq!(
            office.coordinator.selection_state(1, &session),
            AttemptState::RolledBack
        );
        assert!(office.coordinator.bookings_for(1).is_empty());
    }

    #[tokio::test]
    async fn test_expired_holds_fail_confirmation() {
        let office = box_office();
        let session = "alice".to_string();

        office
            .coordinator
            .select_seats(1, vec!["A-1".to_string()], &session)
            .unwrap();

        // The sweep fires well past the TTL, recycling the hold
        let recycled = office
            .seating()
            .locks()
            .expire_sweep(Utc::now() + Duration::seconds(180));
        assert_eq!(recycled.len(), 1);

        let result = office
            .coordinator
            .confirm_booking(1, &session, "pay_123".to_string())
            .await;

        assert!(
            matches!(result, Err(ReserveError::LockExpired { ref seat_id }) if seat_id == "A-1")
        );
        assert_eq!(seat_status(&office, "A-1"), SeatStatus::Available);
    }

    #[tokio::test]
    async fn test_confirm_without_selection_fails() {
        let office = box_office();

        let result = office
            .coordinator
            .confirm_booking(1, &"alice".to_string(), "pay_123".to_string())
            .await;

        assert!(matches!(result, Err(ReserveError::NoActiveSelection)));
    }
}
