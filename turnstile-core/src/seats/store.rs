use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::{
    Config, EventSender, NewSeat, Seat, SeatId, SeatStatus, SeatingContext, SeatingError,
    SeatingEvent,
};

use super::ConcertId;

/// Who is requesting a seat transition.
#[derive(Debug, Clone)]
pub enum TransitionActor {
    /// A buyer's session. Must own the lock when transitioning away from
    /// [SeatStatus::Locked], and becomes the owner when locking.
    Session(crate::SessionId),
    /// The expiry sweeper. May only release locks whose deadline passed.
    Sweeper,
}

/// The authoritative seat state of a single concert.
///
/// All mutation goes through [ConcertSeating::apply_transition], which only
/// succeeds when the seat is in the expected prior state. That guarded
/// compare-and-swap is the sole concurrency primitive of the engine;
/// conflicting writers on the same seat serialize on the map entry, while
/// distinct seats proceed independently.
pub struct ConcertSeating {
    concert_id: ConcertId,
    config: Config,
    event_sender: EventSender,
    seats: DashMap<SeatId, Seat>,
}

impl ConcertSeating {
    pub fn new(context: &SeatingContext, concert_id: ConcertId, seats: Vec<NewSeat>) -> Self {
        let seats: DashMap<_, _> = seats
            .into_iter()
            .map(|definition| (definition.id.clone(), Seat::new(definition)))
            .collect();

        Self {
            concert_id,
            config: context.config.clone(),
            event_sender: context.event_sender.clone(),
            seats,
        }
    }

    pub fn concert_id(&self) -> ConcertId {
        self.concert_id
    }

    /// Returns a snapshot of one seat.
    pub fn seat(&self, seat_id: &SeatId) -> Result<Seat, SeatingError> {
        self.seats
            .get(seat_id)
            .map(|s| s.clone())
            .ok_or_else(|| SeatingError::UnknownSeat {
                seat_id: seat_id.clone(),
            })
    }

    /// Returns a snapshot of every seat, ordered by id for stable output.
    pub fn seats(&self) -> Vec<Seat> {
        let mut seats: Vec<_> = self.seats.iter().map(|s| s.clone()).collect();
        seats.sort_by(|a, b| a.id.cmp(&b.id));
        seats
    }

    /// Seat ids whose lock deadline has passed. Candidates only, the actual
    /// release still goes through [ConcertSeating::apply_transition].
    pub fn expired_seat_ids(&self, now: DateTime<Utc>) -> Vec<SeatId> {
        self.seats
            .iter()
            .filter(|seat| {
                seat.status == SeatStatus::Locked
                    && seat.lock_expires_at.is_some_and(|deadline| deadline <= now)
            })
            .map(|seat| seat.id.clone())
            .collect()
    }

    /// Moves a seat from one status to another, failing with
    /// [SeatingError::Conflict] if the seat is not currently in `from`.
    /// Never silently overwrites.
    ///
    /// The transition event is emitted while the seat's entry guard is still
    /// held, so per-seat event order always matches transition order.
    pub fn apply_transition(
        &self,
        seat_id: &SeatId,
        from: SeatStatus,
        to: SeatStatus,
        actor: TransitionActor,
        now: DateTime<Utc>,
    ) -> Result<Seat, SeatingError> {
        let mut entry = self
            .seats
            .get_mut(seat_id)
            .ok_or_else(|| SeatingError::UnknownSeat {
                seat_id: seat_id.clone(),
            })?;

        let seat = entry.value_mut();

        if seat.status == SeatStatus::Locked
            && (seat.locked_by.is_none() || seat.lock_expires_at.is_none())
        {
            return Err(SeatingError::Integrity(format!(
                "seat {seat_id} is locked without an owner or deadline"
            )));
        }

        if !is_supported_transition(from, to) {
            return Err(SeatingError::Integrity(format!(
                "unsupported transition {from:?} -> {to:?} on seat {seat_id}"
            )));
        }

        if seat.status != from {
            return Err(SeatingError::Conflict {
                seat_id: seat_id.clone(),
                current: seat.status,
            });
        }

        // Transitions away from a lock require ownership, or an elapsed
        // deadline when the sweeper is asking.
        if from == SeatStatus::Locked {
            let allowed = match &actor {
                TransitionActor::Session(session_id) => {
                    seat.locked_by.as_ref() == Some(session_id)
                }
                TransitionActor::Sweeper => seat
                    .lock_expires_at
                    .is_some_and(|deadline| deadline <= now),
            };

            if !allowed {
                return Err(SeatingError::Conflict {
                    seat_id: seat_id.clone(),
                    current: seat.status,
                });
            }
        }

        match to {
            SeatStatus::Locked => {
                let TransitionActor::Session(session_id) = actor else {
                    return Err(SeatingError::Integrity(format!(
                        "only a session can take a lock on seat {seat_id}"
                    )));
                };

                seat.status = SeatStatus::Locked;
                seat.locked_by = Some(session_id);
                seat.lock_expires_at = Some(now + self.config.lock_ttl());
            }
            status => {
                // Status and lock fields change under the same guard, so a
                // handoff to Booked is observable as a single transition.
                seat.status = status;
                seat.locked_by = None;
                seat.lock_expires_at = None;
            }
        }

        let snapshot = seat.clone();

        self.event_sender
            .send(SeatingEvent::SeatStatusUpdate {
                concert_id: self.concert_id,
                seat_id: snapshot.id.clone(),
                new_status: snapshot.status,
                locked_by: snapshot.locked_by.clone(),
            })
            .expect("event is sent");

        Ok(snapshot)
    }
}

/// The edges a seat may move along. Everything else is a programming error,
/// notably there is no way from Available straight to Booked.
fn is_supported_transition(from: SeatStatus, to: SeatStatus) -> bool {
    matches!(
        (from, to),
        (SeatStatus::Available, SeatStatus::Locked)
            | (SeatStatus::Locked, SeatStatus::Available)
            | (SeatStatus::Locked, SeatStatus::Locked)
            | (SeatStatus::Locked, SeatStatus::Booked)
            | (SeatStatus::Booked, SeatStatus::Available)
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Seating, SeatTier};

    fn seating_with_seats(seat_ids: &[&str]) -> Seating {
        let seating = Seating::new(Config::default());

        let seats = seat_ids
            .iter()
            .enumerate()
            .map(|(column, id)| NewSeat {
                id: id.to_string(),
                row: 1,
                column: column as u32,
                tier: SeatTier::Standard,
            })
            .collect();

        seating
            .register_concert(1, seats)
            .expect("concert registers");

        seating
    }

    #[test]
    fn test_lock_is_exclusive() {
        let seating = seating_with_seats(&["A-1"]);
        let concert = seating.context().concert(1).unwrap();
        let now = Utc::now();

        concert
            .apply_transition(
                &"A-1".to_string(),
                SeatStatus::Available,
                SeatStatus::Locked,
                TransitionActor::Session("alice".to_string()),
                now,
            )
            .expect("first lock succeeds");

        let second = concert.apply_transition(
            &"A-1".to_string(),
            SeatStatus::Available,
            SeatStatus::Locked,
            TransitionActor::Session("bob".to_string()),
            now,
        );

        assert!(
            matches!(
                second,
                Err(SeatingError::Conflict {
                    current: SeatStatus::Locked,
                    ..
                })
            ),
            "second lock should conflict"
        );
    }

    #[test]
    fn test_concurrent_acquire_has_one_winner() {
        let seating = seating_with_seats(&["A-1"]);
        let concert = seating.context().concert(1).unwrap();
        let now = Utc::now();

        let outcomes: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = ["alice", "bob"]
                .into_iter()
                .map(|session| {
                    let concert = concert.clone();
                    scope.spawn(move || {
                        concert.apply_transition(
                            &"A-1".to_string(),
                            SeatStatus::Available,
                            SeatStatus::Locked,
                            TransitionActor::Session(session.to_string()),
                            now,
                        )
                    })
                })
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners = outcomes.iter().filter(|o| o.is_ok()).count();

        assert_eq!(winners, 1, "exactly one session should win the seat");
        assert!(
            outcomes
                .iter()
                .any(|o| matches!(o, Err(SeatingError::Conflict { .. }))),
            "the loser should see a conflict"
        );
    }

    #[test]
    fn test_booked_requires_a_lock_first() {
        let seating = seating_with_seats(&["A-1"]);
        let concert = seating.context().concert(1).unwrap();

        let skipped = concert.apply_transition(
            &"A-1".to_string(),
            SeatStatus::Available,
            SeatStatus::Booked,
            TransitionActor::Session("alice".to_string()),
            Utc::now(),
        );

        assert!(
            matches!(skipped, Err(SeatingError::Integrity(_))),
            "available to booked should be rejected"
        );
    }

    #[test]
    fn test_release_clears_lock_fields() {
        let seating = seating_with_seats(&["A-1"]);
        let concert = seating.context().concert(1).unwrap();
        let session = TransitionActor::Session("alice".to_string());
        let now = Utc::now();

        concert
            .apply_transition(
                &"A-1".to_string(),
                SeatStatus::Available,
                SeatStatus::Locked,
                session.clone(),
                now,
            )
            .unwrap();

        let released = concert
            .apply_transition(
                &"A-1".to_string(),
                SeatStatus::Locked,
                SeatStatus::Available,
                session,
                now,
            )
            .unwrap();

        assert_eq!(released.status, SeatStatus::Available);
        assert!(released.locked_by.is_none(), "owner should be cleared");
        assert!(
            released.lock_expires_at.is_none(),
            "deadline should be cleared"
        );
    }

    #[test]
    fn test_events_follow_transition_order() {
        let seating = seating_with_seats(&["A-1"]);
        let concert = seating.context().concert(1).unwrap();
        let session = TransitionActor::Session("alice".to_string());
        let now = Utc::now();

        concert
            .apply_transition(
                &"A-1".to_string(),
                SeatStatus::Available,
                SeatStatus::Locked,
                session.clone(),
                now,
            )
            .unwrap();
        concert
            .apply_transition(
                &"A-1".to_string(),
                SeatStatus::Locked,
                SeatStatus::Available,
                session,
                now,
            )
            .unwrap();

        let statuses: Vec<_> = std::iter::from_fn(|| seating.poll_event())
            .map(|event| match event {
                SeatingEvent::SeatStatusUpdate { new_status, .. } => new_status,
            })
            .collect();

        assert_eq!(
            statuses,
            vec![SeatStatus::Locked, SeatStatus::Available],
            "a release must never be observed before its lock"
        );
    }
}
