use chrono::{DateTime, Utc};

use crate::{ConcertId, Seat, SeatId, SeatStatus, SeatingContext, SeatingError, SessionId};

use super::TransitionActor;

/// Grants and revokes temporary holds on seats.
///
/// A hold is an ephemeral (seat, session, deadline) association, reflected
/// on the seat itself. Acquisition never blocks waiting for a seat to free
/// up, it either succeeds immediately or reports the conflict.
#[derive(Clone)]
pub struct LockManager {
    context: SeatingContext,
}

impl LockManager {
    pub fn new(context: &SeatingContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Takes a hold on a seat for a session. Fails with
    /// [SeatingError::Conflict] if the seat is not available.
    pub fn acquire(
        &self,
        concert_id: ConcertId,
        seat_id: &SeatId,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Seat, SeatingError> {
        self.context.concert(concert_id)?.apply_transition(
            seat_id,
            SeatStatus::Available,
            SeatStatus::Locked,
            TransitionActor::Session(session_id.clone()),
            now,
        )
    }

    /// Releases a session's hold on a seat. Releasing a seat that is already
    /// available is a no-op, so compensating releases can be retried safely.
    /// Releasing another session's hold fails with [SeatingError::Conflict].
    pub fn release(
        &self,
        concert_id: ConcertId,
        seat_id: &SeatId,
        session_id: &SessionId,
    ) -> Result<(), SeatingError> {
        let result = self.context.concert(concert_id)?.apply_transition(
            seat_id,
            SeatStatus::Locked,
            SeatStatus::Available,
            TransitionActor::Session(session_id.clone()),
            Utc::now(),
        );

        match result {
            Ok(_) => Ok(()),
            Err(SeatingError::Conflict {
                current: SeatStatus::Available,
                ..
            }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Pushes the deadline of a session's hold forward by a fresh TTL.
    /// Used by the coordinator while a checkout is actively progressing,
    /// holds are never renewed on their own.
    pub fn extend(
        &self,
        concert_id: ConcertId,
        seat_id: &SeatId,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Seat, SeatingError> {
        self.context.concert(concert_id)?.apply_transition(
            seat_id,
            SeatStatus::Locked,
            SeatStatus::Locked,
            TransitionActor::Session(session_id.clone()),
            now,
        )
    }

    /// Releases every hold whose deadline has passed, emitting one event per
    /// recycled seat. Runs on a periodic timer, and is safe against
    /// concurrent acquires and releases because each release goes through
    /// the same guarded transition. A seat that was released and re-locked
    /// between candidate collection and the transition simply reports a
    /// conflict, which the sweep ignores.
    pub fn expire_sweep(&self, now: DateTime<Utc>) -> Vec<(ConcertId, SeatId)> {
        let mut recycled = Vec::new();

        for concert in self.context.concerts.iter() {
            for seat_id in concert.expired_seat_ids(now) {
                let result = concert.apply_transition(
                    &seat_id,
                    SeatStatus::Locked,
                    SeatStatus::Available,
                    TransitionActor::Sweeper,
                    now,
                );

                if result.is_ok() {
                    recycled.push((concert.concert_id(), seat_id));
                }
            }
        }

        recycled
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Config, NewSeat, SeatTier, Seating, SeatingEvent};
    use chrono::Duration;

    fn seating() -> Seating {
        let seating = Seating::new(Config::default());

        let seats = ["A-1", "A-2"]
            .into_iter()
            .enumerate()
            .map(|(column, id)| NewSeat {
                id: id.to_string(),
                row: 1,
                column: column as u32,
                tier: SeatTier::Standard,
            })
            .collect();

        seating.register_concert(1, seats).unwrap();
        seating
    }

    #[test]
    fn test_release_is_idempotent() {
        let seating = seating();
        let locks = seating.locks();
        let session = "alice".to_string();
        let seat = "A-1".to_string();

        locks.acquire(1, &seat, &session, Utc::now()).unwrap();

        locks.release(1, &seat, &session).expect("first release");
        locks
            .release(1, &seat, &session)
            .expect("second release is a no-op");

        let snapshot = seating.context().concert(1).unwrap().seat(&seat).unwrap();
        assert_eq!(snapshot.status, SeatStatus::Available);
    }

    #[test]
    fn test_release_requires_ownership() {
        let seating = seating();
        let locks = seating.locks();
        let seat = "A-1".to_string();

        locks
            .acquire(1, &seat, &"alice".to_string(), Utc::now())
            .unwrap();

        let result = locks.release(1, &seat, &"bob".to_string());

        assert!(
            matches!(result, Err(SeatingError::Conflict { .. })),
            "a session should not release another session's hold"
        );
    }

    #[test]
    fn test_sweep_recycles_expired_holds() {
        let seating = seating();
        let locks = seating.locks();
        let seat = "A-1".to_string();
        let acquired_at = Utc::now();

        locks
            .acquire(1, &seat, &"alice".to_string(), acquired_at)
            .unwrap();

        // Drain the acquisition event so only sweep output remains
        while seating.poll_event().is_some() {}

        // One minute past the default two minute TTL
        let sweep_at = acquired_at + Duration::seconds(180);
        let recycled = locks.expire_sweep(sweep_at);

        assert_eq!(recycled, vec![(1, seat.clone())]);

        let snapshot = seating.context().concert(1).unwrap().seat(&seat).unwrap();
        assert_eq!(snapshot.status, SeatStatus::Available);
        assert!(snapshot.locked_by.is_none());

        let events: Vec<_> = std::iter::from_fn(|| seating.poll_event()).collect();
        assert_eq!(events.len(), 1, "the sweep should emit exactly one event");
        assert!(matches!(
            events[0],
            SeatingEvent::SeatStatusUpdate {
                new_status: SeatStatus::Available,
                ..
            }
        ));
    }

    #[test]
    fn test_sweep_leaves_live_holds_alone() {
        let seating = seating();
        let locks = seating.locks();
        let now = Utc::now();

        locks
            .acquire(1, &"A-1".to_string(), &"alice".to_string(), now)
            .unwrap();

        let recycled = locks.expire_sweep(now + Duration::seconds(30));

        assert!(recycled.is_empty(), "the hold is still within its TTL");
    }

    #[test]
    fn test_extend_refreshes_the_deadline() {
        let seating = seating();
        let locks = seating.locks();
        let session = "alice".to_string();
        let seat = "A-1".to_string();
        let acquired_at = Utc::now();

        locks.acquire(1, &seat, &session, acquired_at).unwrap();

        let later = acquired_at + Duration::seconds(90);
        let extended = locks.extend(1, &seat, &session, later).unwrap();

        assert_eq!(
            extended.lock_expires_at,
            Some(later + Config::default().lock_ttl())
        );

        // The old deadline has passed but the extension keeps the hold alive
        let recycled = locks.expire_sweep(acquired_at + Duration::seconds(150));
        assert!(recycled.is_empty());
    }
}
