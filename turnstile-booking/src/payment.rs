use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use turnstile_core::{ConcertId, SessionId};

pub type SharedGateway = Arc<dyn PaymentGateway>;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("declined: {reason}")]
    Declined { reason: String },
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// A charge to finalize. The coordinator treats the outcome as an opaque
/// accept or decline signal.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub concert_id: ConcertId,
    pub session_id: SessionId,
    /// Opaque reference supplied by the buyer's payment flow.
    pub payment_ref: String,
    /// Total amount in minor currency units.
    pub amount: u32,
}

/// Represents an external service that can finalize payment for a booking.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: ChargeRequest) -> Result<(), PaymentError>;
}

/// Accepts every charge. Stands in for a real provider integration, which
/// is outside the engine's scope.
pub struct AcceptAllGateway;

#[async_trait]
impl PaymentGateway for AcceptAllGateway {
    async fn charge(&self, _request: ChargeRequest) -> Result<(), PaymentError> {
        Ok(())
    }
}
