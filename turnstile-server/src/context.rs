use std::sync::Arc;

use axum::extract::FromRef;
use turnstile_booking::BoxOffice;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub box_office: Arc<BoxOffice>,
}
