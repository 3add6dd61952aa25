use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use turnstile_core::SeatTier;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TierSchema {
    Standard,
    Premium,
    Vip,
}

impl From<TierSchema> for SeatTier {
    fn from(value: TierSchema) -> Self {
        match value {
            TierSchema::Standard => SeatTier::Standard,
            TierSchema::Premium => SeatTier::Premium,
            TierSchema::Vip => SeatTier::Vip,
        }
    }
}

#[derive(Debug, Validate, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSeatSchema {
    #[validate(length(min = 1, max = 32))]
    pub id: String,
    pub row: u32,
    pub column: u32,
    pub tier: TierSchema,
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterConcertSchema {
    pub concert_id: i32,
    #[validate(length(min = 1))]
    pub seats: Vec<NewSeatSchema>,
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelectSeatsSchema {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,
    #[validate(length(min = 1))]
    pub seat_ids: Vec<String>,
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfirmBookingSchema {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,
    #[validate(length(min = 1, max = 128))]
    pub payment_ref: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub session_id: String,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}
