mod client;

pub use client::{json_if_success, parse_json_if_ok};
pub use client::TuyoClient;

pub use crate::{
    api::{auth::AuthApi, cards::CardsApi, otp::OtpApi, realtime::RealtimeApi},
    error::{handle_api_error, TuyoError},
};
