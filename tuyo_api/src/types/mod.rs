pub mod auth;
pub mod card;
pub mod error_types;
pub mod otp;
pub mod realtime;

// Re-export the main types commonly used
pub use auth::{DataLogin, ResponseLogin};
pub use card::{DataCreateCard, Tarjeta};
pub use error_types::ApiErrorBody;
pub use otp::{OtpPurpose, ResetPasswordRequest, SendOtpRequest, VerifyOtpRequest, VerifyOtpResponse};
pub use realtime::{Bus, StationArrivals};
