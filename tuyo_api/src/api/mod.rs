pub mod auth;
pub mod cards;
pub mod otp;
pub mod realtime;
