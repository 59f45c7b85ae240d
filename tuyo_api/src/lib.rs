//! # TUYO API
//!
//! Asynchronous client and front-end core for the TUYO transit companion.
//! It uses `tokio` for the async runtime and `reqwest` for HTTP requests
//! against the account, card and realtime gateways, and provides the pieces
//! a front end is built from: the OTP-guarded mutation wizard, the polling
//! arrivals view, password scoring and input validation.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod payment;
pub mod polling;
pub mod session;
pub mod strength;
pub mod types;
pub mod util;
pub mod validation;
pub mod wizard;

pub use client::*;
pub use config::{CheckoutConfig, ServiceEndpoints, TuyoConfig};
pub use error::TuyoError;
pub use polling::{PollingView, Render, Searchable, SnapshotSource};
pub use types::*;
pub use wizard::{Phase, Wizard, WizardConfig, WizardError, WizardShell};
