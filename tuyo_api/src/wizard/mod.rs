//! Guarded multi-step mutation wizard.
//!
//! A wizard gates a sensitive change (password reset, card registration,
//! card deletion) behind an emailed one-time code. The flows differ only in
//! their phase table and in the mutation they finally run, so they share one
//! engine: [`WizardConfig`] describes a flow, [`Wizard`] drives it and
//! [`WizardShell`] turns it into something a front end can draw.

pub mod flows;
pub mod machine;
pub mod phase;
pub mod shell;

use thiserror::Error;

pub use flows::{Mutation, WizardConfig};
pub use machine::{Session, Wizard};
pub use phase::{Action, Guard, Inputs, Payload, Phase, Step};
pub use shell::{Callback, Control, ShellView, WizardShell};

/// Why a wizard action did not advance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    /// A guard failed. Nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The network call failed; the message is ready to show.
    #[error("{0}")]
    Transport(String),

    /// Another action of this wizard is still in flight.
    #[error("an action is already in progress")]
    Busy,

    #[error("this step has no previous step")]
    CannotGoBack,

    /// The wizard was closed; late results are dropped.
    #[error("wizard closed")]
    Closed,

    #[error("wizard already finished")]
    Finished,
}
