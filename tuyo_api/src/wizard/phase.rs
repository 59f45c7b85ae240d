use std::fmt;

/// Ordered phases of a guarded mutation. A wizard only ever moves forward,
/// except for the single step back from [`Phase::CollectOtp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    CollectTarget,
    CollectOtp,
    CollectPayload,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CollectTarget => "collect-target",
            Self::CollectOtp => "collect-otp",
            Self::CollectPayload => "collect-mutation-payload",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mutation-specific part of the user's input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    #[default]
    None,
    NewPassword { nueva: String, confirmar: String },
    CardNumber(String),
    DeleteConfirmation(bool),
}

/// Everything typed into a wizard so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    /// Email the code is sent to.
    pub target: String,
    pub otp: String,
    pub payload: Payload,
}

/// What a phase does when its primary button is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SendOtp,
    VerifyOtp,
    Mutate,
    /// Verify the code and run the mutation from the same phase.
    VerifyAndMutate,
}

impl Action {
    pub fn verifies(&self) -> bool {
        matches!(self, Self::VerifyOtp | Self::VerifyAndMutate)
    }

    pub fn mutates(&self) -> bool {
        matches!(self, Self::Mutate | Self::VerifyAndMutate)
    }
}

/// A guard returns the message to show when the phase's action must stay
/// disabled.
pub type Guard = fn(&Inputs) -> Result<(), String>;

/// One row of a wizard's phase table.
#[derive(Clone, Copy)]
pub struct Step {
    pub phase: Phase,
    pub guard: Guard,
    pub action: Action,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("phase", &self.phase)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}
