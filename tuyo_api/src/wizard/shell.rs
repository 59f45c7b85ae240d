//! Presentation side of a wizard: which control to draw, whether its submit
//! button is enabled, and the one-shot completion effect.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{api::otp::OtpApi, strength::evaluate_strength, validation::OTP_LEN};

use super::{
    machine::Wizard,
    phase::{Action, Payload, Phase},
    WizardError,
};

pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// The control the current phase needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    EmailInput { value: String },
    /// One box per digit; `filled` boxes hold a character.
    OtpBoxes { filled: usize, total: usize },
    NewPassword { strength: u8, matches: bool },
    CardNumber { value: String },
    /// Code boxes and the confirmation checkbox in one phase.
    DeleteConfirmation { filled: usize, total: usize, confirmed: bool },
    Success { message: &'static str },
}

/// Everything needed to draw one frame of the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellView {
    pub phase: Phase,
    pub control: Control,
    pub submit_enabled: bool,
    pub can_go_back: bool,
    pub busy: bool,
    pub error: Option<String>,
}

/// Binds a [`Wizard`] to the owning page.
///
/// When the wizard reaches [`Phase::Done`] the shell waits `done_delay`,
/// calls `on_success` and then `on_close`, each exactly once no matter how
/// many times the success frame is rendered. Closing the shell first
/// cancels the pending success callback.
pub struct WizardShell<C> {
    wizard: Wizard<C>,
    on_success: Callback,
    on_close: Callback,
    done_delay: Duration,
    completion_armed: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl<C> WizardShell<C>
where
    C: OtpApi + Send + Sync,
{
    pub fn new(
        wizard: Wizard<C>,
        done_delay: Duration,
        on_success: Callback,
        on_close: Callback,
    ) -> Self {
        Self {
            wizard,
            on_success,
            on_close,
            done_delay,
            completion_armed: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn wizard(&self) -> &Wizard<C> {
        &self.wizard
    }

    /// Describe the current frame. Rendering the success frame arms the
    /// completion effect the first time only.
    pub async fn render(&self) -> ShellView {
        let session = self.wizard.session().await;
        let config = self.wizard.config();
        let step = config.step(session.phase);
        let inputs = &session.inputs;

        let control = match (session.phase, step.map(|s| s.action), &inputs.payload) {
            (Phase::Done, _, _) => Control::Success {
                message: config.mutation.success_message(),
            },
            (Phase::CollectTarget, _, _) => Control::EmailInput {
                value: inputs.target.clone(),
            },
            (_, Some(Action::VerifyAndMutate), Payload::DeleteConfirmation(confirmed)) => {
                Control::DeleteConfirmation {
                    filled: inputs.otp.chars().count().min(OTP_LEN),
                    total: OTP_LEN,
                    confirmed: *confirmed,
                }
            }
            (Phase::CollectOtp, _, _) => Control::OtpBoxes {
                filled: inputs.otp.chars().count().min(OTP_LEN),
                total: OTP_LEN,
            },
            (_, _, Payload::NewPassword { nueva, confirmar }) => Control::NewPassword {
                strength: evaluate_strength(nueva),
                matches: !nueva.is_empty() && nueva == confirmar,
            },
            (_, _, Payload::CardNumber(value)) => Control::CardNumber {
                value: value.clone(),
            },
            (_, _, _) => Control::EmailInput {
                value: inputs.target.clone(),
            },
        };

        let guard_ok = step.is_some_and(|s| (s.guard)(inputs).is_ok());

        if session.phase == Phase::Done {
            self.arm_completion();
        }

        ShellView {
            phase: session.phase,
            control,
            submit_enabled: guard_ok && !session.is_submitting && !self.wizard.is_closed(),
            can_go_back: !session.is_submitting
                && config.previous_phase(session.phase).is_some(),
            busy: session.is_submitting,
            error: session.last_error,
        }
    }

    /// Press the primary button.
    pub async fn submit(&self) -> Result<Phase, WizardError> {
        let phase = self.wizard.submit().await?;
        if phase == Phase::Done {
            self.arm_completion();
        }
        Ok(phase)
    }

    pub async fn back(&self) -> Result<Phase, WizardError> {
        self.wizard.back().await
    }

    /// Close from the UI. Calls `on_close` unless it already ran.
    pub fn close(&self) {
        self.wizard.close();
        if !self.closed.swap(true, Ordering::SeqCst) {
            (self.on_close)();
        }
    }

    fn arm_completion(&self) {
        if self.completion_armed.swap(true, Ordering::SeqCst) {
            return;
        }

        let cancel = self.wizard.cancel_token();
        let closed = self.closed.clone();
        let on_success = self.on_success.clone();
        let on_close = self.on_close.clone();
        let delay = self.done_delay;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("wizard closed before completion delay elapsed");
                }
                _ = tokio::time::sleep(delay) => {
                    on_success();
                    if !closed.swap(true, Ordering::SeqCst) {
                        on_close();
                    }
                    cancel.cancel();
                }
            }
        });
    }
}
