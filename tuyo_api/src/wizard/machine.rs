use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::api::otp::OtpApi;

use super::{
    flows::{describe_verify_error, WizardConfig, SEND_FAILED},
    phase::{Action, Inputs, Payload, Phase},
    WizardError,
};

/// State of one in-flight wizard. Owned by exactly one [`Wizard`] and never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub phase: Phase,
    pub inputs: Inputs,
    pub is_submitting: bool,
    pub last_error: Option<String>,
    /// `(target, otp)` of the last successful verification.
    verified: Option<(String, String)>,
}

impl Session {
    /// Whether a verification succeeded for the current target.
    pub fn is_verified(&self) -> bool {
        self.verified
            .as_ref()
            .is_some_and(|(target, _)| target == self.inputs.target.trim())
    }

    fn verified_with_current_code(&self) -> bool {
        self.verified.as_ref().is_some_and(|(target, otp)| {
            target == self.inputs.target.trim() && *otp == self.inputs.otp
        })
    }
}

/// Drives a [`WizardConfig`] against the account service.
///
/// Cloning a `Wizard` yields another handle to the same session, so a UI can
/// hold one per control. Only one action runs at a time: a second `submit`
/// while the first is in flight returns [`WizardError::Busy`] without
/// touching the network.
#[derive(Clone)]
pub struct Wizard<C> {
    client: C,
    config: Arc<WizardConfig>,
    session: Arc<Mutex<Session>>,
    cancel: CancellationToken,
}

/// Result of running a phase action with the session unlocked.
struct Outcome {
    verified: bool,
    result: Result<(), String>,
}

impl<C> Wizard<C>
where
    C: OtpApi + Send + Sync,
{
    pub fn new(client: C, config: WizardConfig) -> Self {
        let session = Session {
            phase: config.first_phase(),
            inputs: Inputs {
                payload: config.empty_payload(),
                ..Inputs::default()
            },
            is_submitting: false,
            last_error: None,
            verified: None,
        };
        Self {
            client,
            config: Arc::new(config),
            session: Arc::new(Mutex::new(session)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    /// A copy of the current session.
    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.session.lock().await.phase
    }

    /* ───────────────────────────── Inputs ───────────────────────────── */

    /// Edit the input buffers. Clears the last error, like typing into a
    /// field does.
    pub async fn update_inputs(&self, f: impl FnOnce(&mut Inputs)) -> Result<(), WizardError> {
        if self.cancel.is_cancelled() {
            return Err(WizardError::Closed);
        }
        let mut session = self.session.lock().await;
        f(&mut session.inputs);
        session.last_error = None;
        Ok(())
    }

    pub async fn set_target(&self, correo: &str) -> Result<(), WizardError> {
        let correo = correo.to_string();
        self.update_inputs(|i| i.target = correo).await
    }

    pub async fn set_otp(&self, otp: &str) -> Result<(), WizardError> {
        let otp = otp.to_string();
        self.update_inputs(|i| i.otp = otp).await
    }

    pub async fn set_payload(&self, payload: Payload) -> Result<(), WizardError> {
        self.update_inputs(|i| i.payload = payload).await
    }

    /// Whether the current phase's primary action would be enabled.
    pub async fn can_submit(&self) -> bool {
        let session = self.session.lock().await;
        if session.is_submitting || self.cancel.is_cancelled() {
            return false;
        }
        match self.config.step(session.phase) {
            Some(step) => (step.guard)(&session.inputs).is_ok(),
            None => false,
        }
    }

    /* ──────────────────────────── Transitions ──────────────────────────── */

    /// Run the current phase's action. Advances one phase on success; on any
    /// failure the phase is unchanged and `last_error` holds the message.
    pub async fn submit(&self) -> Result<Phase, WizardError> {
        let (step, inputs, skip_verify) = {
            let mut session = self.session.lock().await;
            if self.cancel.is_cancelled() {
                return Err(WizardError::Closed);
            }
            if session.phase == Phase::Done {
                return Err(WizardError::Finished);
            }
            if session.is_submitting {
                return Err(WizardError::Busy);
            }
            let step = *self
                .config
                .step(session.phase)
                .ok_or(WizardError::Finished)?;

            if let Err(msg) = (step.guard)(&session.inputs) {
                session.last_error = Some(msg.clone());
                return Err(WizardError::Validation(msg));
            }
            if step.action == Action::Mutate && !session.is_verified() {
                let msg = "Verifica el código antes de continuar".to_string();
                session.last_error = Some(msg.clone());
                return Err(WizardError::Validation(msg));
            }

            session.is_submitting = true;
            session.last_error = None;
            let skip_verify = session.verified_with_current_code();
            (step, session.inputs.clone(), skip_verify)
        };

        let outcome = self.run(step.action, &inputs, skip_verify).await;

        let mut session = self.session.lock().await;
        session.is_submitting = false;
        if self.cancel.is_cancelled() {
            tracing::debug!(phase = %step.phase, "wizard closed; dropping result");
            return Err(WizardError::Closed);
        }
        if outcome.verified {
            session.verified = Some((inputs.target.trim().to_string(), inputs.otp.clone()));
        }
        match outcome.result {
            Ok(()) => {
                let next = self.config.next_phase(step.phase);
                tracing::info!(
                    purpose = ?self.config.purpose,
                    from = %step.phase,
                    to = %next,
                    "wizard advanced"
                );
                session.phase = next;
                Ok(next)
            }
            Err(msg) => {
                tracing::warn!(
                    purpose = ?self.config.purpose,
                    phase = %step.phase,
                    error = %msg,
                    "wizard action failed"
                );
                session.last_error = Some(msg.clone());
                Err(WizardError::Transport(msg))
            }
        }
    }

    async fn run(&self, action: Action, inputs: &Inputs, skip_verify: bool) -> Outcome {
        let correo = inputs.target.trim();
        let mut verified = false;

        if action == Action::SendOtp {
            let result = self
                .client
                .send_otp(correo, self.config.purpose)
                .await
                .map(|_| ())
                .map_err(|_| SEND_FAILED.to_string());
            return Outcome { verified, result };
        }

        if action.verifies() && !skip_verify {
            if let Err(e) = self.client.verify_otp(correo, &inputs.otp).await {
                return Outcome {
                    verified,
                    result: Err(describe_verify_error(&e)),
                };
            }
            verified = true;
        }

        let result = if action.mutates() {
            // A close during verification must not turn into a mutation.
            if self.cancel.is_cancelled() {
                Err("cancelled".to_string())
            } else {
                let mutation = &self.config.mutation;
                mutation
                    .apply(inputs)
                    .await
                    .map_err(|e| mutation.describe_error(&e))
            }
        } else {
            Ok(())
        };

        Outcome { verified, result }
    }

    /// Step back from the code phase to correct the email. The code already
    /// sent stays valid server-side; there is no cancel endpoint.
    pub async fn back(&self) -> Result<Phase, WizardError> {
        if self.cancel.is_cancelled() {
            return Err(WizardError::Closed);
        }
        let mut session = self.session.lock().await;
        if session.is_submitting {
            return Err(WizardError::Busy);
        }
        let prev = self
            .config
            .previous_phase(session.phase)
            .ok_or(WizardError::CannotGoBack)?;
        session.phase = prev;
        session.inputs.otp.clear();
        session.last_error = None;
        Ok(prev)
    }

    /// Close the wizard. Actions still in flight finish on the network but
    /// their results are discarded.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
