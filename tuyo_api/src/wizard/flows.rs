//! The three concrete flows, expressed as phase tables.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    api::{cards::CardsApi, otp::OtpApi, otp::DEFAULT_OTP_INVALID},
    error::TuyoError,
    strength::check_new_password,
    types::otp::OtpPurpose,
    validation::{is_complete_otp, is_valid_card_number, is_valid_email},
};

use super::phase::{Action, Inputs, Payload, Phase, Step};

/// Shown for every send failure, whatever the server said.
pub const SEND_FAILED: &str = "No se pudo enviar el código. Intenta de nuevo.";
pub const CONNECTION_FAILED: &str = "Error de conexión. Verifica tu red e intenta de nuevo.";

/// The guarded change a flow performs once the code is verified.
#[async_trait]
pub trait Mutation: Send + Sync {
    async fn apply(&self, inputs: &Inputs) -> Result<(), TuyoError>;

    /// Message for a failed `apply`.
    fn describe_error(&self, err: &TuyoError) -> String;

    /// Message for the success step.
    fn success_message(&self) -> &'static str;
}

/// A flow: which code template to request, the phase table, and the final
/// mutation.
#[derive(Clone)]
pub struct WizardConfig {
    pub purpose: OtpPurpose,
    pub steps: Vec<Step>,
    pub mutation: Arc<dyn Mutation>,
}

impl std::fmt::Debug for WizardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardConfig")
            .field("purpose", &self.purpose)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl WizardConfig {
    /// Email → code → new password.
    pub fn password_recovery<C>(client: C) -> Self
    where
        C: OtpApi + Send + Sync + 'static,
    {
        Self {
            purpose: OtpPurpose::Recuperacion,
            steps: vec![
                Step { phase: Phase::CollectTarget, guard: target_guard, action: Action::SendOtp },
                Step { phase: Phase::CollectOtp, guard: otp_guard, action: Action::VerifyOtp },
                Step { phase: Phase::CollectPayload, guard: new_password_guard, action: Action::Mutate },
            ],
            mutation: Arc::new(PasswordReset { client }),
        }
    }

    /// Email → code → card number, attached to `cuenta_id`.
    pub fn card_registration<C>(client: C, cuenta_id: i64) -> Self
    where
        C: CardsApi + Send + Sync + 'static,
    {
        Self {
            purpose: OtpPurpose::RegistroTarjeta,
            steps: vec![
                Step { phase: Phase::CollectTarget, guard: target_guard, action: Action::SendOtp },
                Step { phase: Phase::CollectOtp, guard: otp_guard, action: Action::VerifyOtp },
                Step { phase: Phase::CollectPayload, guard: card_number_guard, action: Action::Mutate },
            ],
            mutation: Arc::new(CardRegistration { client, cuenta_id }),
        }
    }

    /// Email → code plus confirmation box. Verification and deletion share
    /// the second phase.
    pub fn card_deletion<C>(client: C, tarjeta_id: i64) -> Self
    where
        C: CardsApi + Send + Sync + 'static,
    {
        Self {
            purpose: OtpPurpose::EliminacionTarjeta,
            steps: vec![
                Step { phase: Phase::CollectTarget, guard: target_guard, action: Action::SendOtp },
                Step { phase: Phase::CollectOtp, guard: delete_guard, action: Action::VerifyAndMutate },
            ],
            mutation: Arc::new(CardDeletion { client, tarjeta_id }),
        }
    }

    pub fn first_phase(&self) -> Phase {
        self.steps.first().map(|s| s.phase).unwrap_or(Phase::Done)
    }

    pub fn step(&self, phase: Phase) -> Option<&Step> {
        self.steps.iter().find(|s| s.phase == phase)
    }

    /// Phase after `phase`, or [`Phase::Done`] after the last step.
    pub fn next_phase(&self, phase: Phase) -> Phase {
        let idx = self.steps.iter().position(|s| s.phase == phase);
        idx.and_then(|i| self.steps.get(i + 1))
            .map(|s| s.phase)
            .unwrap_or(Phase::Done)
    }

    /// Phase before `phase`. Only the code phase can go back.
    pub fn previous_phase(&self, phase: Phase) -> Option<Phase> {
        if phase != Phase::CollectOtp {
            return None;
        }
        let idx = self.steps.iter().position(|s| s.phase == phase)?;
        idx.checked_sub(1).map(|i| self.steps[i].phase)
    }

    /// Initial payload for the flow's mutation phase.
    pub fn empty_payload(&self) -> Payload {
        match self.purpose {
            OtpPurpose::Recuperacion => Payload::NewPassword {
                nueva: String::new(),
                confirmar: String::new(),
            },
            OtpPurpose::RegistroTarjeta => Payload::CardNumber(String::new()),
            OtpPurpose::EliminacionTarjeta => Payload::DeleteConfirmation(false),
        }
    }
}

/* ───────────────────────────── Guards ───────────────────────────── */

fn target_guard(inputs: &Inputs) -> Result<(), String> {
    if inputs.target.trim().is_empty() {
        return Err("Ingresa tu correo electrónico".to_string());
    }
    if !is_valid_email(inputs.target.trim()) {
        return Err("El correo electrónico no es válido".to_string());
    }
    Ok(())
}

fn otp_guard(inputs: &Inputs) -> Result<(), String> {
    if is_complete_otp(&inputs.otp) {
        Ok(())
    } else {
        Err("Ingresa el código de 6 dígitos".to_string())
    }
}

fn new_password_guard(inputs: &Inputs) -> Result<(), String> {
    match &inputs.payload {
        Payload::NewPassword { nueva, confirmar } => check_new_password(nueva, confirmar),
        _ => Err("Ingresa la nueva contraseña".to_string()),
    }
}

fn card_number_guard(inputs: &Inputs) -> Result<(), String> {
    match &inputs.payload {
        Payload::CardNumber(n) if is_valid_card_number(n) => Ok(()),
        _ => Err("El número de tarjeta debe tener 16 dígitos".to_string()),
    }
}

fn delete_guard(inputs: &Inputs) -> Result<(), String> {
    otp_guard(inputs)?;
    match inputs.payload {
        Payload::DeleteConfirmation(true) => Ok(()),
        _ => Err("Confirma que deseas eliminar la tarjeta".to_string()),
    }
}

/* ─────────────────────────── Error messages ─────────────────────────── */

/// Message for a failed verify call.
pub fn describe_verify_error(err: &TuyoError) -> String {
    match err {
        TuyoError::OtpInvalid(msg) => msg.clone(),
        TuyoError::ReqwestError(_) => CONNECTION_FAILED.to_string(),
        other => other
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_OTP_INVALID.to_string()),
    }
}

/// Card-service errors are matched on known substrings of the server text.
fn describe_card_error(err: &TuyoError, not_found: &str, fallback: &str) -> String {
    if let TuyoError::ReqwestError(_) = err {
        return CONNECTION_FAILED.to_string();
    }
    let Some(message) = err.server_message() else {
        return fallback.to_string();
    };
    let lower = message.to_lowercase();
    if lower.contains("no existe") {
        not_found.to_string()
    } else if lower.contains("ya está asignada") || lower.contains("ya esta asignada") {
        "Esta tarjeta ya está asignada a otra cuenta".to_string()
    } else {
        fallback.to_string()
    }
}

/* ───────────────────────────── Mutations ───────────────────────────── */

struct PasswordReset<C> {
    client: C,
}

#[async_trait]
impl<C: OtpApi + Send + Sync> Mutation for PasswordReset<C> {
    async fn apply(&self, inputs: &Inputs) -> Result<(), TuyoError> {
        let Payload::NewPassword { nueva, .. } = &inputs.payload else {
            return Err(TuyoError::Other("missing new password".into()));
        };
        self.client.reset_password(inputs.target.trim(), nueva).await?;
        Ok(())
    }

    fn describe_error(&self, err: &TuyoError) -> String {
        match err {
            TuyoError::ReqwestError(_) => CONNECTION_FAILED.to_string(),
            other => other
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| "No se pudo restablecer la contraseña".to_string()),
        }
    }

    fn success_message(&self) -> &'static str {
        "Contraseña actualizada correctamente"
    }
}

struct CardRegistration<C> {
    client: C,
    cuenta_id: i64,
}

#[async_trait]
impl<C: CardsApi + Send + Sync> Mutation for CardRegistration<C> {
    async fn apply(&self, inputs: &Inputs) -> Result<(), TuyoError> {
        let Payload::CardNumber(numero) = &inputs.payload else {
            return Err(TuyoError::Other("missing card number".into()));
        };
        self.client.create_card(self.cuenta_id, numero).await?;
        Ok(())
    }

    fn describe_error(&self, err: &TuyoError) -> String {
        describe_card_error(
            err,
            "La tarjeta no existe en el sistema",
            "No se pudo registrar la tarjeta",
        )
    }

    fn success_message(&self) -> &'static str {
        "Tarjeta registrada correctamente"
    }
}

struct CardDeletion<C> {
    client: C,
    tarjeta_id: i64,
}

#[async_trait]
impl<C: CardsApi + Send + Sync> Mutation for CardDeletion<C> {
    async fn apply(&self, _inputs: &Inputs) -> Result<(), TuyoError> {
        self.client.delete_card(self.tarjeta_id).await?;
        Ok(())
    }

    fn describe_error(&self, err: &TuyoError) -> String {
        describe_card_error(
            err,
            "La tarjeta no existe o ya fue eliminada",
            "No se pudo eliminar la tarjeta",
        )
    }

    fn success_message(&self) -> &'static str {
        "Tarjeta eliminada correctamente"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(target: &str, otp: &str, payload: Payload) -> Inputs {
        Inputs {
            target: target.into(),
            otp: otp.into(),
            payload,
        }
    }

    #[test]
    fn target_guard_checks_email_shape() {
        assert!(target_guard(&inputs("", "", Payload::None)).is_err());
        assert!(target_guard(&inputs("usuario@uao", "", Payload::None)).is_err());
        assert!(target_guard(&inputs("usuario@uao.edu.co", "", Payload::None)).is_ok());
    }

    #[test]
    fn delete_guard_needs_code_and_checkbox() {
        let unchecked = inputs("a@b.co", "123456", Payload::DeleteConfirmation(false));
        assert_eq!(
            delete_guard(&unchecked).unwrap_err(),
            "Confirma que deseas eliminar la tarjeta"
        );
        let short = inputs("a@b.co", "12345", Payload::DeleteConfirmation(true));
        assert!(delete_guard(&short).is_err());
        let ready = inputs("a@b.co", "123456", Payload::DeleteConfirmation(true));
        assert!(delete_guard(&ready).is_ok());
    }

    #[test]
    fn card_errors_map_known_substrings() {
        let taken = TuyoError::Api {
            status: 409,
            message: "La tarjeta ya está asignada a la cuenta 3".into(),
        };
        assert_eq!(
            describe_card_error(&taken, "nf", "fb"),
            "Esta tarjeta ya está asignada a otra cuenta"
        );
        let missing = TuyoError::Api {
            status: 404,
            message: "La tarjeta NO EXISTE".into(),
        };
        assert_eq!(describe_card_error(&missing, "nf", "fb"), "nf");
        let opaque = TuyoError::HttpStatus {
            code: 500,
            body: "boom".into(),
        };
        assert_eq!(describe_card_error(&opaque, "nf", "fb"), "fb");
    }

    #[test]
    fn verify_errors_keep_server_text() {
        assert_eq!(
            describe_verify_error(&TuyoError::OtpInvalid("Código expirado".into())),
            "Código expirado"
        );
        assert_eq!(
            describe_verify_error(&TuyoError::HttpStatus { code: 500, body: String::new() }),
            DEFAULT_OTP_INVALID
        );
    }
}
