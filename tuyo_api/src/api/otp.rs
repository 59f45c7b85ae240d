use crate::{
    client::{json_if_success, TuyoClient},
    error::TuyoError,
    types::{
        error_types::ApiErrorBody,
        otp::{
            OtpPurpose, ResetPasswordRequest, ResetPasswordResponse, SendOtpRequest,
            SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse,
        },
    },
    util::build_url,
};

/// Message used when the verify endpoint rejects a code without saying why.
pub const DEFAULT_OTP_INVALID: &str = "OTP inválido o expirado";

/// One-time-passcode endpoints of the account service, plus the password
/// reset they guard.
#[async_trait::async_trait]
pub trait OtpApi {
    /// Ask the account service to email a code to `correo`.
    ///
    /// Any non-2xx status becomes [`TuyoError::OtpSend`]; the server's reason
    /// is dropped.
    async fn send_otp(&self, correo: &str, tipo: OtpPurpose) -> Result<SendOtpResponse, TuyoError>;

    /// Check a code. Rejections become [`TuyoError::OtpInvalid`] with the
    /// server message, or [`DEFAULT_OTP_INVALID`].
    async fn verify_otp(&self, correo: &str, otp: &str) -> Result<VerifyOtpResponse, TuyoError>;

    /// Set a new password. Only meaningful after `verify_otp` succeeded for
    /// the same address.
    async fn reset_password(
        &self,
        correo: &str,
        nueva_contrasenia: &str,
    ) -> Result<ResetPasswordResponse, TuyoError>;
}

#[async_trait::async_trait]
impl OtpApi for TuyoClient {
    async fn send_otp(&self, correo: &str, tipo: OtpPurpose) -> Result<SendOtpResponse, TuyoError> {
        let url = build_url(&self.endpoints.cuentas, &["cuenta", "send-otp"]);
        let body = SendOtpRequest {
            correo: correo.to_string(),
            tipo,
        };
        let resp = self.authed_post(&url, &body).await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), ?tipo, "send-otp rejected");
            return Err(TuyoError::OtpSend {
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(TuyoError::ReqwestError)?;
        if bytes.is_empty() {
            return Ok(SendOtpResponse::Null);
        }
        serde_json::from_slice(&bytes).map_err(TuyoError::SerdeError)
    }

    async fn verify_otp(&self, correo: &str, otp: &str) -> Result<VerifyOtpResponse, TuyoError> {
        let url = build_url(&self.endpoints.cuentas, &["cuenta", "verify-otp"]);
        let body = VerifyOtpRequest {
            correo: correo.to_string(),
            otp: otp.to_string(),
        };
        let resp = self.authed_post(&url, &body).await?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(TuyoError::ReqwestError)?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .ok()
                .and_then(ApiErrorBody::into_message)
                .unwrap_or_else(|| DEFAULT_OTP_INVALID.to_string());
            return Err(TuyoError::OtpInvalid(message));
        }

        let parsed: VerifyOtpResponse = serde_json::from_slice(&bytes).unwrap_or_default();
        if parsed.exito == Some(false) {
            return Err(TuyoError::OtpInvalid(DEFAULT_OTP_INVALID.to_string()));
        }
        Ok(parsed)
    }

    async fn reset_password(
        &self,
        correo: &str,
        nueva_contrasenia: &str,
    ) -> Result<ResetPasswordResponse, TuyoError> {
        let url = build_url(&self.endpoints.cuentas, &["cuenta", "reset-password"]);
        let body = ResetPasswordRequest {
            correo: correo.to_string(),
            nueva_contrasenia: nueva_contrasenia.to_string(),
        };
        let resp = self.authed_post(&url, &body).await?;
        let value = json_if_success(resp).await?;
        let parsed: ResetPasswordResponse = serde_json::from_value(value).unwrap_or_default();
        if parsed.exito == Some(false) {
            return Err(TuyoError::Api {
                status: 200,
                message: parsed
                    .message
                    .unwrap_or_else(|| "No se pudo restablecer la contraseña".to_string()),
            });
        }
        Ok(parsed)
    }
}
