use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a code is being requested. The account service uses it to pick the
/// email template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Recuperacion,
    RegistroTarjeta,
    EliminacionTarjeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpRequest {
    pub correo: String,
    pub tipo: OtpPurpose,
}

/// The send endpoint's body is opaque to us; we keep it around for callers
/// who want to inspect it.
pub type SendOtpResponse = Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub correo: String,
    pub otp: String,
}

/// Only an explicit `"exito": false` counts as a rejection; any other 2xx body
/// is a pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    #[serde(default)]
    pub exito: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub correo: String,
    pub nueva_contrasenia: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetPasswordResponse {
    #[serde(default)]
    pub exito: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn purpose_and_reset_body_wire_names() {
        let send = SendOtpRequest {
            correo: "usuario@uao.edu.co".into(),
            tipo: OtpPurpose::EliminacionTarjeta,
        };
        assert_eq!(
            serde_json::to_value(&send).unwrap(),
            json!({ "correo": "usuario@uao.edu.co", "tipo": "eliminacion_tarjeta" })
        );

        let reset = ResetPasswordRequest {
            correo: "usuario@uao.edu.co".into(),
            nueva_contrasenia: "NuevaSegura123*".into(),
        };
        assert_eq!(
            serde_json::to_value(&reset).unwrap(),
            json!({ "correo": "usuario@uao.edu.co", "nuevaContrasenia": "NuevaSegura123*" })
        );
    }
}
