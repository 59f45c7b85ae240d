use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLogin {
    pub correo: String,
    pub contrasenia: String,
}

/// Successful login. Anything beyond the token is ignored; identity is
/// read from the token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseLogin {
    pub token: String,
}
