use crate::{
    client::{parse_json_if_ok, TuyoClient},
    error::TuyoError,
    session::{decode_claims, TokenClaims},
    types::auth::{DataLogin, ResponseLogin},
    util::build_url,
};

#[async_trait::async_trait]
pub trait AuthApi {
    /// Log in with email and password. On success the token is stored in the
    /// client and its (unverified) claims are returned for display.
    async fn login(&self, correo: &str, contrasenia: &str) -> Result<TokenClaims, TuyoError>;

    /// Forget the session token.
    async fn logout(&self);
}

#[async_trait::async_trait]
impl AuthApi for TuyoClient {
    async fn login(&self, correo: &str, contrasenia: &str) -> Result<TokenClaims, TuyoError> {
        let url = build_url(&self.endpoints.cuentas, &["cuenta", "login"]);
        let body = DataLogin {
            correo: correo.to_string(),
            contrasenia: contrasenia.to_string(),
        };
        let resp = self.authed_post(&url, &body).await?;
        let login_resp: ResponseLogin = parse_json_if_ok(resp).await?;

        let claims = decode_claims(&login_resp.token)?;
        self.set_token(Some(login_resp.token)).await;
        tracing::info!(user_id = claims.user_id, "logged in");

        Ok(claims)
    }

    async fn logout(&self) {
        self.set_token(None).await;
    }
}
