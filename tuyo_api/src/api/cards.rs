use crate::{
    client::{json_if_success, parse_json_if_ok, TuyoClient},
    error::TuyoError,
    types::card::{DataCreateCard, Tarjeta},
    util::build_url,
};

/// Card service endpoints.
#[async_trait::async_trait]
pub trait CardsApi {
    /// Cards (with balance) attached to an account.
    async fn list_cards(&self, cuenta_id: i64) -> Result<Vec<Tarjeta>, TuyoError>;

    /// Attach a card to an account. Any 2xx is success; the card comes back
    /// only when the service echoes it.
    async fn create_card(
        &self,
        cuenta_id: i64,
        numero: &str,
    ) -> Result<Option<Tarjeta>, TuyoError>;

    /// Detach and delete a card. Same success rule as `create_card`.
    async fn delete_card(&self, tarjeta_id: i64) -> Result<Option<Tarjeta>, TuyoError>;
}

#[async_trait::async_trait]
impl CardsApi for TuyoClient {
    async fn list_cards(&self, cuenta_id: i64) -> Result<Vec<Tarjeta>, TuyoError> {
        let id = cuenta_id.to_string();
        let url = build_url(&self.endpoints.tarjetas, &["tarjetas", "cuenta", &id]);
        let resp = self.authed_get(&url).await?;
        parse_json_if_ok(resp).await
    }

    async fn create_card(
        &self,
        cuenta_id: i64,
        numero: &str,
    ) -> Result<Option<Tarjeta>, TuyoError> {
        let id = cuenta_id.to_string();
        let url = build_url(&self.endpoints.tarjetas, &["tarjetas", "crearTarjeta", &id]);
        let body = DataCreateCard {
            numero: numero.to_string(),
        };
        let resp = self.authed_post(&url, &body).await?;
        let value = json_if_success(resp).await?;
        Ok(serde_json::from_value(value).ok())
    }

    async fn delete_card(&self, tarjeta_id: i64) -> Result<Option<Tarjeta>, TuyoError> {
        let id = tarjeta_id.to_string();
        let url = build_url(&self.endpoints.tarjetas, &["tarjetas", "eliminar", &id]);
        let resp = self.authed_delete(&url).await?;
        let value = json_if_success(resp).await?;
        Ok(serde_json::from_value(value).ok())
    }
}
