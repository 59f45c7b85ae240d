use serde::{Deserialize, Serialize};

/// A transit card as the card service reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tarjeta {
    #[serde(rename = "idtarjeta")]
    pub id: i64,
    pub numero: String,
    #[serde(default)]
    pub saldo: f64,
    #[serde(default)]
    pub estado: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataCreateCard {
    pub numero: String,
}
