use serde::{Deserialize, Serialize};

/// One station and the buses currently heading to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationArrivals {
    #[serde(rename = "idestacion")]
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(default)]
    pub buses: Vec<Bus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    #[serde(rename = "idbus")]
    pub id: i64,
    #[serde(rename = "ruta")]
    pub route: String,
    #[serde(rename = "tiempo_estimado_min")]
    pub eta_minutes: u32,
}
