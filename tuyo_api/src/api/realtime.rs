use crate::{
    client::{parse_json_if_ok, TuyoClient},
    error::TuyoError,
    polling::SnapshotSource,
    types::realtime::StationArrivals,
    util::build_url,
};

#[async_trait::async_trait]
pub trait RealtimeApi {
    /// Current simulated arrivals for every station.
    async fn arrivals(&self) -> Result<Vec<StationArrivals>, TuyoError>;
}

#[async_trait::async_trait]
impl RealtimeApi for TuyoClient {
    async fn arrivals(&self) -> Result<Vec<StationArrivals>, TuyoError> {
        let url = build_url(&self.endpoints.tiempo_real, &["info", "llegadas"]);
        let resp = self.authed_get(&url).await?;
        parse_json_if_ok(resp).await
    }
}

#[async_trait::async_trait]
impl SnapshotSource for TuyoClient {
    type Item = StationArrivals;

    async fn fetch(&self) -> Result<Vec<StationArrivals>, TuyoError> {
        self.arrivals().await
    }
}
