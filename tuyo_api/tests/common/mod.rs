#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tuyo_api::{
    polling::SnapshotSource, Bus, ServiceEndpoints, StationArrivals, TuyoClient, TuyoError,
};
use wiremock::MockServer;

/// A client whose three gateways all point at `server`.
pub fn client_for(server: &MockServer) -> TuyoClient {
    let uri = server.uri();
    let endpoints = ServiceEndpoints {
        cuentas: uri.clone(),
        tarjetas: uri.clone(),
        tiempo_real: uri,
    };
    TuyoClient::new(endpoints, Duration::from_secs(5)).expect("client builds")
}

pub fn station(id: i64, name: &str) -> StationArrivals {
    StationArrivals {
        id,
        name: name.to_string(),
        buses: vec![Bus {
            id: id * 100,
            route: format!("E{id}"),
            eta_minutes: 3,
        }],
    }
}

/// Counts invocations of a callback.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn callback(&self) -> Arc<dyn Fn() + Send + Sync> {
        let inner = self.0.clone();
        Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }
}

type Scripted = (Duration, Result<Vec<StationArrivals>, String>);

/// Snapshot source that replays a script of delayed responses.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    calls: Arc<AtomicUsize>,
    script: Arc<Mutex<VecDeque<Scripted>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, delay: Duration, items: Vec<StationArrivals>) -> Self {
        self.script.lock().unwrap().push_back((delay, Ok(items)));
        self
    }

    pub fn fail(self, delay: Duration) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back((delay, Err("simulator unavailable".to_string())));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    type Item = StationArrivals;

    async fn fetch(&self) -> Result<Vec<StationArrivals>, TuyoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let (delay, result) =
            next.unwrap_or_else(|| (Duration::ZERO, Err("script exhausted".to_string())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result.map_err(TuyoError::Other)
    }
}
