//! Service endpoints and timings.

use std::{env, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::error::TuyoError;

/// Base URLs of the external gateways.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEndpoints {
    /// Account service (login, OTP, password reset).
    pub cuentas: String,
    /// Card service (listing, registration, deletion).
    pub tarjetas: String,
    /// Realtime simulator (arrivals snapshot).
    pub tiempo_real: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            cuentas: "http://localhost:8081".to_string(),
            tarjetas: "http://localhost:8082".to_string(),
            tiempo_real: "http://localhost:8083".to_string(),
        }
    }
}

/// Checkout credentials for card recharges.
#[derive(Clone, Deserialize)]
pub struct CheckoutConfig {
    pub public_key: String,
    pub integrity_secret: String,
    #[serde(default = "default_checkout_url")]
    pub checkout_url: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl std::fmt::Debug for CheckoutConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutConfig")
            .field("public_key", &self.public_key)
            .field("integrity_secret", &"<redacted>")
            .field("checkout_url", &self.checkout_url)
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

fn default_checkout_url() -> String {
    "https://checkout.wompi.co/p/".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TuyoConfig {
    pub endpoints: ServiceEndpoints,

    /// Refresh period of the arrivals view.
    #[serde(with = "secs")]
    pub poll_interval: Duration,

    /// How long the wizard's success step stays on screen.
    #[serde(with = "millis")]
    pub done_delay: Duration,

    #[serde(with = "secs")]
    pub request_timeout: Duration,

    pub checkout: Option<CheckoutConfig>,
}

impl Default for TuyoConfig {
    fn default() -> Self {
        Self {
            endpoints: ServiceEndpoints::default(),
            poll_interval: Duration::from_secs(10),
            done_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(15),
            checkout: None,
        }
    }
}

impl TuyoConfig {
    /// Build a config from `TUYO_*` environment variables, falling back to
    /// the defaults for anything unset.
    pub fn from_env() -> Result<Self, TuyoError> {
        let mut config = Self::default();

        if let Ok(v) = env::var("TUYO_CUENTAS_URL") {
            config.endpoints.cuentas = v;
        }
        if let Ok(v) = env::var("TUYO_TARJETAS_URL") {
            config.endpoints.tarjetas = v;
        }
        if let Ok(v) = env::var("TUYO_TIEMPO_REAL_URL") {
            config.endpoints.tiempo_real = v;
        }
        if let Ok(v) = env::var("TUYO_POLL_INTERVAL_SECS") {
            let secs = v
                .parse::<u64>()
                .map_err(|e| TuyoError::Config(format!("TUYO_POLL_INTERVAL_SECS: {e}")))?;
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Ok(v) = env::var("TUYO_DONE_DELAY_MS") {
            let ms = v
                .parse::<u64>()
                .map_err(|e| TuyoError::Config(format!("TUYO_DONE_DELAY_MS: {e}")))?;
            config.done_delay = Duration::from_millis(ms);
        }
        if let (Ok(public_key), Ok(integrity_secret)) = (
            env::var("TUYO_CHECKOUT_PUBLIC_KEY"),
            env::var("TUYO_CHECKOUT_INTEGRITY_SECRET"),
        ) {
            config.checkout = Some(CheckoutConfig {
                public_key,
                integrity_secret,
                checkout_url: env::var("TUYO_CHECKOUT_URL").unwrap_or_else(|_| default_checkout_url()),
                redirect_url: env::var("TUYO_CHECKOUT_REDIRECT_URL").ok(),
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Every base URL must parse and use http(s); the poll interval must be
    /// non-zero.
    pub fn validate(&self) -> Result<(), TuyoError> {
        for (name, raw) in [
            ("cuentas", &self.endpoints.cuentas),
            ("tarjetas", &self.endpoints.tarjetas),
            ("tiempo_real", &self.endpoints.tiempo_real),
        ] {
            let parsed = Url::parse(raw)
                .map_err(|e| TuyoError::Config(format!("invalid {name} URL `{raw}`: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(TuyoError::Config(format!(
                    "{name} URL must use http or https, got `{}`",
                    parsed.scheme()
                )));
            }
        }
        if self.poll_interval.is_zero() {
            return Err(TuyoError::Config("poll interval cannot be zero".into()));
        }
        Ok(())
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
