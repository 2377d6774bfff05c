use std::env;

use bistro_common::{
    helpers::{parse_boolean_flag, parse_cents},
    Secret,
};
use bistro_engine::pricing::FeeSchedule;
use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_BISTRO_HOST: &str = "127.0.0.1";
const DEFAULT_BISTRO_PORT: u16 = 8360;
const DEFAULT_ACCESS_TOKEN_VALIDITY: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Delivery fee policy applied at checkout.
    pub fees: FeeSchedule,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address for
    /// the access log, rather than the connection's remote address.
    pub use_x_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BISTRO_HOST.to_string(),
            port: DEFAULT_BISTRO_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            fees: FeeSchedule::default(),
            use_x_forwarded_for: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BISTRO_HOST").ok().unwrap_or_else(|| DEFAULT_BISTRO_HOST.into());
        let port = env::var("BISTRO_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BISTRO_PORT. {e} Using the default, {DEFAULT_BISTRO_PORT}, \
                         instead."
                    );
                    DEFAULT_BISTRO_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BISTRO_PORT);
        let database_url = env::var("BISTRO_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ BISTRO_DATABASE_URL is not set. Please set it to the URL for the bistro database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ Could not load the authentication configuration from environment variables. {e}");
            AuthConfig::default()
        });
        let fees = fee_schedule_from_env();
        let use_x_forwarded_for = parse_boolean_flag(env::var("BISTRO_USE_X_FORWARDED_FOR").ok(), false);
        Self { host, port, database_url, auth, fees, use_x_forwarded_for }
    }
}

fn fee_schedule_from_env() -> FeeSchedule {
    let defaults = FeeSchedule::default();
    let free_delivery_threshold =
        parse_cents(env::var("BISTRO_FREE_DELIVERY_THRESHOLD_CENTS").ok(), defaults.free_delivery_threshold);
    let delivery_fee = parse_cents(env::var("BISTRO_DELIVERY_FEE_CENTS").ok(), defaults.delivery_fee);
    if env::var("BISTRO_FREE_DELIVERY_THRESHOLD_CENTS").is_err() {
        info!(
            "🪛️ BISTRO_FREE_DELIVERY_THRESHOLD_CENTS is not set. Using the default of {}.",
            defaults.free_delivery_threshold
        );
    }
    if env::var("BISTRO_DELIVERY_FEE_CENTS").is_err() {
        info!("🪛️ BISTRO_DELIVERY_FEE_CENTS is not set. Using the default of {}.", defaults.delivery_fee);
    }
    FeeSchedule { free_delivery_threshold, delivery_fee }
}

//-------------------------------------------------  AuthConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Secret key used to sign and verify access tokens.
    pub hmac_key: Secret<String>,
    /// How long an issued access token stays valid.
    pub token_validity: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The access token signing key has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this: every restart invalidates all sessions. Set BISTRO_HMAC_KEY instead. \
             🚨️🚨️🚨️"
        );
        let key: String = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect();
        Self { hmac_key: Secret::new(key), token_validity: DEFAULT_ACCESS_TOKEN_VALIDITY }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, String> {
        let key = env::var("BISTRO_HMAC_KEY").map_err(|e| format!("{e} [BISTRO_HMAC_KEY]"))?;
        if key.len() < 32 {
            return Err("BISTRO_HMAC_KEY must be at least 32 characters long".to_string());
        }
        let token_validity = env::var("BISTRO_TOKEN_VALIDITY_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Duration::hours)
            .unwrap_or(DEFAULT_ACCESS_TOKEN_VALIDITY);
        Ok(Self { hmac_key: Secret::new(key), token_validity })
    }
}
