use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::dispatch::ConnectionConfig;
use crate::engine::Settings;
use crate::entities::Coordinates;
use crate::error::{invalid_input_error, Error};
use crate::location::LocationConfig;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_TOKEN_VAR: &str = "CABALLUS_DRIVER_TOKEN";

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub dispatch_base: String,
    pub listen_addr: SocketAddr,
    pub token_var: String,
    pub home: Option<Coordinates>,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = lookup("CABALLUS_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                tracing::error!("CABALLUS_API_BASE is not set");
                invalid_input_error()
            })?;

        let dispatch_base = lookup("CABALLUS_DISPATCH_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| websocket_base(&api_base));

        let listen_addr = lookup("CABALLUS_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into())
            .parse()
            .map_err(|err| {
                tracing::error!("invalid CABALLUS_LISTEN_ADDR: {}", err);
                invalid_input_error()
            })?;

        let token_var = lookup("CABALLUS_TOKEN_VAR").unwrap_or_else(|| DEFAULT_TOKEN_VAR.into());

        let poll_interval = parse::<u64>(&lookup, "CABALLUS_POLL_INTERVAL_SECS")?
            .unwrap_or(5)
            .clamp(5, 10);

        let max_attempts = parse::<u32>(&lookup, "CABALLUS_RECONNECT_MAX_ATTEMPTS")?.unwrap_or(10);
        let retry_interval = parse::<u64>(&lookup, "CABALLUS_RECONNECT_INTERVAL_SECS")?.unwrap_or(3);

        let home = match (
            parse::<f64>(&lookup, "CABALLUS_HOME_LAT")?,
            parse::<f64>(&lookup, "CABALLUS_HOME_LNG")?,
        ) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        };

        Ok(Self {
            api_base,
            dispatch_base,
            listen_addr,
            token_var,
            home,
            settings: Settings {
                connection: ConnectionConfig {
                    max_attempts,
                    retry_interval: Duration::from_secs(retry_interval),
                },
                location: LocationConfig::default(),
                poll_interval: Duration::from_secs(poll_interval),
            },
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse().map(Some).map_err(|err| {
            tracing::error!("invalid {}: {}", name, err);
            invalid_input_error()
        }),
        None => Ok(None),
    }
}

fn websocket_base(api_base: &str) -> String {
    if let Some(rest) = api_base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = api_base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        api_base.to_string()
    }
}
