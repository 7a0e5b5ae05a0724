use crate::game::constants::DEFAULT_TICK_RATE;
use anyhow::{bail, Context};
use std::env;
use std::time::Duration;

const MAX_TICK_RATE: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tick_rate: u32,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid PORT {value:?}"))?,
            None => 8765,
        };
        let tick_rate = match lookup("TICK_RATE") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .with_context(|| format!("invalid TICK_RATE {value:?}"))?,
            None => DEFAULT_TICK_RATE,
        };
        Self { host, port, tick_rate }.validate()
    }

    fn validate(self) -> anyhow::Result<Self> {
        if self.tick_rate == 0 || self.tick_rate > MAX_TICK_RATE {
            bail!("TICK_RATE must be between 1 and {MAX_TICK_RATE}, got {}", self.tick_rate);
        }
        Ok(self)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.tick_rate))
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
