use crate::game::constants::TICK_RATE_HZ;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub tick_rate_hz: f64,
    pub create_room_burst: u32,
    pub create_room_window: Duration,
    pub list_rooms_burst: u32,
    pub list_rooms_window: Duration,
    pub room_idle_timeout: Duration,
    pub maintenance_interval: Duration,
    pub trust_proxy: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            tick_rate_hz: TICK_RATE_HZ,
            create_room_burst: 5,
            create_room_window: Duration::from_secs(600),
            list_rooms_burst: 30,
            list_rooms_window: Duration::from_secs(60),
            room_idle_timeout: Duration::from_secs(600),
            maintenance_interval: Duration::from_secs(60),
            trust_proxy: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let config = Self {
            port: parse_var("PORT").unwrap_or(defaults.port),
            tick_rate_hz: parse_var("TICK_RATE_HZ").unwrap_or(defaults.tick_rate_hz),
            create_room_burst: parse_var("CREATE_ROOM_BURST")
                .unwrap_or(defaults.create_room_burst),
            create_room_window: parse_var("CREATE_ROOM_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.create_room_window),
            list_rooms_burst: parse_var("LIST_ROOMS_BURST").unwrap_or(defaults.list_rooms_burst),
            list_rooms_window: parse_var("LIST_ROOMS_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.list_rooms_window),
            room_idle_timeout: parse_var("ROOM_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.room_idle_timeout),
            maintenance_interval: parse_var("MAINTENANCE_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.maintenance_interval),
            trust_proxy: env::var("TRUST_PROXY")
                .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE"))
                .unwrap_or(defaults.trust_proxy),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.tick_rate_hz.is_finite() || self.tick_rate_hz <= 0.0 {
            anyhow::bail!("TICK_RATE_HZ must be a positive number");
        }
        if self.create_room_burst == 0 || self.create_room_window.is_zero() {
            anyhow::bail!("CREATE_ROOM_BURST and CREATE_ROOM_WINDOW_SECS must be positive");
        }
        if self.list_rooms_burst == 0 || self.list_rooms_window.is_zero() {
            anyhow::bail!("LIST_ROOMS_BURST and LIST_ROOMS_WINDOW_SECS must be positive");
        }
        if self.maintenance_interval.is_zero() {
            anyhow::bail!("MAINTENANCE_INTERVAL_SECS must be positive");
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
}
