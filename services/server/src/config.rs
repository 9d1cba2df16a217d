use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

// Server configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // API HTTP listener bind address.
    pub bind_addr: SocketAddr,
    // Metrics HTTP listener bind address.
    pub metrics_bind: SocketAddr,
    // Per-connection notice queue depth.
    pub notify_queue_capacity: usize,
    // Seconds without a heartbeat before a screen reads as offline.
    pub presence_stale_secs: u64,
}

const DEFAULT_NOTIFY_QUEUE_CAPACITY: usize = 64;
const DEFAULT_PRESENCE_STALE_SECS: u64 = 90;

#[derive(Debug, Deserialize)]
struct ServerConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    notify_queue_capacity: Option<usize>,
    presence_stale_secs: Option<u64>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        // Environment variables provide defaults for local development.
        let bind_addr = std::env::var("MARQUEE_BIND")
            .unwrap_or_else(|_| "0.0.0.0:3001".to_string())
            .parse()
            .with_context(|| "parse MARQUEE_BIND")?;
        let metrics_bind = std::env::var("MARQUEE_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
            .parse()
            .with_context(|| "parse MARQUEE_METRICS_BIND")?;
        let notify_queue_capacity = std::env::var("MARQUEE_NOTIFY_QUEUE_CAPACITY")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_NOTIFY_QUEUE_CAPACITY);
        let presence_stale_secs = std::env::var("MARQUEE_PRESENCE_STALE_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_PRESENCE_STALE_SECS);
        Ok(Self {
            bind_addr,
            metrics_bind,
            notify_queue_capacity,
            presence_stale_secs,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("MARQUEE_CONFIG") {
            // YAML overrides allow ops-friendly config files.
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read MARQUEE_CONFIG: {path}"))?;
            let override_cfg: ServerConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse server config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.notify_queue_capacity.filter(|value| *value > 0) {
                config.notify_queue_capacity = value;
            }
            if let Some(value) = override_cfg.presence_stale_secs.filter(|value| *value > 0) {
                config.presence_stale_secs = value;
            }
        }
        Ok(config)
    }

    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs(self.presence_stale_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            std::env::set_var(key, value);
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            std::env::remove_var(key);
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_without_env() {
        let _g1 = EnvGuard::unset("MARQUEE_BIND");
        let _g2 = EnvGuard::unset("MARQUEE_METRICS_BIND");
        let _g3 = EnvGuard::unset("MARQUEE_NOTIFY_QUEUE_CAPACITY");
        let _g4 = EnvGuard::unset("MARQUEE_PRESENCE_STALE_SECS");
        let _g5 = EnvGuard::unset("MARQUEE_CONFIG");

        let config = ServerConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.metrics_bind.port(), 9090);
        assert_eq!(config.notify_queue_capacity, 64);
        assert_eq!(config.presence_stale_secs, 90);
        assert_eq!(config.stale_threshold(), Duration::from_secs(90));
    }

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        let _g1 = EnvGuard::set("MARQUEE_BIND", "127.0.0.1:4100");
        let _g2 = EnvGuard::set("MARQUEE_NOTIFY_QUEUE_CAPACITY", "8");
        let _g3 = EnvGuard::set("MARQUEE_PRESENCE_STALE_SECS", "15");
        let _g4 = EnvGuard::unset("MARQUEE_CONFIG");

        let config = ServerConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.bind_addr.port(), 4100);
        assert_eq!(config.notify_queue_capacity, 8);
        assert_eq!(config.presence_stale_secs, 15);
    }

    #[test]
    #[serial]
    fn zero_capacity_env_falls_back_to_default() {
        let _g1 = EnvGuard::set("MARQUEE_NOTIFY_QUEUE_CAPACITY", "0");
        let _g2 = EnvGuard::unset("MARQUEE_CONFIG");

        let config = ServerConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.notify_queue_capacity, 64);
    }

    #[test]
    #[serial]
    fn invalid_bind_is_an_error() {
        let _g1 = EnvGuard::set("MARQUEE_BIND", "not-an-addr");
        let err = ServerConfig::from_env().err().expect("parse failure");
        assert!(err.to_string().contains("MARQUEE_BIND"));
    }

    #[test]
    #[serial]
    fn yaml_overrides_env() {
        let mut file = tempfile_named("marquee-config-test.yaml");
        writeln!(
            file.1,
            "bind_addr: \"127.0.0.1:4200\"\npresence_stale_secs: 30"
        )
        .expect("write yaml");
        let _g1 = EnvGuard::unset("MARQUEE_BIND");
        let _g2 = EnvGuard::set("MARQUEE_CONFIG", &file.0);

        let config = ServerConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.bind_addr.port(), 4200);
        assert_eq!(config.presence_stale_secs, 30);
        // Untouched keys keep env defaults.
        assert_eq!(config.notify_queue_capacity, 64);

        let _ = std::fs::remove_file(&file.0);
    }

    fn tempfile_named(name: &str) -> (String, std::fs::File) {
        let path = std::env::temp_dir().join(name);
        let file = std::fs::File::create(&path).expect("temp file");
        (path.to_string_lossy().into_owned(), file)
    }
}
