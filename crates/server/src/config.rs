use std::{collections::HashMap, fs, time::Duration};

use anyhow::Context;
use batching::FlushSchedule;
use storage::DEFAULT_INITIAL_SIZE;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub initial_size: u64,
    pub add_flush_ms: u64,
    pub interactive_flush_ms: u64,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3001".into(),
            initial_size: DEFAULT_INITIAL_SIZE,
            add_flush_ms: 10_000,
            interactive_flush_ms: 1_000,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn schedule(&self) -> FlushSchedule {
        FlushSchedule {
            membership: Duration::from_millis(self.add_flush_ms),
            interactive: Duration::from_millis(self.interactive_flush_ms),
        }
    }
}

/// Defaults, then `server.toml` in the working directory, then environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file(&mut settings, &raw).context("failed to parse server.toml")?;
    }
    apply_env(&mut settings, |name| std::env::var(name).ok());

    Ok(settings)
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: HashMap<String, toml::Value> = toml::from_str(raw)?;

    if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
        settings.server_bind = v.to_string();
    }
    if let Some(v) = file_cfg.get("initial_size") {
        settings.initial_size = toml_u64("initial_size", v)?;
    }
    if let Some(v) = file_cfg.get("add_flush_ms") {
        settings.add_flush_ms = positive("add_flush_ms", toml_u64("add_flush_ms", v)?)?;
    }
    if let Some(v) = file_cfg.get("interactive_flush_ms") {
        settings.interactive_flush_ms =
            positive("interactive_flush_ms", toml_u64("interactive_flush_ms", v)?)?;
    }
    if let Some(v) = file_cfg.get("max_body_bytes") {
        settings.max_body_bytes = toml_u64("max_body_bytes", v)? as usize;
    }

    Ok(())
}

/// Invalid numeric overrides are logged and ignored.
pub(crate) fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env_u64(&lookup, "APP__INITIAL_SIZE") {
        settings.initial_size = v;
    }
    if let Some(v) = env_u64(&lookup, "APP__ADD_FLUSH_MS").filter(|v| *v > 0) {
        settings.add_flush_ms = v;
    }
    if let Some(v) = env_u64(&lookup, "APP__INTERACTIVE_FLUSH_MS").filter(|v| *v > 0) {
        settings.interactive_flush_ms = v;
    }
    if let Some(v) = env_u64(&lookup, "APP__MAX_BODY_BYTES") {
        settings.max_body_bytes = v as usize;
    }
}

fn env_u64(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<u64> {
    let raw = lookup(name)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(name, %raw, %error, "ignoring invalid numeric setting");
            None
        }
    }
}

fn toml_u64(name: &str, value: &toml::Value) -> anyhow::Result<u64> {
    match value {
        toml::Value::Integer(v) if *v >= 0 => Ok(*v as u64),
        toml::Value::String(v) => v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("'{name}' must be a non-negative integer")),
        _ => anyhow::bail!("'{name}' must be a non-negative integer"),
    }
}

fn positive(name: &str, value: u64) -> anyhow::Result<u64> {
    if value == 0 {
        anyhow::bail!("'{name}' must be greater than zero");
    }
    Ok(value)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
