//! Global tracing setup for the binary.
//!
//! The subscriber is installed before the config file is read so that config
//! loading can log. The configured `log_level` is applied afterwards through a
//! reload handle, unless `RUST_LOG` pins the filter.

use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

pub const DEFAULT_LEVEL: &str = "info";

pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Install the global subscriber: `RUST_LOG` if set, `info` otherwise.
pub fn init() -> FilterHandle {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
    handle
}

/// Switch to the level from the config file. `RUST_LOG` wins when present.
pub fn apply_config_level(handle: &FilterHandle, level: &str) {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return;
    }
    if let Err(e) = set_level(handle, level) {
        warn!("Ignoring log_level {:?}: {}", level, e);
    }
}

/// Replace the active filter. An unparsable directive leaves the current one in place.
pub fn set_level(handle: &FilterHandle, level: &str) -> Result<(), String> {
    let filter = EnvFilter::try_new(level).map_err(|e| e.to_string())?;
    handle.reload(filter).map_err(|e| e.to_string())
}
