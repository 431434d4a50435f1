//! Process-wide bootstrap: configuration and logging, set up once on the first
//! call into any intercepted entry point and never torn down.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use scaler_core::{ScalerConfig, CONFIG_FILE_NAME};

use crate::logger;

static CONFIG: LazyLock<ScalerConfig> = LazyLock::new(|| {
    let loaded = load_config();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    logger::init(&config);
    if let Err(e) = loaded {
        log::warn!("{:#}; using default settings.", e);
    }
    log::info!(
        "d3d9 scaler loaded (enabled: {}, aspect tolerance: {}, centering: {:?}).",
        config.enabled,
        config.aspect_tolerance,
        config.center_rounding,
    );
    config
});

fn load_config() -> anyhow::Result<ScalerConfig> {
    ScalerConfig::load(Path::new(CONFIG_FILE_NAME))
        .with_context(|| format!("Cannot use {}", CONFIG_FILE_NAME))
}

pub fn initialize() {
    LazyLock::force(&CONFIG);
}

pub fn config() -> &'static ScalerConfig {
    &CONFIG
}
