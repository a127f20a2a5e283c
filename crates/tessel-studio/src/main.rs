mod app;
mod assets;
mod scene;

use anyhow::Result;
use tessel_engine::device::GpuInit;
use tessel_engine::logging::{LoggingConfig, init_logging};
use tessel_engine::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "tessel studio".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, GpuInit::default(), app::StudioApp::default())
}
