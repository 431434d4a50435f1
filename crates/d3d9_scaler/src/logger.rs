use std::fs::File;

use log::LevelFilter;
use scaler_core::ScalerConfig;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SetLoggerError, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Installs the process logger: stderr plus `config.log_file`, or stderr alone
/// when the file cannot be created. Does nothing at level `off`.
pub fn init(config: &ScalerConfig) {
    let level = config.log_level;
    if level == LevelFilter::Off {
        return;
    }

    let file_error = match install(level, File::create(&config.log_file)) {
        Ok(file_error) => file_error,
        Err(e) => {
            log::error!("Failed to initialize logger: {}", e);
            return;
        }
    };
    if let Some(e) = file_error {
        log::warn!("Cannot create {}: {}; logging to stderr only.", config.log_file.display(), e);
    }
}

/// Returns the file error, if any, once a logger is in place.
fn install(level: LevelFilter, file: std::io::Result<File>) -> Result<Option<std::io::Error>, SetLoggerError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    let file_error = match file {
        Ok(file) => {
            // Devices may be driven from several threads; tag file lines with the thread id.
            let file_config = ConfigBuilder::new().set_thread_level(LevelFilter::Error).build();
            loggers.push(WriteLogger::new(level, file_config, file));
            None
        }
        Err(e) => Some(e),
    };

    CombinedLogger::init(loggers)?;
    Ok(file_error)
}
