//! Bridge from `graft_config::Config` to runtime types.

use graft_config::Config;
use graft_injector::InjectorSettings;
use graft_telemetry::{FileRotation, LogConfig, LogFormat};

/// Convert config to [`LogConfig`].
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    // Validation has already rejected unknown formats.
    let format = cfg
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();

    let mut log_config = LogConfig::new(cfg.logging.level.trim()).with_format(format);

    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }

    if let Some(level) = &cfg.logging.console_level {
        log_config = log_config.with_console_level(level.trim().to_ascii_lowercase());
    }

    if let Some(dir) = &cfg.logging.file_dir {
        log_config = log_config.with_file_logging(dir.clone(), "graft", FileRotation::Daily);
    }

    log_config
}

/// Convert config to [`InjectorSettings`].
#[must_use]
pub fn to_injector_settings(cfg: &Config) -> InjectorSettings {
    InjectorSettings {
        is_background: cfg.injector.is_background,
        drain_ticks_on_idle: cfg.injector.drain_ticks_on_idle,
        response_capacity: cfg.injector.response_capacity,
        late_registration: cfg.injector.late_registration,
    }
}
