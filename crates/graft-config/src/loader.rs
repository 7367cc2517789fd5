//! Config loading.
//!
//! Loading runs in this order:
//! 1. Read and parse the TOML file (size-limited)
//! 2. Read payload `file` references relative to the config directory
//! 3. Apply `GRAFT_*` environment overrides
//! 4. Validate

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, PayloadSection};
use crate::validate;

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Maximum size of a single payload file (4 MB).
const MAX_PAYLOAD_FILE_SIZE: u64 = 4 * 1_048_576;

/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "GRAFT_LOG_LEVEL";
/// Environment variable overriding `logging.format`.
pub const ENV_LOG_FORMAT: &str = "GRAFT_LOG_FORMAT";

/// Load a config from a file path.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, a payload
/// file cannot be read, or validation fails.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let content = read_limited(path, MAX_CONFIG_FILE_SIZE)?;
    let mut config = parse(&content, &path.display().to_string())?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    finish(&mut config, Some(base_dir), &collect_env_vars())?;
    Ok(config)
}

/// Load a config from TOML text.
///
/// Payload `file` entries are resolved against `base_dir`; without one they
/// are resolved against the working directory.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the text is malformed, a payload file cannot
/// be read, or validation fails.
pub fn load_str(text: &str, base_dir: Option<&Path>) -> ConfigResult<Config> {
    let mut config = parse(text, "<inline>")?;
    finish(&mut config, base_dir, &collect_env_vars())?;
    Ok(config)
}

fn parse(text: &str, label: &str) -> ConfigResult<Config> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: label.to_string(),
        source: e,
    })
}

fn finish(
    config: &mut Config,
    base_dir: Option<&Path>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<()> {
    // Shape checks run first so a payload with both `code` and `file` is
    // reported rather than silently resolved.
    validate::validate(config)?;
    resolve_payload_files(config, base_dir.unwrap_or_else(|| Path::new(".")))?;
    let applied = apply_env_overrides(config, env_vars);
    if applied > 0 {
        debug!(count = applied, "applied environment variable overrides");
    }
    validate::validate(config)
}

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Apply `GRAFT_LOG_LEVEL` and `GRAFT_LOG_FORMAT` from `env_vars`.
///
/// Returns the number of overrides applied.
pub fn apply_env_overrides(config: &mut Config, env_vars: &HashMap<String, String>) -> usize {
    let mut applied = 0_usize;
    if let Some(level) = env_vars.get(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
        config.logging.level = level.trim().to_string();
        applied = applied.saturating_add(1);
    }
    if let Some(format) = env_vars.get(ENV_LOG_FORMAT).filter(|v| !v.trim().is_empty()) {
        config.logging.format = format.trim().to_ascii_lowercase();
        applied = applied.saturating_add(1);
    }
    applied
}

/// Replace every payload `file` reference with the file's contents.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] if a referenced file cannot be read, or
/// [`ConfigError::ValidationError`] if it is too large.
pub fn resolve_payload_files(config: &mut Config, base_dir: &Path) -> ConfigResult<()> {
    for ext in &mut config.extensions {
        for cs in &mut ext.content_scripts {
            for payload in cs.js.iter_mut().chain(cs.css.iter_mut()) {
                resolve_payload(payload, base_dir)?;
            }
        }
    }
    Ok(())
}

fn resolve_payload(payload: &mut PayloadSection, base_dir: &Path) -> ConfigResult<()> {
    let Some(file) = payload.file.take() else {
        return Ok(());
    };
    let path = if file.is_absolute() {
        file
    } else {
        base_dir.join(file)
    };
    debug!(source = %payload.source, path = %path.display(), "reading payload file");
    payload.code = Some(read_limited(&path, MAX_PAYLOAD_FILE_SIZE)?);
    Ok(())
}

fn read_limited(path: &Path, limit: u64) -> ConfigResult<String> {
    // Check file size before reading to prevent OOM.
    let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    if metadata.len() > limit {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "file is {} bytes, exceeding the {limit} byte limit",
                metadata.len()
            ),
        });
    }

    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"
        [logging]
        level = "debug"

        [[extension]]
        id = "ext1"

        [[extension.content_script]]
        matches = ["https://*.example.com/*"]
        run_at = "document_end"
        js = [{ source = "content.js", file = "scripts/content.js" }]
        css = [{ source = "inline.css", code = "body { color: red }" }]
    "#;

    #[test]
    fn test_malformed_pattern_does_not_block_other_extensions() {
        let text = r#"
            [[extension]]
            id = "good"

            [[extension.content_script]]
            matches = ["<all_urls>"]
            js = [{ source = "good.js", code = "1" }]

            [[extension]]
            id = "bad"

            [[extension.content_script]]
            matches = ["", "https://a.test/*"]
            js = [{ source = "bad.js", code = "2" }]
        "#;

        let config = load_str(text, None).unwrap();
        let feed = config.declarations().unwrap();
        let ids: Vec<&str> = feed.iter().map(|d| d.extension_id.as_str()).collect();
        assert_eq!(ids, vec!["good", "bad"]);
        assert_eq!(feed[1].content_scripts[0].matches, vec!["", "https://a.test/*"]);
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/graft.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_load_file_resolves_payload_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("scripts")).unwrap();
        std::fs::write(dir.path().join("scripts/content.js"), "return 42;").unwrap();
        let path = dir.path().join("graft.toml");
        std::fs::write(&path, FEED).unwrap();

        let config = load_file(&path).unwrap();
        let js = &config.extensions[0].content_scripts[0].js[0];
        assert_eq!(js.code.as_deref(), Some("return 42;"));
        assert!(js.file.is_none());

        let feed = config.declarations().unwrap();
        assert_eq!(feed[0].content_scripts[0].js[0].code, "return 42;");
    }

    #[test]
    fn test_missing_payload_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graft.toml");
        std::fs::write(&path, FEED).unwrap();

        let err = load_file(&path).unwrap_err();
        match err {
            ConfigError::ReadError { path, .. } => assert!(path.ends_with("content.js")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_str_parse_error() {
        let result = load_str("[[extension]\nid = ", None);
        assert!(matches!(result, Err(ConfigError::ParseError { ref path, .. }) if path == "<inline>"));
    }

    #[test]
    fn test_load_str_inline_only() {
        let config = load_str(
            r#"
            [[extension]]
            id = "ext1"
            [[extension.content_script]]
            matches = ["<all_urls>"]
            js = [{ source = "a.js", code = "return 1;" }]
            "#,
            None,
        )
        .unwrap();
        assert_eq!(config.declarations().unwrap().len(), 1);
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graft.toml");
        let size = usize::try_from(MAX_CONFIG_FILE_SIZE).unwrap();
        std::fs::write(&path, "#".repeat(size.saturating_add(1))).unwrap();

        let result = load_file(&path);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        let env: HashMap<String, String> = [
            (ENV_LOG_LEVEL.to_string(), "trace".to_string()),
            (ENV_LOG_FORMAT.to_string(), " JSON ".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(apply_env_overrides(&mut config, &env), 2);
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_env_overrides_ignore_blank() {
        let mut config = Config::default();
        let env: HashMap<String, String> = [(ENV_LOG_LEVEL.to_string(), "  ".to_string())]
            .into_iter()
            .collect();

        assert_eq!(apply_env_overrides(&mut config, &env), 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_env_format_fails_validation() {
        let mut config = Config::default();
        let env: HashMap<String, String> = [(ENV_LOG_FORMAT.to_string(), "xml".to_string())]
            .into_iter()
            .collect();

        let result = finish(&mut config, None, &env);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { ref field, .. }) if field == "logging.format"
        ));
    }
}
