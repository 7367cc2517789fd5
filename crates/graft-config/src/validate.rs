//! Configuration validation.
//!
//! Each `validate_*` function checks one section and returns the first
//! problem found.

use graft_core::MatchPattern;
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, ContentScriptSection, InjectorSection, LoggingSection, PayloadSection};

const VALID_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a loaded config.
///
/// # Errors
///
/// Returns the first [`ConfigError::ValidationError`] found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_logging(&config.logging)?;
    validate_injector(&config.injector)?;
    validate_extensions(config)?;
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_logging(logging: &LoggingSection) -> ConfigResult<()> {
    // The level may be a full filter expression ("info,graft_core=debug"); only
    // a bare word is checked against the known levels.
    let level = logging.level.trim();
    if level.is_empty() {
        return Err(invalid("logging.level", "must not be empty"));
    }
    let is_bare = !level.contains([',', '=']);
    if is_bare && !VALID_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.level",
            format!("unknown level {level:?}; expected one of {VALID_LEVELS:?}"),
        ));
    }

    if !VALID_FORMATS.contains(&logging.format.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format {:?}; expected one of {VALID_FORMATS:?}",
                logging.format
            ),
        ));
    }

    if let Some(console) = &logging.console_level
        && !VALID_LEVELS.contains(&console.trim().to_ascii_lowercase().as_str())
    {
        return Err(invalid(
            "logging.console_level",
            format!("unknown level {console:?}; expected one of {VALID_LEVELS:?}"),
        ));
    }
    Ok(())
}

fn validate_injector(injector: &InjectorSection) -> ConfigResult<()> {
    if injector.response_capacity == 0 {
        return Err(invalid("injector.response_capacity", "must be at least 1"));
    }
    Ok(())
}

fn validate_extensions(config: &Config) -> ConfigResult<()> {
    for (i, ext) in config.extensions.iter().enumerate() {
        let field = format!("extension[{i}]");
        if ext.id.trim().is_empty() {
            return Err(invalid(format!("{field}.id"), "must not be empty"));
        }
        if config.extensions[..i].iter().any(|other| other.id == ext.id) {
            return Err(invalid(
                format!("{field}.id"),
                format!("duplicate extension id {:?}", ext.id),
            ));
        }
        for (j, cs) in ext.content_scripts.iter().enumerate() {
            validate_content_script(cs, &format!("{field}.content_script[{j}]"))?;
        }
    }
    Ok(())
}

fn validate_content_script(cs: &ContentScriptSection, field: &str) -> ConfigResult<()> {
    if cs.matches.is_empty() {
        return Err(invalid(
            format!("{field}.matches"),
            "at least one match pattern is required",
        ));
    }
    // A malformed pattern never matches; the script's other patterns and
    // every other script stay in the feed.
    for (k, pattern) in cs.matches.iter().enumerate() {
        if let Err(e) = MatchPattern::new(pattern) {
            warn!(
                field = %format!("{field}.matches[{k}]"),
                error = %e,
                "Match pattern will never match"
            );
        }
    }
    for (k, payload) in cs.js.iter().enumerate() {
        validate_payload(payload, &format!("{field}.js[{k}]"))?;
    }
    for (k, payload) in cs.css.iter().enumerate() {
        validate_payload(payload, &format!("{field}.css[{k}]"))?;
    }
    Ok(())
}

fn validate_payload(payload: &PayloadSection, field: &str) -> ConfigResult<()> {
    if payload.source.trim().is_empty() {
        return Err(invalid(format!("{field}.source"), "must not be empty"));
    }
    match (&payload.code, &payload.file) {
        (Some(_), Some(_)) => Err(invalid(field, "set either `code` or `file`, not both")),
        (None, None) => Err(invalid(field, "one of `code` or `file` is required")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtensionSection;

    fn payload(code: Option<&str>, file: Option<&str>) -> PayloadSection {
        PayloadSection {
            source: "a.js".into(),
            code: code.map(Into::into),
            file: file.map(Into::into),
        }
    }

    fn config_with(cs: ContentScriptSection) -> Config {
        Config {
            extensions: vec![ExtensionSection {
                id: "ext1".into(),
                content_scripts: vec![cs],
            }],
            ..Config::default()
        }
    }

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_level_filter_expression_allowed() {
        let mut config = Config::default();
        config.logging.level = "info,graft_injector=trace".into();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_console_level_must_be_bare_level() {
        let mut config = Config::default();
        config.logging.console_level = Some("debug".into());
        assert!(validate(&config).is_ok());

        config.logging.console_level = Some("graft=debug".into());
        assert_eq!(field_of(validate(&config)), "logging.console_level");
    }

    #[test]
    fn test_unknown_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".into();
        assert_eq!(field_of(validate(&config)), "logging.level");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = Config::default();
        config.injector.response_capacity = 0;
        assert_eq!(field_of(validate(&config)), "injector.response_capacity");
    }

    #[test]
    fn test_empty_matches_rejected() {
        let config = config_with(ContentScriptSection::default());
        assert_eq!(
            field_of(validate(&config)),
            "extension[0].content_script[0].matches"
        );
    }

    #[test]
    fn test_malformed_pattern_is_not_fatal() {
        let config = config_with(ContentScriptSection {
            matches: vec![String::new(), "https://a.test/*".into()],
            js: vec![payload(Some("1"), None)],
            ..ContentScriptSection::default()
        });
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_payload_needs_exactly_one_body() {
        let both = config_with(ContentScriptSection {
            matches: vec!["<all_urls>".into()],
            js: vec![payload(Some("1"), Some("a.js"))],
            ..ContentScriptSection::default()
        });
        assert_eq!(
            field_of(validate(&both)),
            "extension[0].content_script[0].js[0]"
        );

        let neither = config_with(ContentScriptSection {
            matches: vec!["<all_urls>".into()],
            css: vec![payload(None, None)],
            ..ContentScriptSection::default()
        });
        assert_eq!(
            field_of(validate(&neither)),
            "extension[0].content_script[0].css[0]"
        );
    }

    #[test]
    fn test_duplicate_extension_rejected() {
        let ext = ExtensionSection {
            id: "ext1".into(),
            content_scripts: Vec::new(),
        };
        let config = Config {
            extensions: vec![ext.clone(), ext],
            ..Config::default()
        };
        assert_eq!(field_of(validate(&config)), "extension[1].id");
    }
}
