//! Strategy configuration files.
//!
//! Configs are TOML documents mirroring `StrategyConfig`; any missing section
//! or field takes its `original()` default.

use std::path::Path;

use orb_core::StrategyConfig;

use crate::error::RunError;

/// Parse and validate a TOML config document.
pub fn parse_config(text: &str, origin: &Path) -> Result<StrategyConfig, RunError> {
    let config: StrategyConfig = toml::from_str(text).map_err(|source| RunError::Toml {
        path: origin.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<StrategyConfig, RunError> {
    let text = std::fs::read_to_string(path).map_err(|e| RunError::io(path, e))?;
    parse_config(&text, path)
}

/// Serialize a config as TOML.
pub fn render_config(config: &StrategyConfig) -> Result<String, RunError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Deterministic content hash of a config (BLAKE3 over its JSON encoding).
///
/// Two configs with identical parameters share a fingerprint, so results
/// can be keyed and compared across runs.
pub fn config_fingerprint(config: &StrategyConfig) -> Result<String, RunError> {
    let json = serde_json::to_string(config)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn origin() -> &'static Path {
        Path::new("test.toml")
    }

    #[test]
    fn empty_document_is_the_original_preset() {
        let config = parse_config("", origin()).unwrap();
        assert_eq!(config, StrategyConfig::original());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let text = r#"
max_reentries = 1
ladder = [40.0, 80.0, 120.0, 160.0, 200.0]

[session]
orb_candles = 10
no_entry_after = "12:00:00"

[filter]
rsi_enabled = false
"#;
        let config = parse_config(text, origin()).unwrap();
        assert_eq!(config.max_reentries, 1);
        assert_eq!(config.session.orb_candles, 10);
        assert_eq!(config.session.no_entry_after, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(config.session.force_exit_time, NaiveTime::from_hms_opt(15, 15, 0).unwrap());
        assert!(!config.filter.rsi_enabled);
        assert!(config.filter.supertrend_enabled);
        assert_eq!(config.ladder.target(), 200.0);
        assert_eq!(config.instrument.itm_offset, 200.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = parse_config("[session]\norb_candles = 0\n", origin()).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));

        let err = parse_config("ladder = [30.0, 20.0, 90.0, 120.0, 150.0]\n", origin()).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn malformed_toml_names_the_file() {
        let err = parse_config("max_reentries = [", origin()).unwrap_err();
        assert!(err.to_string().contains("test.toml"));
    }

    #[test]
    fn rendered_config_parses_back() {
        let tuned = StrategyConfig::tuned();
        let parsed = parse_config(&render_config(&tuned).unwrap(), origin()).unwrap();
        assert_eq!(parsed, tuned);
    }

    #[test]
    fn fingerprint_is_deterministic_and_parameter_sensitive() {
        let a = StrategyConfig::original();
        let mut b = a.clone();
        assert_eq!(config_fingerprint(&a).unwrap(), config_fingerprint(&b).unwrap());
        b.instrument.itm_offset = 300.0;
        assert_ne!(config_fingerprint(&a).unwrap(), config_fingerprint(&b).unwrap());
        assert_eq!(config_fingerprint(&a).unwrap().len(), 64);
    }
}
