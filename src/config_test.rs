use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn empty_environment_yields_defaults() {
    let config = ChatConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(config, ChatConfig::default());
}

#[test]
fn default_config_is_valid() {
    assert!(ChatConfig::default().validate().is_ok());
}

// =============================================================================
// Overrides
// =============================================================================

#[test]
fn overrides_are_applied() {
    let config = ChatConfig::from_lookup(lookup_from(&[
        ("CHAT_RETENTION_CAP", "200"),
        ("CHAT_MIN_INTERVAL_MS", "50"),
        ("CHAT_SCROLL_THRESHOLD_PX", "80.5"),
        ("CHAT_PREDICTION_WINDOW_SECS", "30"),
    ]))
    .unwrap();
    assert_eq!(config.retention_cap, 200);
    assert_eq!(config.min_interval, Duration::from_millis(50));
    assert!((config.scroll_threshold_px - 80.5).abs() < f64::EPSILON);
    assert_eq!(config.prediction_window, Duration::from_secs(30));
}

#[test]
fn unparsable_value_falls_back_to_default() {
    let config = ChatConfig::from_lookup(lookup_from(&[("CHAT_RETENTION_CAP", "lots")])).unwrap();
    assert_eq!(config.retention_cap, DEFAULT_RETENTION_CAP);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn zero_min_interval_is_rejected() {
    let err = ChatConfig::from_lookup(lookup_from(&[("CHAT_MIN_INTERVAL_MS", "0")])).unwrap_err();
    assert_eq!(err, ConfigError::Zero { field: "min_interval" });
}

#[test]
fn zero_retention_cap_is_rejected() {
    let config = ChatConfig { retention_cap: 0, ..ChatConfig::default() };
    assert_eq!(config.validate(), Err(ConfigError::Zero { field: "retention_cap" }));
}

#[test]
fn base_below_minimum_is_rejected() {
    let err = ChatConfig::from_lookup(lookup_from(&[
        ("CHAT_BASE_INTERVAL_MS", "100"),
        ("CHAT_MIN_INTERVAL_MS", "200"),
    ]))
    .unwrap_err();
    assert_eq!(err, ConfigError::BaseBelowMinimum { base_ms: 100, min_ms: 200 });
}

#[test]
fn non_finite_or_negative_scroll_threshold_is_rejected() {
    for raw in ["NaN", "inf", "-10"] {
        let err = ChatConfig::from_lookup(lookup_from(&[("CHAT_SCROLL_THRESHOLD_PX", raw)])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidScrollThreshold, "{raw}");
    }
    let config = ChatConfig { scroll_threshold_px: 0.0, ..ChatConfig::default() };
    assert_eq!(config.validate(), Ok(()));
}
