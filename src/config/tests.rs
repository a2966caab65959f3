use super::*;

#[test]
fn defaults_resolve_without_any_sources() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.default_ttl_seconds, 60);
    assert_eq!(settings.cache.reference_ttl_seconds, 3600);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cache_kill_switch_can_be_set_from_cli() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        cache_enabled: Some(false),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(!settings.cache.enabled);
}

#[test]
fn cache_ttl_tiers_can_be_overridden_independently() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        cache_default_ttl_seconds: Some(5),
        cache_reference_ttl_seconds: Some(86_400),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.default_ttl_seconds, 5);
    assert_eq!(settings.cache.reference_ttl_seconds, 86_400);
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loudest".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid level rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn invalid_host_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.host = Some("not a host".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid host rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "server.host",
            ..
        }
    ));
}

#[test]
fn cache_settings_convert_into_cache_config() {
    let settings = CacheSettings {
        enabled: false,
        default_ttl_seconds: 7,
        reference_ttl_seconds: 900,
    };
    let config = crate::cache::CacheConfig::from(&settings);
    assert!(!config.enabled);
    assert_eq!(config.default_ttl_seconds, 7);
    assert_eq!(config.reference_ttl_seconds, 900);
}
