use ferrous_container::{Container, ContainerConfig, DiError};

// Each test uses its own prefix so parallel tests never share variables

#[test]
fn test_from_env_with_prefix() {
    std::env::set_var("CFGTEST_A_DETECT_CYCLES", "false");
    std::env::set_var("CFGTEST_A_MAX_DEPTH", "12");

    let config = ContainerConfig::from_env_with_prefix("cfgtest_a").unwrap();
    assert!(!config.detect_cycles);
    assert_eq!(config.max_depth, 12);

    let container = Container::with_config(config);
    assert_eq!(container.config().max_depth, 12);
}

#[test]
fn test_from_env_defaults_when_unset() {
    let config = ContainerConfig::from_env_with_prefix("CFGTEST_UNSET").unwrap();
    assert_eq!(config, ContainerConfig::default());
}

#[test]
fn test_from_env_rejects_invalid_values() {
    std::env::set_var("CFGTEST_B_MAX_DEPTH", "-1");
    assert!(matches!(
        ContainerConfig::from_env_with_prefix("CFGTEST_B"),
        Err(DiError::InvalidConfig(_))
    ));
}

#[cfg(feature = "config")]
#[test]
fn test_from_json() {
    let json = serde_json::json!({ "detect_cycles": false, "max_depth": 64 }).to_string();
    let config = ContainerConfig::from_json_str(&json).unwrap();
    assert_eq!(
        config,
        ContainerConfig::new().with_cycle_detection(false).with_max_depth(64)
    );

    assert!(matches!(
        ContainerConfig::from_json_str("{\"max_depth\": \"deep\"}"),
        Err(DiError::InvalidConfig(_))
    ));
}
