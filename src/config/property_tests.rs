//! Property-based tests for configuration module
//!
//! These tests use proptest to generate random configurations and verify
//! validation rules and edge case handling.

use super::*;
use proptest::prelude::*;

// Strategy for generating valid manager configurations
prop_compose! {
    fn valid_manager_config()(
        window_stride in 1i32..500,
        multiplier in 1i32..100,
        await_ceiling_secs in 0.5f64..600.0,
        await_poll_interval_ms in 1u64..100,
    ) -> ManagerConfig {
        ManagerConfig {
            layer_stride: window_stride * multiplier,
            window_stride,
            await_ceiling_secs,
            await_poll_interval_ms,
        }
    }
}

prop_compose! {
    fn valid_descriptor()(
        layer in -5i32..20,
        full_screen in any::<bool>(),
        asset in "[a-z]{1,8}/[a-z_]{1,12}",
        builtin_asset in any::<bool>(),
        tween_on_close in any::<bool>(),
        hide_time_to_close in prop_oneof![Just(-1.0f32), 0.0f32..30.0],
    ) -> WindowDescriptor {
        WindowDescriptor {
            layer,
            full_screen,
            asset,
            builtin_asset,
            tween_on_close,
            hide_time_to_close,
        }
    }
}

prop_compose! {
    fn valid_strata_config()(
        manager in valid_manager_config(),
        windows in prop::collection::hash_map("[A-Z][a-zA-Z]{0,10}", valid_descriptor(), 0..6),
        level in prop_oneof![
            Just("error".to_string()),
            Just("warn".to_string()),
            Just("info".to_string()),
            Just("debug".to_string()),
            Just("trace".to_string()),
        ],
    ) -> StrataConfig {
        StrataConfig {
            manager,
            logging: LogConfig { level },
            windows,
            ..StrataConfig::default()
        }
    }
}

proptest! {
    /// All generated configurations pass validation
    #[test]
    fn test_generated_configs_validate(config in valid_strata_config()) {
        prop_assert!(config.validate().is_ok());
        prop_assert!(config.manager.windows_per_layer() >= 1);
    }

    /// Generated configurations survive a trip through TOML text
    #[test]
    fn test_config_toml_roundtrip(config in valid_strata_config()) {
        let toml_str = toml::to_string(&config)?;
        let parsed = StrataConfig::from_toml(&toml_str)
            .map_err(|e| TestCaseError::fail(format!("{:#}", e)))?;

        prop_assert_eq!(config.manager.layer_stride, parsed.manager.layer_stride);
        prop_assert_eq!(config.manager.window_stride, parsed.manager.window_stride);
        prop_assert_eq!(config.windows.len(), parsed.windows.len());
        prop_assert!((config.manager.await_ceiling_secs - parsed.manager.await_ceiling_secs).abs() < 1e-9);
    }

    /// Window stride above layer stride is always rejected
    #[test]
    fn test_inverted_strides_rejected(layer_stride in 1i32..1000, extra in 1i32..1000) {
        let mut config = StrataConfig::default();
        config.manager.layer_stride = layer_stride;
        config.manager.window_stride = layer_stride + extra;
        prop_assert!(config.validate().is_err());
    }

    /// Non-positive ceilings are always rejected
    #[test]
    fn test_non_positive_ceiling_rejected(ceiling in -100.0f64..=0.0) {
        let mut config = StrataConfig::default();
        config.manager.await_ceiling_secs = ceiling;
        prop_assert!(config.validate().is_err());
    }
}
