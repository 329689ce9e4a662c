//! Integration tests for configuration parsing
//!
//! Tests daemon configuration parsing, including:
//! - Daemon config with all options
//! - Detection strategy and allowlist patterns
//! - Invalid configuration handling
//! - On-disk config files

use std::fs;

mod daemon_config {
    use super::*;

    const MINIMAL_DAEMON_CONFIG: &str = r#"
[daemon]
socket_path = "/run/mobdev.sock"
"#;

    const FULL_DAEMON_CONFIG: &str = r#"
[daemon]
socket_path = "/run/mobdev/control.sock"
service_mode = true
log_level = "debug"

[detection]
strategy = "id-allowlist"
allowlist = ["0x18d1:*", "0x04e8:0x6860"]

[helper]
program = "/usr/bin/adb"
remote_dir = "/sdcard/Download/"
"#;

    #[test]
    fn test_parse_minimal_daemon_config() {
        let config: toml::Value = toml::from_str(MINIMAL_DAEMON_CONFIG).unwrap();

        let daemon = config.get("daemon").unwrap();
        assert_eq!(
            daemon.get("socket_path").unwrap().as_str().unwrap(),
            "/run/mobdev.sock"
        );
        assert!(daemon.get("service_mode").is_none());
        assert!(daemon.get("log_level").is_none());

        assert!(config.get("detection").is_none());
        assert!(config.get("helper").is_none());
    }

    #[test]
    fn test_parse_full_daemon_config() {
        let config: toml::Value = toml::from_str(FULL_DAEMON_CONFIG).unwrap();

        let daemon = config.get("daemon").unwrap();
        assert_eq!(
            daemon.get("socket_path").unwrap().as_str().unwrap(),
            "/run/mobdev/control.sock"
        );
        assert!(daemon.get("service_mode").unwrap().as_bool().unwrap());
        assert_eq!(daemon.get("log_level").unwrap().as_str().unwrap(), "debug");

        let detection = config.get("detection").unwrap();
        assert_eq!(
            detection.get("strategy").unwrap().as_str().unwrap(),
            "id-allowlist"
        );
        let allowlist = detection.get("allowlist").unwrap().as_array().unwrap();
        assert_eq!(allowlist.len(), 2);
        assert_eq!(allowlist[0].as_str().unwrap(), "0x18d1:*");
        assert_eq!(allowlist[1].as_str().unwrap(), "0x04e8:0x6860");

        let helper = config.get("helper").unwrap();
        assert_eq!(
            helper.get("program").unwrap().as_str().unwrap(),
            "/usr/bin/adb"
        );
        assert_eq!(
            helper.get("remote_dir").unwrap().as_str().unwrap(),
            "/sdcard/Download/"
        );
    }

    #[test]
    fn test_detection_strategy_variants() {
        let strategies = vec!["class-heuristic", "id-allowlist"];

        for strategy in strategies {
            let config = format!(
                r#"
[detection]
strategy = "{}"
allowlist = ["0x18d1:*"]
"#,
                strategy
            );

            let parsed: toml::Value = toml::from_str(&config).unwrap();
            assert_eq!(
                parsed
                    .get("detection")
                    .unwrap()
                    .get("strategy")
                    .unwrap()
                    .as_str()
                    .unwrap(),
                strategy
            );
        }
    }

    #[test]
    fn test_allowlist_pattern_formats() {
        let config = r#"
[detection]
strategy = "id-allowlist"
allowlist = [
    "0x18d1:0x4ee1",
    "0x18d1:*",
    "0x04e8:0x6860",
    "0x2717:*",
]
"#;

        let parsed: toml::Value = toml::from_str(config).unwrap();
        let patterns = parsed
            .get("detection")
            .unwrap()
            .get("allowlist")
            .unwrap()
            .as_array()
            .unwrap();

        assert_eq!(patterns.len(), 4);
        assert_eq!(patterns[0].as_str().unwrap(), "0x18d1:0x4ee1");
        assert_eq!(patterns[1].as_str().unwrap(), "0x18d1:*");
        assert_eq!(patterns[3].as_str().unwrap(), "0x2717:*");
    }

    #[test]
    fn test_log_level_values() {
        let levels = vec!["trace", "debug", "info", "warn", "error"];

        for level in levels {
            let config = format!(
                r#"
[daemon]
log_level = "{}"
"#,
                level
            );

            let parsed: toml::Value = toml::from_str(&config).unwrap();
            assert_eq!(
                parsed
                    .get("daemon")
                    .unwrap()
                    .get("log_level")
                    .unwrap()
                    .as_str()
                    .unwrap(),
                level
            );
        }
    }

    #[test]
    fn test_invalid_log_level() {
        let config = r#"
[daemon]
socket_path = "/run/mobdev.sock"
log_level = "verbose"
"#;

        let parsed: toml::Value = toml::from_str(config).unwrap();
        let log_level = parsed
            .get("daemon")
            .unwrap()
            .get("log_level")
            .unwrap()
            .as_str()
            .unwrap();

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        assert!(!valid_levels.contains(&log_level));
    }

    #[test]
    fn test_missing_sections_parse() {
        let incomplete = r#"
[helper]
program = "adb"
"#;

        let parsed: Result<toml::Value, _> = toml::from_str(incomplete);
        assert!(parsed.is_ok());

        let config = parsed.unwrap();
        assert!(config.get("daemon").is_none());
        assert!(config.get("detection").is_none());
    }

    #[test]
    fn test_tilde_socket_path_kept_verbatim() {
        let config = r#"
[daemon]
socket_path = "~/.local/run/mobdev.sock"
"#;

        let parsed: toml::Value = toml::from_str(config).unwrap();
        assert_eq!(
            parsed
                .get("daemon")
                .unwrap()
                .get("socket_path")
                .unwrap()
                .as_str()
                .unwrap(),
            "~/.local/run/mobdev.sock"
        );
    }
}

mod config_file {
    use super::*;

    #[test]
    fn test_config_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.toml");

        let content = r#"
[daemon]
socket_path = "/run/mobdev.sock"
service_mode = false
log_level = "info"

[detection]
strategy = "class-heuristic"

[helper]
program = "adb"
remote_dir = "/sdcard/"
"#;

        fs::write(&path, content).unwrap();
        let parsed: toml::Value = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(
            parsed
                .get("daemon")
                .unwrap()
                .get("socket_path")
                .unwrap()
                .as_str()
                .unwrap(),
            "/run/mobdev.sock"
        );
        assert_eq!(
            parsed
                .get("detection")
                .unwrap()
                .get("strategy")
                .unwrap()
                .as_str()
                .unwrap(),
            "class-heuristic"
        );
        assert_eq!(
            parsed
                .get("helper")
                .unwrap()
                .get("remote_dir")
                .unwrap()
                .as_str()
                .unwrap(),
            "/sdcard/"
        );
    }

    #[test]
    fn test_empty_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.toml");

        fs::write(&path, "").unwrap();
        let parsed: toml::Value = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert!(parsed.get("daemon").is_none());
        assert!(parsed.get("detection").is_none());
        assert!(parsed.get("helper").is_none());
    }
}
