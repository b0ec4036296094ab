//! Loading settings and reference data from a configuration directory.

use chrono::{DateTime, FixedOffset, Utc};
use haulier::config::{ConfigDirectory, ConfigError};
use rstest::{fixture, rstest};

use crate::test_helpers::{FIXTURES, WEDNESDAY_MORNING};

#[fixture]
fn config() -> ConfigDirectory {
    ConfigDirectory::open(FIXTURES).expect("fixture directory exists")
}

#[rstest]
fn fixture_settings_build_every_service_policy(
    config: ConfigDirectory,
) -> Result<(), eyre::Report> {
    let settings = config.load_settings("dispatch.toml")?;

    assert_eq!(
        settings.operating_offset()?,
        FixedOffset::east_opt(7 * 3600).expect("valid offset")
    );
    let policy = settings.dispatch_policy();
    assert_eq!(policy.retry_limit, 2);
    assert!(!policy.schedule_pickup_on_create);
    assert_eq!(settings.pickup_policy()?.max_attempts(), 3);
    let planning = settings.route_planning()?;
    assert_eq!(planning.vehicle_capacity, 2);
    assert_eq!(planning.holder, "integration-planner");
    assert_eq!(settings.fleet.len(), 2);
    Ok(())
}

#[rstest]
fn fixture_reference_data_builds_snapshots(
    config: ConfigDirectory,
) -> Result<(), eyre::Report> {
    let document = config.load_reference_data("reference_data.toml")?;
    let loaded_at = DateTime::parse_from_rfc3339(WEDNESDAY_MORNING)?.with_timezone(&Utc);

    let routes = document.route_catalog(loaded_at)?;
    let carriers = document.carrier_registry(loaded_at)?;

    assert_eq!(document.routes.len(), 2);
    assert_eq!(routes.loaded_at(), loaded_at);
    let carrier_ids: Vec<&str> = carriers
        .carriers()
        .iter()
        .map(|carrier| carrier.id().as_str())
        .collect();
    assert_eq!(carrier_ids, vec!["kerry", "scg"]);
    Ok(())
}

#[rstest]
fn missing_file_reports_its_path(config: ConfigDirectory) {
    let err = config
        .load_settings("absent.toml")
        .expect_err("file does not exist");

    match err {
        ConfigError::Io { path, .. } => assert!(path.ends_with("/absent.toml"), "{path}"),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[rstest]
fn reads_cannot_escape_the_directory(config: ConfigDirectory) {
    let result = config.load_settings("../../Cargo.toml");

    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[rstest]
fn missing_directory_is_an_io_error() {
    let result = ConfigDirectory::open(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/no-such-dir"));

    assert!(matches!(result, Err(ConfigError::Io { .. })));
}
