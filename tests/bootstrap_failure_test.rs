use savepolicy::bootstrap::env::{VAR_CECIE_PORT, VAR_FTP_PORT, VAR_IP, VAR_MOUNT_PATH, VAR_UPLOAD_PATH};
use savepolicy::bootstrap::{Bootstrap, BootstrapError, BootstrapOptions, StartupMode};
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_failed_startup_blocks_later_bootstraps() {
    let dir = TempDir::new().unwrap();
    let opts = || BootstrapOptions { log_dir: dir.path().join("logs"), warning_delay: Duration::ZERO };
    let mut vars = HashMap::from([
        (VAR_IP, "10.0.0.2"),
        (VAR_CECIE_PORT, "1234"),
        (VAR_UPLOAD_PATH, "/data/upload"),
        (VAR_MOUNT_PATH, "/mnt/sandbox"),
    ]);

    let mut boot = Bootstrap::new();
    let err = boot.initialize(StartupMode::Cli, &vars, opts()).unwrap_err();
    assert!(matches!(err, BootstrapError::ConfigurationMissing("FTP_PORT")));
    assert!(!dir.path().join("logs").exists());

    vars.insert(VAR_FTP_PORT, "2121");
    let retry = Bootstrap::new().initialize(StartupMode::Cli, &vars, opts());
    assert!(matches!(retry, Err(BootstrapError::PreviouslyFailed)));
    assert!(!dir.path().join("logs").exists());
}
