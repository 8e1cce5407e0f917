//! One-time process startup.
//!
//! # Lifecycle
//! ```text
//! Uninitialized ──initialize()──► Initializing ──► Ready(AppContext)
//!                                      │
//!                                      └── error ──► Failed
//! ```
//! `Ready` and `Failed` are terminal, and they are terminal for the whole
//! process: the state is mirrored into one process-wide guard, so a second
//! call to [`Bootstrap::initialize`], whether on the same value or on a fresh
//! [`Bootstrap`], returns [`BootstrapError::AlreadyInitialized`] (or
//! [`BootstrapError::PreviouslyFailed`]) and touches nothing: no config is
//! re-read and no second log sink is opened.
//!
//! # Steps
//! 1. Load [`EnvConfig`]; a missing or non-numeric required value is fatal.
//! 2. Open log sinks.  [`StartupMode::Cli`] and [`StartupMode::Bot`] get
//!    rotating files under `logs/`; [`StartupMode::Embedded`] gets discard
//!    sinks and creates no files.
//! 3. Build the [`IdentityClient`] when running as the bot with an `NPSSO`
//!    token.  Without one the bot still starts, after a warning and a pause
//!    so an operator watching the console sees it.  The warning is also kept
//!    in [`AppContext::warnings`], since no subscriber is installed yet.
//!
//! The resulting [`AppContext`] is immutable and shared by `Arc`; components
//! receive it explicitly instead of reaching for process globals.

pub mod env;
pub mod identity;
pub mod logging;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

use crate::constraints::SaveLayoutConstraints;
use crate::policy::PolicyResolver;
use crate::registry::{RegistryError, TitlePolicyRegistry};
pub use env::{EnvConfig, EnvSource, ProcessEnv};
pub use identity::IdentityClient;
pub use logging::{LogHandles, LogSink, ACCESS_TARGET};

pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// Pause after the missing-token warning.
pub const NPSSO_WARNING_DELAY: Duration = Duration::from_secs(3);

pub const NPSSO_WARNING: &str = "It is recommended that you register a NPSSO token.";

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Required environment variable {0} is not set")]
    ConfigurationMissing(&'static str),
    #[error("Environment variable {var} must be a number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("Could not open log sink: {0}")]
    LogSink(#[from] std::io::Error),
    #[error("Quirk registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("Process is already initialized")]
    AlreadyInitialized,
    #[error("A previous initialization failed; restart the process")]
    PreviouslyFailed,
}

/// Which entry point launched the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StartupMode {
    /// Command-line tool: file logging.
    Cli,
    /// Chat bot: file logging and the identity client.
    Bot,
    /// Library or GUI host: no log files.
    Embedded,
}

impl StartupMode {
    pub fn writes_log_files(self) -> bool {
        matches!(self, StartupMode::Cli | StartupMode::Bot)
    }
}

/// Knobs for [`Bootstrap::initialize`]; the defaults match production.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub log_dir:       PathBuf,
    pub warning_delay: Duration,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            log_dir:       PathBuf::from(logging::LOG_DIR),
            warning_delay: NPSSO_WARNING_DELAY,
        }
    }
}

// ── AppContext ───────────────────────────────────────────────────────────────

/// Everything the rest of the process needs, built once.
#[derive(Debug)]
pub struct AppContext {
    pub mode:        StartupMode,
    pub config:      EnvConfig,
    pub logs:        LogHandles,
    pub identity:    Option<IdentityClient>,
    pub constraints: SaveLayoutConstraints,
    pub resolver:    PolicyResolver,
    /// Operator warnings raised during startup, in order.
    pub warnings:    Vec<String>,
}

impl AppContext {
    /// Install this context's log sinks as the global tracing subscriber.
    /// Fails if any global subscriber is already set.
    pub fn install_subscriber(&self) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
        tracing::subscriber::set_global_default(self.logs.subscriber())
    }
}

// ── Process guard ────────────────────────────────────────────────────────────

const GUARD_UNINIT:       u8 = 0;
const GUARD_INITIALIZING: u8 = 1;
const GUARD_READY:        u8 = 2;
const GUARD_FAILED:       u8 = 3;

/// Once-per-process latch over the bootstrap state.  Holds no context; the
/// context still travels by `Arc`.
#[derive(Debug)]
struct ProcessGuard(AtomicU8);

impl ProcessGuard {
    const fn new() -> Self {
        Self(AtomicU8::new(GUARD_UNINIT))
    }

    /// Claim the guard for one initialization attempt.
    fn claim(&self) -> Result<(), BootstrapError> {
        match self.0.compare_exchange(GUARD_UNINIT, GUARD_INITIALIZING, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => Ok(()),
            Err(GUARD_FAILED) => Err(BootstrapError::PreviouslyFailed),
            Err(_) => Err(BootstrapError::AlreadyInitialized),
        }
    }

    fn finish(&self, ok: bool) {
        self.0.store(if ok { GUARD_READY } else { GUARD_FAILED }, Ordering::Release);
    }
}

static PROCESS: ProcessGuard = ProcessGuard::new();

// ── Bootstrap ────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum BootstrapState {
    Uninitialized,
    Initializing,
    Ready(Arc<AppContext>),
    Failed,
}

#[derive(Debug)]
pub struct Bootstrap {
    state: BootstrapState,
}

impl Default for Bootstrap {
    fn default() -> Self { Self::new() }
}

impl Bootstrap {
    pub fn new() -> Self {
        Self { state: BootstrapState::Uninitialized }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, BootstrapState::Ready(_))
    }

    pub fn context(&self) -> Option<Arc<AppContext>> {
        match &self.state {
            BootstrapState::Ready(ctx) => Some(Arc::clone(ctx)),
            _ => None,
        }
    }

    /// Run startup once for this process.  Any later call, on this or any
    /// other `Bootstrap`, is rejected without side effects.
    pub fn initialize(
        &mut self,
        mode: StartupMode,
        env:  &dyn EnvSource,
        opts: BootstrapOptions,
    ) -> Result<Arc<AppContext>, BootstrapError> {
        self.initialize_with(&PROCESS, mode, env, opts)
    }

    fn initialize_with(
        &mut self,
        guard: &ProcessGuard,
        mode:  StartupMode,
        env:   &dyn EnvSource,
        opts:  BootstrapOptions,
    ) -> Result<Arc<AppContext>, BootstrapError> {
        match self.state {
            BootstrapState::Uninitialized => {}
            BootstrapState::Initializing | BootstrapState::Ready(_) => {
                return Err(BootstrapError::AlreadyInitialized)
            }
            BootstrapState::Failed => return Err(BootstrapError::PreviouslyFailed),
        }
        guard.claim()?;

        self.state = BootstrapState::Initializing;
        let built = build_context(mode, env, &opts);
        guard.finish(built.is_ok());
        match built {
            Ok(ctx) => {
                let ctx = Arc::new(ctx);
                self.state = BootstrapState::Ready(Arc::clone(&ctx));
                Ok(ctx)
            }
            Err(e) => {
                self.state = BootstrapState::Failed;
                Err(e)
            }
        }
    }
}

fn build_context(
    mode: StartupMode,
    env:  &dyn EnvSource,
    opts: &BootstrapOptions,
) -> Result<AppContext, BootstrapError> {
    let config = EnvConfig::load(mode, env)?;

    let logs = if mode.writes_log_files() {
        LogHandles::files(&opts.log_dir)?
    } else {
        LogHandles::discard()
    };

    let identity = match (mode, config.npsso.as_deref()) {
        (StartupMode::Bot, Some(token)) => IdentityClient::new(token),
        _ => None,
    };
    let mut warnings = Vec::new();
    if mode == StartupMode::Bot && identity.is_none() {
        eprintln!("{NPSSO_WARNING}");
        warnings.push(NPSSO_WARNING.to_owned());
        std::thread::sleep(opts.warning_delay);
    }

    let registry = Arc::new(TitlePolicyRegistry::builtin()?);
    Ok(AppContext {
        mode,
        config,
        logs,
        identity,
        constraints: SaveLayoutConstraints::default(),
        resolver:    PolicyResolver::new(registry),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::env::{VAR_CECIE_PORT, VAR_FTP_PORT, VAR_IP, VAR_MOUNT_PATH, VAR_NPSSO, VAR_TOKEN, VAR_UPLOAD_PATH};
    use std::collections::HashMap;
    use std::path::Path;
    use std::time::Instant;
    use tempfile::TempDir;

    fn env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (VAR_IP, "10.0.0.2"),
            (VAR_FTP_PORT, "2121"),
            (VAR_CECIE_PORT, "1234"),
            (VAR_UPLOAD_PATH, "/data/upload"),
            (VAR_MOUNT_PATH, "/mnt/sandbox"),
        ])
    }

    fn opts(dir: &Path) -> BootstrapOptions {
        BootstrapOptions { log_dir: dir.join("logs"), warning_delay: Duration::ZERO }
    }

    #[test]
    fn second_bootstrap_in_process_is_rejected() {
        let dir = TempDir::new().unwrap();
        let guard = ProcessGuard::new();
        let first = Bootstrap::new().initialize_with(&guard, StartupMode::Cli, &env(), opts(dir.path()));
        assert!(first.is_ok());

        let other = dir.path().join("other");
        let second = Bootstrap::new().initialize_with(&guard, StartupMode::Cli, &env(), opts(&other));
        assert!(matches!(second, Err(BootstrapError::AlreadyInitialized)));
        assert!(!other.exists());
    }

    #[test]
    fn failure_is_sticky_across_bootstraps() {
        let dir = TempDir::new().unwrap();
        let guard = ProcessGuard::new();
        let mut vars = env();
        vars.remove(VAR_FTP_PORT);

        let mut boot = Bootstrap::new();
        let err = boot.initialize_with(&guard, StartupMode::Cli, &vars, opts(dir.path())).unwrap_err();
        assert!(matches!(err, BootstrapError::ConfigurationMissing("FTP_PORT")));
        assert!(!boot.is_ready());
        assert!(!dir.path().join("logs").exists());

        let retry = boot.initialize_with(&guard, StartupMode::Cli, &env(), opts(dir.path()));
        assert!(matches!(retry, Err(BootstrapError::PreviouslyFailed)));
        let fresh = Bootstrap::new().initialize_with(&guard, StartupMode::Cli, &env(), opts(dir.path()));
        assert!(matches!(fresh, Err(BootstrapError::PreviouslyFailed)));
    }

    #[test]
    fn embedded_mode_creates_no_files() {
        let dir = TempDir::new().unwrap();
        let ctx = build_context(StartupMode::Embedded, &env(), &opts(dir.path())).unwrap();
        assert!(ctx.logs.general.is_discard() && ctx.logs.access.is_discard());
        assert!(!dir.path().join("logs").exists());
        assert!(ctx.resolver.resolve("CUSA00411").has("gtav"));
        assert_eq!(ctx.constraints.max_blocks(), 32768);
    }

    #[test]
    fn bot_identity_client_needs_npsso() {
        let dir = TempDir::new().unwrap();
        let mut vars = env();
        vars.insert(VAR_TOKEN, "bot-token");
        vars.insert(VAR_NPSSO, "sso-token");

        let ctx = build_context(StartupMode::Bot, &vars, &opts(dir.path())).unwrap();
        assert_eq!(ctx.identity.as_ref().unwrap().npsso(), "sso-token");
        assert!(ctx.warnings.is_empty());

        // Only the bot gets a client, even with a token present.
        let ctx = build_context(StartupMode::Cli, &vars, &opts(dir.path())).unwrap();
        assert!(ctx.identity.is_none());
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn bot_without_npsso_warns_once_and_pauses() {
        let dir = TempDir::new().unwrap();
        let mut vars = env();
        vars.insert(VAR_TOKEN, "bot-token");
        let delay = Duration::from_millis(50);
        let opts = BootstrapOptions { warning_delay: delay, ..opts(dir.path()) };

        let started = Instant::now();
        let ctx = build_context(StartupMode::Bot, &vars, &opts).unwrap();
        assert!(started.elapsed() >= delay);
        assert!(ctx.identity.is_none());
        assert_eq!(ctx.warnings, vec![NPSSO_WARNING.to_string()]);
    }
}
