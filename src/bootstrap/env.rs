//! Environment configuration read once at startup.

use std::collections::HashMap;
use std::path::PathBuf;

use super::{BootstrapError, StartupMode};

pub const VAR_IP:            &str = "IP";
pub const VAR_FTP_PORT:      &str = "FTP_PORT";
pub const VAR_CECIE_PORT:    &str = "CECIE_PORT";
pub const VAR_UPLOAD_PATH:   &str = "UPLOAD_PATH";
pub const VAR_MOUNT_PATH:    &str = "MOUNT_PATH";
pub const VAR_STORED_SAVES:  &str = "STORED_SAVES_FOLDER_PATH";
pub const VAR_TOKEN:         &str = "TOKEN";
pub const VAR_NPSSO:         &str = "NPSSO";

pub const DEFAULT_STORED_SAVES: &str = "STORAGE";
pub const DEFAULT_FTP_PORT:     u16 = 2121;
pub const DEFAULT_CECIE_PORT:   u16 = 1234;

/// Where configuration values come from.  [`ProcessEnv`] reads the real
/// environment; a `HashMap` serves tests and embedders.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|v| (*v).to_owned())
    }
}

// ── EnvConfig ────────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub ip:                  String,
    pub ftp_port:            u16,
    pub cecie_port:          u16,
    pub upload_path:         PathBuf,
    pub mount_path:          PathBuf,
    pub stored_saves_folder: PathBuf,
    pub bot_token:           Option<String>,
    /// Single-sign-on token for the identity client.  Absent means account
    /// lookups fall back to a slower path; startup still succeeds.
    pub npsso:               Option<String>,
}

// Tokens stay out of debug output.
impl std::fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfig")
            .field("ip", &self.ip)
            .field("ftp_port", &self.ftp_port)
            .field("cecie_port", &self.cecie_port)
            .field("upload_path", &self.upload_path)
            .field("mount_path", &self.mount_path)
            .field("stored_saves_folder", &self.stored_saves_folder)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("npsso", &self.npsso.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl EnvConfig {
    pub fn load(mode: StartupMode, env: &dyn EnvSource) -> Result<Self, BootstrapError> {
        let bot_token = non_empty(env, VAR_TOKEN);
        if mode == StartupMode::Bot && bot_token.is_none() {
            return Err(BootstrapError::ConfigurationMissing(VAR_TOKEN));
        }
        Ok(Self {
            ip:                  required(env, VAR_IP)?,
            ftp_port:            port(env, VAR_FTP_PORT)?,
            cecie_port:          port(env, VAR_CECIE_PORT)?,
            upload_path:         required(env, VAR_UPLOAD_PATH)?.into(),
            mount_path:          required(env, VAR_MOUNT_PATH)?.into(),
            stored_saves_folder: non_empty(env, VAR_STORED_SAVES)
                .unwrap_or_else(|| DEFAULT_STORED_SAVES.to_owned())
                .into(),
            bot_token,
            npsso:               non_empty(env, VAR_NPSSO),
        })
    }

    /// A starter `.env` file listing every variable, with the default ports
    /// and stored-saves folder filled in.
    pub fn template() -> String {
        [
            format!("{VAR_IP} ="),
            format!("{VAR_FTP_PORT} = {DEFAULT_FTP_PORT}"),
            format!("{VAR_CECIE_PORT} = {DEFAULT_CECIE_PORT}"),
            format!("{VAR_UPLOAD_PATH} ="),
            format!("{VAR_MOUNT_PATH} ="),
            format!("{VAR_STORED_SAVES} = {DEFAULT_STORED_SAVES}"),
            format!("{VAR_TOKEN} ="),
            format!("{VAR_NPSSO} ="),
        ]
        .join("\n")
            + "\n"
    }
}

fn non_empty(env: &dyn EnvSource, key: &str) -> Option<String> {
    env.get(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn required(env: &dyn EnvSource, key: &'static str) -> Result<String, BootstrapError> {
    non_empty(env, key).ok_or(BootstrapError::ConfigurationMissing(key))
}

fn port(env: &dyn EnvSource, key: &'static str) -> Result<u16, BootstrapError> {
    let raw = required(env, key)?;
    raw.parse().map_err(|_| BootstrapError::InvalidNumber { var: key, value: raw })
}
