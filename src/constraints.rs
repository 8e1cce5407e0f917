//! Structural limits of a savegame's file layout.
//!
//! [`SaveLayoutConstraints`] is built once at startup and only read after
//! that.  [`SaveLayoutConstraints::default`] carries the platform's values;
//! [`SaveLayoutConstraints::new`] accepts a custom [`ConstraintsSpec`] and
//! rejects one whose limits contradict each other.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::size::{self, SizeError};

// ── Platform values ──────────────────────────────────────────────────────────

pub const SCE_SYS_NAME:     &str = "sce_sys";
pub const PARAM_NAME:       &str = "param.sfo";
pub const KEYSTONE_NAME:    &str = "keystone";
pub const ICON0_NAME:       &str = "icon0.png";

pub const KEYSTONE_SIZE:    u64 = 0x60;
pub const ICON0_MAXSIZE:    u64 = 0x1C800;
pub const ICON0_FORMAT:     PixelFormat = PixelFormat { width: 228, height: 128 };

pub const SAVEBLOCKS_MIN:   u64 = 0x60;
pub const SAVEBLOCKS_MAX:   u64 = 32768;

pub const MAX_PATH_LEN:     usize = 1024;
pub const MAX_FILENAME_LEN: usize = 255;

/// Metadata members are small; anything past 1 MiB is suspect.
pub const SYS_FILE_MAX:     u64 = size::MEGABYTE;
pub const MAX_FILES:        usize = 100;

/// Numbered backup slots for the icon and descriptor (`sce_icon0png0`..9).
const BACKUP_SLOTS: u32 = 10;

/// Pixel dimensions of an image member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelFormat {
    pub width:  u32,
    pub height: u32,
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintsError {
    #[error("Minimum save size ({min} blocks) exceeds maximum ({max} blocks)")]
    InvertedSizeBounds { min: u64, max: u64 },
    #[error("Mandatory member '{0}' is not in the known member set")]
    MandatoryNotKnown(String),
    #[error("Size bound out of range: {0}")]
    Size(#[from] SizeError),
}

// ── ConstraintsSpec ──────────────────────────────────────────────────────────

/// Raw inputs for [`SaveLayoutConstraints::new`].
#[derive(Debug, Clone)]
pub struct ConstraintsSpec {
    pub keystone_size:    u64,
    pub icon_max_size:    u64,
    pub icon_format:      PixelFormat,
    pub mandatory:        BTreeSet<String>,
    /// Every member name the platform recognises, mandatory ones included.
    pub known:            BTreeSet<String>,
    pub min_blocks:       u64,
    pub max_blocks:       u64,
    pub max_path_len:     usize,
    pub max_filename_len: usize,
    pub sys_file_max:     u64,
    pub max_files:        usize,
}

impl Default for ConstraintsSpec {
    fn default() -> Self {
        let mandatory: BTreeSet<String> =
            [PARAM_NAME, KEYSTONE_NAME].into_iter().map(String::from).collect();
        let mut known: BTreeSet<String> = (0..BACKUP_SLOTS)
            .flat_map(|i| [format!("sce_icon0png{i}"), format!("sce_paramsfo{i}")])
            .collect();
        known.insert(ICON0_NAME.to_owned());
        known.extend(mandatory.iter().cloned());
        Self {
            keystone_size:    KEYSTONE_SIZE,
            icon_max_size:    ICON0_MAXSIZE,
            icon_format:      ICON0_FORMAT,
            mandatory,
            known,
            min_blocks:       SAVEBLOCKS_MIN,
            max_blocks:       SAVEBLOCKS_MAX,
            max_path_len:     MAX_PATH_LEN,
            max_filename_len: MAX_FILENAME_LEN,
            sys_file_max:     SYS_FILE_MAX,
            max_files:        MAX_FILES,
        }
    }
}

// ── SaveLayoutConstraints ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SaveLayoutConstraints {
    keystone_size:    u64,
    icon_max_size:    u64,
    icon_format:      PixelFormat,
    mandatory:        BTreeSet<String>,
    known:            BTreeSet<String>,
    min_blocks:       u64,
    max_blocks:       u64,
    min_bytes:        u64,
    max_bytes:        u64,
    max_path_len:     usize,
    max_filename_len: usize,
    sys_file_max:     u64,
    max_files:        usize,
}

impl SaveLayoutConstraints {
    pub fn new(spec: ConstraintsSpec) -> Result<Self, ConstraintsError> {
        let min_bytes = size::blocks_to_bytes(to_signed(spec.min_blocks)?)?;
        let max_bytes = size::blocks_to_bytes(to_signed(spec.max_blocks)?)?;
        if min_bytes > max_bytes {
            return Err(ConstraintsError::InvertedSizeBounds {
                min: spec.min_blocks,
                max: spec.max_blocks,
            });
        }

        if let Some(missing) = spec.mandatory.difference(&spec.known).next() {
            return Err(ConstraintsError::MandatoryNotKnown(missing.clone()));
        }

        Ok(Self {
            keystone_size:    spec.keystone_size,
            icon_max_size:    spec.icon_max_size,
            icon_format:      spec.icon_format,
            mandatory:        spec.mandatory,
            known:            spec.known,
            min_blocks:       spec.min_blocks,
            max_blocks:       spec.max_blocks,
            min_bytes,
            max_bytes,
            max_path_len:     spec.max_path_len,
            max_filename_len: spec.max_filename_len,
            sys_file_max:     spec.sys_file_max,
            max_files:        spec.max_files,
        })
    }

    pub fn keystone_size(&self)    -> u64 { self.keystone_size }
    pub fn icon_max_size(&self)    -> u64 { self.icon_max_size }
    pub fn icon_format(&self)      -> PixelFormat { self.icon_format }
    pub fn mandatory(&self)        -> &BTreeSet<String> { &self.mandatory }
    pub fn known(&self)            -> &BTreeSet<String> { &self.known }
    pub fn min_blocks(&self)       -> u64 { self.min_blocks }
    pub fn max_blocks(&self)       -> u64 { self.max_blocks }
    pub fn min_save_bytes(&self)   -> u64 { self.min_bytes }
    pub fn max_save_bytes(&self)   -> u64 { self.max_bytes }
    pub fn max_path_len(&self)     -> usize { self.max_path_len }
    pub fn max_filename_len(&self) -> usize { self.max_filename_len }
    pub fn sys_file_max(&self)     -> u64 { self.sys_file_max }
    pub fn max_files(&self)        -> usize { self.max_files }

    pub fn min_save_megabytes(&self) -> String { size::format_megabytes(self.min_bytes) }
    pub fn max_save_megabytes(&self) -> String { size::format_megabytes(self.max_bytes) }

    pub fn is_known(&self, name: &str)     -> bool { self.known.contains(name) }
    pub fn is_mandatory(&self, name: &str) -> bool { self.mandatory.contains(name) }
}

impl Default for SaveLayoutConstraints {
    fn default() -> Self {
        // The platform values are fixed and consistent; a failure here is a
        // broken constant, not bad input.
        Self::new(ConstraintsSpec::default())
            .unwrap_or_else(|e| panic!("platform constraints are inconsistent: {e}"))
    }
}

fn to_signed(blocks: u64) -> Result<i64, SizeError> {
    i64::try_from(blocks).map_err(|_| SizeError::Overflow { what: "blocks", value: i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_defaults() {
        let c = SaveLayoutConstraints::default();
        assert_eq!(c.keystone_size(), 0x60);
        assert_eq!(c.min_save_bytes(), 0x60 * 32768);
        assert_eq!(c.max_save_bytes(), 1 << 30);
        assert_eq!(c.min_save_megabytes(), "3.00 MB");
        assert_eq!(c.max_save_megabytes(), "1024.00 MB");
        assert!(c.is_mandatory("keystone"));
        assert!(c.is_known("sce_icon0png9"));
        assert!(c.is_known("param.sfo"));
        assert!(!c.is_known("sce_icon0png10"));
        assert_eq!(c.known().len(), 23);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let spec = ConstraintsSpec { min_blocks: 10, max_blocks: 9, ..Default::default() };
        assert_eq!(
            SaveLayoutConstraints::new(spec).unwrap_err(),
            ConstraintsError::InvertedSizeBounds { min: 10, max: 9 },
        );
    }

    #[test]
    fn mandatory_member_must_be_known() {
        let mut spec = ConstraintsSpec::default();
        spec.known.remove(KEYSTONE_NAME);
        assert_eq!(
            SaveLayoutConstraints::new(spec).unwrap_err(),
            ConstraintsError::MandatoryNotKnown("keystone".into()),
        );
    }
}
