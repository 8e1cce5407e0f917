//! Structural validation of a [`CandidateSaveLayout`].
//!
//! Validation never fails as a Rust `Err`: every data-driven outcome lands in
//! the returned [`ValidationResult`] and the caller decides whether to reject
//! the save or prompt the user.  Checks run in a fixed order, so the
//! violation list is deterministic for a given layout.
//!
//! | Check | Outcome |
//! |-------|---------|
//! | mandatory members present | [`ViolationCode::MissingMandatoryMember`] per missing name |
//! | members outside the known set | [`Warning::UnexpectedMember`] (non-fatal) |
//! | save size in blocks within `[min, max]` | [`ViolationCode::SizeOutOfRange`] |
//! | icon size / pixel format | [`ViolationCode::SizeOutOfRange`] / [`ViolationCode::FormatMismatch`] |
//! | keystone exact size, metadata member size | [`ViolationCode::SizeOutOfRange`] |
//! | user file paths and count | `PathTooLong`, `FilenameTooLong`, `TooManyFiles` |

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::constraints::{SaveLayoutConstraints, ICON0_NAME, KEYSTONE_NAME, SCE_SYS_NAME};
use crate::layout::CandidateSaveLayout;
use crate::size::{self, BLOCK_SIZE};

// ── Result types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolationCode {
    MissingMandatoryMember,
    SizeOutOfRange,
    FormatMismatch,
    PathTooLong,
    FilenameTooLong,
    TooManyFiles,
}

/// One blocking problem: what kind, which member or path, and the numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub code:    ViolationCode,
    pub subject: String,
    pub detail:  String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} [{}]: {}", self.code, self.subject, self.detail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// A metadata member the platform does not list.  Later title updates
    /// can add members, so this never blocks.
    UnexpectedMember(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnexpectedMember(name) => write!(f, "unexpected member {SCE_SYS_NAME}/{name}"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub violations: Vec<Violation>,
    pub warnings:   Vec<Warning>,
}

impl ValidationResult {
    pub fn passed(&self) -> bool { self.violations.is_empty() }

    pub fn has(&self, code: ViolationCode) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }

    pub fn subjects(&self, code: ViolationCode) -> Vec<&str> {
        self.violations.iter().filter(|v| v.code == code).map(|v| v.subject.as_str()).collect()
    }

    fn violate(&mut self, code: ViolationCode, subject: impl Into<String>, detail: String) {
        let v = Violation { code, subject: subject.into(), detail };
        tracing::debug!(violation = %v, "layout check failed");
        self.violations.push(v);
    }
}

// ── validate ─────────────────────────────────────────────────────────────────

pub fn validate(layout: &CandidateSaveLayout, constraints: &SaveLayoutConstraints) -> ValidationResult {
    let mut result = ValidationResult::default();
    let present: BTreeSet<&str> = layout.members.iter().map(|m| m.name.as_str()).collect();

    for missing in constraints.mandatory().iter().filter(|m| !present.contains(m.as_str())) {
        result.violate(
            ViolationCode::MissingMandatoryMember,
            missing.as_str(),
            format!("{SCE_SYS_NAME}/{missing} is required"),
        );
    }

    for name in present.iter().filter(|n| !constraints.is_known(n)) {
        tracing::debug!(member = name, "unexpected metadata member");
        result.warnings.push(Warning::UnexpectedMember((*name).to_owned()));
    }

    check_save_size(layout, constraints, &mut result);
    check_members(layout, constraints, &mut result);
    check_user_files(layout, constraints, &mut result);

    result
}

fn check_save_size(layout: &CandidateSaveLayout, c: &SaveLayoutConstraints, result: &mut ValidationResult) {
    let blocks = layout.declared_size.div_ceil(BLOCK_SIZE);
    if !(c.min_blocks()..=c.max_blocks()).contains(&blocks) {
        result.violate(
            ViolationCode::SizeOutOfRange,
            "savegame",
            format!(
                "{} blocks ({}) outside {}..={} blocks ({} to {})",
                blocks,
                size::format_megabytes(layout.declared_size),
                c.min_blocks(),
                c.max_blocks(),
                c.min_save_megabytes(),
                c.max_save_megabytes(),
            ),
        );
    }
}

fn check_members(layout: &CandidateSaveLayout, c: &SaveLayoutConstraints, result: &mut ValidationResult) {
    for member in &layout.members {
        if member.name == ICON0_NAME {
            if member.size > c.icon_max_size() {
                result.violate(
                    ViolationCode::SizeOutOfRange,
                    ICON0_NAME,
                    format!("{} bytes exceeds icon limit of {} bytes", member.size, c.icon_max_size()),
                );
            }
            if let Some(format) = member.pixel_format.filter(|f| *f != c.icon_format()) {
                result.violate(
                    ViolationCode::FormatMismatch,
                    ICON0_NAME,
                    format!("{format} pixels, expected {}", c.icon_format()),
                );
            }
        } else if member.name == KEYSTONE_NAME && member.size != c.keystone_size() {
            result.violate(
                ViolationCode::SizeOutOfRange,
                KEYSTONE_NAME,
                format!("{} bytes, expected exactly {}", member.size, c.keystone_size()),
            );
        } else if member.size > c.sys_file_max() {
            result.violate(
                ViolationCode::SizeOutOfRange,
                member.name.as_str(),
                format!("{} exceeds metadata member limit of {}",
                    size::format_megabytes(member.size),
                    size::format_megabytes(c.sys_file_max())),
            );
        }
    }
}

fn check_user_files(layout: &CandidateSaveLayout, c: &SaveLayoutConstraints, result: &mut ValidationResult) {
    if layout.user_files.len() > c.max_files() {
        result.violate(
            ViolationCode::TooManyFiles,
            "savegame",
            format!("{} files, limit is {}", layout.user_files.len(), c.max_files()),
        );
    }
    for path in &layout.user_files {
        if path.len() > c.max_path_len() {
            result.violate(
                ViolationCode::PathTooLong,
                path.as_str(),
                format!("{} bytes, limit is {}", path.len(), c.max_path_len()),
            );
        }
        let file_name = path.rsplit('/').next().unwrap_or(path);
        if file_name.len() > c.max_filename_len() {
            result.violate(
                ViolationCode::FilenameTooLong,
                path.as_str(),
                format!("file name is {} bytes, limit is {}", file_name.len(), c.max_filename_len()),
            );
        }
    }
}
