//! Save-size arithmetic: allocation blocks, bytes, megabytes and timeouts.
//!
//! The platform measures savegame capacity in allocation blocks of
//! [`BLOCK_SIZE`] bytes.  Every function here is pure and total over
//! non-negative input.  A negative argument is a caller bug and comes back as
//! [`SizeError::InvalidArgument`]; results that would not fit in a `u64` come
//! back as [`SizeError::Overflow`].
//!
//! # Rounding
//! Megabytes are binary (2^20 bytes).  [`bytes_to_megabytes`] rounds half away
//! from zero to [`MEGABYTE_DECIMALS`] places and [`format_megabytes`] prints
//! exactly that many places, so every size shown to a user goes through the
//! same policy.

use thiserror::Error;

/// Bytes per allocation block (2^15).
pub const BLOCK_SIZE: u64 = 1 << 15;
/// Bytes per megabyte (2^20).
pub const MEGABYTE: u64 = 1 << 20;
/// Decimal places kept when reporting megabytes.
pub const MEGABYTE_DECIMALS: i32 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("Invalid argument: {what} must be non-negative, got {value}")]
    InvalidArgument { what: &'static str, value: i64 },
    #[error("Overflow converting {value} {what}")]
    Overflow { what: &'static str, value: i64 },
}

fn non_negative(what: &'static str, value: i64) -> Result<u64, SizeError> {
    u64::try_from(value).map_err(|_| SizeError::InvalidArgument { what, value })
}

fn scale(what: &'static str, value: i64, factor: u64) -> Result<u64, SizeError> {
    non_negative(what, value)?
        .checked_mul(factor)
        .ok_or(SizeError::Overflow { what, value })
}

// ── Conversions ──────────────────────────────────────────────────────────────

/// `blocks * 2^15`.
pub fn blocks_to_bytes(blocks: i64) -> Result<u64, SizeError> {
    scale("blocks", blocks, BLOCK_SIZE)
}

/// Number of blocks needed to hold `bytes`, rounded up.
pub fn bytes_to_blocks(bytes: i64) -> Result<u64, SizeError> {
    Ok(non_negative("bytes", bytes)?.div_ceil(BLOCK_SIZE))
}

/// Bytes expressed in megabytes, rounded to [`MEGABYTE_DECIMALS`] places.
pub fn bytes_to_megabytes(bytes: i64) -> Result<f64, SizeError> {
    let bytes = non_negative("bytes", bytes)?;
    Ok(round_megabytes(bytes as f64 / MEGABYTE as f64))
}

pub fn megabytes_to_bytes(megabytes: i64) -> Result<u64, SizeError> {
    scale("megabytes", megabytes, MEGABYTE)
}

pub fn minutes_to_seconds(minutes: i64) -> Result<u64, SizeError> {
    scale("minutes", minutes, 60)
}

/// Human-readable megabyte figure, e.g. `"3.00 MB"`.
pub fn format_megabytes(bytes: u64) -> String {
    let mb = round_megabytes(bytes as f64 / MEGABYTE as f64);
    format!("{mb:.prec$} MB", prec = MEGABYTE_DECIMALS as usize)
}

fn round_megabytes(mb: f64) -> f64 {
    let factor = 10f64.powi(MEGABYTE_DECIMALS);
    (mb * factor).round() / factor
}
