//! Human-readable size strings ("10M", "2k", "1G") to byte counts.
//!
//! Multipliers are binary and compound: each suffix step is 1024x the next
//! smaller one, so "1G" is 1024 * 1024 * 1024 bytes. A bare number is already
//! in bytes.

use crate::error::UploadError;

const KIB: u64 = 1024;

/// Parse a size string into bytes.
///
/// Whitespace is trimmed before parsing. Empty or otherwise malformed input is
/// a hard configuration error, never coerced to zero.
pub fn parse_size(s: &str) -> Result<u64, UploadError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(UploadError::InvalidConfiguration(
            "size string is empty".to_string(),
        ));
    }

    let (digits, multiplier) = match trimmed.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => {
            let multiplier = match c.to_ascii_lowercase() {
                'k' => KIB,
                'm' => KIB * KIB,
                'g' => KIB * KIB * KIB,
                other => {
                    return Err(UploadError::InvalidConfiguration(format!(
                        "unknown size suffix '{}' in '{}'",
                        other, trimmed
                    )));
                }
            };
            (&trimmed[..trimmed.len() - 1], multiplier)
        }
        _ => (trimmed, 1),
    };

    let value: u64 = digits.trim().parse().map_err(|_| {
        UploadError::InvalidConfiguration(format!("invalid size string '{}'", trimmed))
    })?;

    value.checked_mul(multiplier).ok_or_else(|| {
        UploadError::InvalidConfiguration(format!("size '{}' overflows u64", trimmed))
    })
}
