use crate::core::domain::error::ValidationError;

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;
const TIB: u64 = GIB * 1024;

/// A disk size as written in a guest configuration (`size=32G`).
///
/// Suffixes are binary multiples (`K`, `M`, `G`, `T`, case insensitive);
/// a bare number is a byte count. Fractions are allowed (`1.5T`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskSize {
    raw: String,
    bytes: u64,
}

impl DiskSize {
    /// Parses a size value.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        let Some(last) = raw.chars().last() else {
            return Err(ValidationError::Field {
                field: "size".to_string(),
                message: "Size cannot be empty".to_string(),
            });
        };

        let (number, multiplier) = if last.is_ascii_digit() {
            (raw, 1)
        } else {
            let multiplier = match last.to_ascii_uppercase() {
                'K' => KIB,
                'M' => MIB,
                'G' => GIB,
                'T' => TIB,
                other => {
                    return Err(ValidationError::Format(format!(
                        "Unknown size unit '{}' in '{}'",
                        other, raw
                    )));
                }
            };
            (&raw[..raw.len() - last.len_utf8()], multiplier)
        };

        // digits with at most one decimal point, no sign or exponent
        let well_formed = number.chars().any(|c| c.is_ascii_digit())
            && number.chars().all(|c| c.is_ascii_digit() || c == '.')
            && number.matches('.').count() <= 1;
        if !well_formed {
            return Err(ValidationError::Format(format!("Invalid size '{}'", raw)));
        }

        let bytes = if number.contains('.') {
            let value: f64 = number
                .parse()
                .map_err(|_| ValidationError::Format(format!("Invalid size '{}'", raw)))?;
            let bytes = (value * multiplier as f64).round();
            if bytes >= u64::MAX as f64 {
                return Err(ValidationError::ConstraintViolation(format!(
                    "Size '{}' overflows",
                    raw
                )));
            }
            bytes as u64
        } else {
            let value: u64 = number
                .parse()
                .map_err(|_| ValidationError::Format(format!("Invalid size '{}'", raw)))?;
            value.checked_mul(multiplier).ok_or_else(|| {
                ValidationError::ConstraintViolation(format!("Size '{}' overflows", raw))
            })?
        };

        Ok(Self {
            raw: raw.to_string(),
            bytes,
        })
    }

    /// Returns the size as written in the configuration.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the size in bytes.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// Whole mebibytes in a byte count (rounded down).
#[must_use]
pub fn to_mebibytes(bytes: u64) -> u64 {
    bytes / MIB
}

/// Formats a byte count with a binary unit and one decimal place.
#[must_use]
pub fn humanize_bytes(bytes: u64) -> String {
    const UNITS: [(u64, &str); 4] = [(TIB, "TiB"), (GIB, "GiB"), (MIB, "MiB"), (KIB, "KiB")];
    UNITS
        .iter()
        .find(|(factor, _)| bytes >= *factor)
        .map(|(factor, unit)| format!("{:.1} {}", bytes as f64 / *factor as f64, unit))
        .unwrap_or_else(|| format!("{} B", bytes))
}
