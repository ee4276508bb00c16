//! Serde helpers for the loosely typed fields of the Proxmox VE API.
//!
//! The API encodes booleans as `0`/`1` and, depending on the endpoint and
//! version, VMIDs either as numbers or as strings.

use serde::{Deserialize, Deserializer, de};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Deserialize a boolean encoded as `0`/`1`, `true`/`false` or a string of either.
pub mod int_bool {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Loose::deserialize(deserializer)? {
            Loose::Bool(value) => Ok(value),
            Loose::Int(value) => Ok(value != 0),
            Loose::Str(value) => match value.as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" | "" => Ok(false),
                other => Err(de::Error::custom(format!("invalid boolean '{}'", other))),
            },
        }
    }
}

/// Deserialize a VMID given either as a number or as a numeric string.
pub mod vmid {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Loose::deserialize(deserializer)? {
            Loose::Int(value) => u32::try_from(value)
                .map_err(|_| de::Error::custom(format!("VMID {} out of range", value))),
            Loose::Str(value) => value
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid VMID '{}'", value))),
            Loose::Bool(_) => Err(de::Error::custom("VMID cannot be a boolean")),
        }
    }
}
