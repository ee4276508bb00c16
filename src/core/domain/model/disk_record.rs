//! Disk records: one guest disk backed by a storage volume.
//!
//! Disk slots are recognized by name (`scsi0`, `virtio1`, `ide2`, `sata3` for
//! QEMU, `rootfs` and `mp0..` for LXC). Their descriptor has the form
//! `storage:volume[,key=value...]` and must carry a `size=` option.

use crate::core::domain::{
    error::ValidationError,
    model::guest::{Guest, GuestType},
    value_object::DiskSize,
};
use std::cmp::Ordering;

const QEMU_DISK_BUSES: [&str; 4] = ["scsi", "virtio", "ide", "sata"];
const LXC_ROOTFS: &str = "rootfs";
const LXC_MOUNT_POINT: &str = "mp";

/// A single guest disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskRecord {
    pub vmid: u32,
    pub guest_type: GuestType,
    pub node: String,
    pub guest_name: Option<String>,
    /// Configuration key, e.g. `scsi0` or `mp1`.
    pub slot: String,
    /// Backing storage id.
    pub storage: String,
    /// Volume name on the storage.
    pub volume: String,
    pub size: DiskSize,
    /// Image format (`raw`, `qcow2`, `vmdk`) where known.
    pub format: Option<String>,
}

impl DiskRecord {
    /// Parses a configuration entry of `guest` into a disk record.
    ///
    /// Fails for entries that are not disks (CD-ROMs, bind mounts, pass-through
    /// devices) or whose descriptor is malformed.
    pub fn parse(guest: &Guest, slot: &str, descriptor: &str) -> Result<Self, ValidationError> {
        let mut parts = descriptor.split(',').map(str::trim);
        let volume_spec = parts.next().unwrap_or_default();
        let volume_spec = volume_spec
            .strip_prefix("volume=")
            .or_else(|| volume_spec.strip_prefix("file="))
            .unwrap_or(volume_spec);

        let mut size = None;
        let mut format = None;
        for option in parts {
            match option.split_once('=') {
                Some(("media", "cdrom")) => {
                    return Err(ValidationError::ConstraintViolation(format!(
                        "{} is a CD-ROM drive",
                        slot
                    )));
                }
                Some(("size", value)) => size = Some(value),
                Some(("format", value)) => format = Some(value.to_string()),
                _ => {}
            }
        }

        let (storage, volume) = volume_spec
            .split_once(':')
            .filter(|(storage, volume)| !storage.is_empty() && !volume.is_empty())
            .ok_or_else(|| {
                ValidationError::Format(format!(
                    "{} is not backed by a storage volume: '{}'",
                    slot, volume_spec
                ))
            })?;

        let size = size.ok_or_else(|| ValidationError::Field {
            field: "size".to_string(),
            message: format!("{} has no size", slot),
        })?;
        let size = DiskSize::parse(size)?;

        Ok(Self {
            vmid: guest.vmid,
            guest_type: guest.guest_type,
            node: guest.node.clone(),
            guest_name: guest.name.clone(),
            slot: slot.to_string(),
            storage: storage.to_string(),
            volume: volume.to_string(),
            size,
            format: format.or_else(|| format_from_volume(volume)),
        })
    }

    /// Display name of the owning guest, empty when it has none.
    #[must_use]
    pub fn guest_name(&self) -> &str {
        self.guest_name.as_deref().unwrap_or_default()
    }
}

fn format_from_volume(volume: &str) -> Option<String> {
    let (_, extension) = volume.rsplit_once('.')?;
    matches!(extension, "qcow2" | "raw" | "vmdk").then(|| extension.to_string())
}

/// Splits `scsi12` into `("scsi", Some(12))`.
fn split_slot(slot: &str) -> (&str, Option<u32>) {
    let digits = slot.len() - slot.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (prefix, index) = slot.split_at(slot.len() - digits);
    (prefix, index.parse().ok())
}

/// Returns `true` if `key` names a disk slot for the given guest type.
#[must_use]
pub fn is_disk_slot(guest_type: GuestType, key: &str) -> bool {
    let (prefix, index) = split_slot(key);
    match guest_type {
        GuestType::Qemu => index.is_some() && QEMU_DISK_BUSES.contains(&prefix),
        GuestType::Lxc => key == LXC_ROOTFS || (index.is_some() && prefix == LXC_MOUNT_POINT),
    }
}

/// Orders slots `rootfs` first, then by prefix, then by numeric index.
#[must_use]
pub fn compare_slots(a: &str, b: &str) -> Ordering {
    let rank = |slot: &str| {
        let (prefix, index) = split_slot(slot);
        (slot != LXC_ROOTFS, prefix.to_string(), index)
    };
    rank(a).cmp(&rank(b))
}
