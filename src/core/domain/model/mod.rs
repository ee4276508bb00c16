pub mod cluster;
pub mod disk_record;
pub mod guest;
pub mod inventory;
pub mod network;
pub mod proxmox_auth;
pub mod proxmox_connection;
pub mod storage;
