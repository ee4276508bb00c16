pub mod api_client;
pub mod config;
pub mod corosync;
pub mod pve_api;
