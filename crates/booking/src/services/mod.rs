//! Clients for the platform services the booking core collaborates with.

pub mod directory;
pub mod notify;
