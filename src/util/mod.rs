//! Shared filesystem and checksum helpers.

pub mod checksum;
pub mod fs;
