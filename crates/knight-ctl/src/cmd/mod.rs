//! CLI command modules.

pub mod keygen;
pub mod transfer;
