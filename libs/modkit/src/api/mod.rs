//! HTTP helpers shared by every REST module.

pub mod envelope;
pub mod extract;
pub mod response;
