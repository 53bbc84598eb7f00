//! Versioned request and response shapes for the HTTP surface.
//!
//! Entities never cross the API boundary directly; each version maps them
//! explicitly so storage changes do not leak into clients.

pub mod v1;
