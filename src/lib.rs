//! PIX charge issuing and the `pix-rs` command-line tool.
//!
//! The payload codec itself lives in [`pix_codec`]; this crate adds what a
//! deployment wraps around it.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`charge`] | Charge issuing: payload, render handle, random id, expiry |
//! | [`config`] | CLI arguments and the JSON/env configuration |
//! | [`render`] | Seam between a payload and its scannable image |
//! | [`run`] | Command dispatch for the binary |
//! | [`telemetry`] | Logging setup |
//! | [`timestamp`] | Unix timestamps for expiry |

pub mod charge;
pub mod config;
pub mod render;
pub mod run;
pub mod telemetry;
pub mod timestamp;

pub use pix_codec;
pub use run::run;
