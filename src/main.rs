//! `pix-rs` command-line entrypoint.
//!
//! Commands:
//! - `generate` – Print a payload for the configured merchant
//! - `verify` – Check the trailing checksum of a payload
//! - `decode` – Verify a payload and print its fields as JSON
//! - `charge` – Issue a charge with render URL and expiry
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` points at a JSON config file
//! - `PIX_KEY`, `PIX_MERCHANT_NAME`, `PIX_MERCHANT_CITY`, `PIX_EXPIRATION_MINUTES`,
//!   `PIX_QR_RENDERER_URL` fill in what the config file leaves out
//! - `RUST_LOG`, `LOG_FORMAT` control logging

use std::process;

use pix_rs::run;

fn main() {
    let result = run();
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
