//! `ttx verify-trail`.

use anyhow::{bail, Result};
use ttx_provenance::{verify_trail, TrailVerdict};

pub fn verify(path: &str) -> Result<()> {
    match verify_trail(path)? {
        TrailVerdict::Valid { lines } => {
            println!("trail_valid=true lines={}", lines);
            Ok(())
        }
        TrailVerdict::Broken { line, reason } => {
            bail!("trail broken at line {}: {}", line, reason)
        }
    }
}
