//! `votefleet version` — version information.

use anyhow::Result;

/// Print the version line.
///
/// # Errors
///
/// Never fails; `Result` keeps the command signature uniform.
pub fn run() -> Result<()> {
    println!("votefleet {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
