use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

/// Requires the operator to type an explicit word rather than accepting a
/// bare `y`.
pub fn confirm_destroy(count: usize) -> Result<bool> {
    print!("This will destroy {count} resource(s). Type 'destroy' to confirm: ");
    io::stdout().flush().context("flush stdout")?;

    let line = io::stdin()
        .lock()
        .lines()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no input"))??;

    Ok(line.trim() == "destroy")
}
