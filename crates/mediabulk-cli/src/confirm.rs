//! Interactive confirmation of run parameters.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Only an explicit yes proceeds; anything else (including EOF) declines.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Print `prompt` and read one answer line from stdin.
pub async fn confirm(prompt: &str) -> Result<bool> {
    println!("{prompt}");

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("cannot read confirmation answer from stdin")?;
    Ok(is_affirmative(&answer))
}
