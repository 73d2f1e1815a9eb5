//! Prints an argon2 hash for `auth.hr_password_hash`.
//!
//! Usage: `hash_password <password>`, or pipe the password on stdin.

use anyhow::{bail, Context};
use std::io::BufRead;

fn main() -> anyhow::Result<()> {
    let password = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        bail!("password must not be empty");
    }

    let hash = common::domain::password::hash_password(&password)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {}", e))?;
    println!("{}", hash);
    Ok(())
}
