//! seal command - seal a value against a public key
//!
//! Works offline; useful for checking a key or producing a value for
//! another tool.

use anyhow::Result;

use super::value_or_stdin;
use crate::seal;

/// Seal a value and print the base64 result.
pub fn seal(key: &str, value: Option<String>) -> Result<()> {
    let recipient = seal::decode_public_key(key)?;
    let value = value_or_stdin(value)?;
    println!("{}", seal::seal(&recipient, value.as_bytes())?);
    Ok(())
}
