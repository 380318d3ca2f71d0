//! Argon2 parameter negotiation
//!
//! On first run the user picks the derivation cost; an empty answer keeps
//! the default for that field.

use std::io::{BufRead, Write};

use crate::crypto::key_derivation::{default_threads, DEFAULT_ITERATIONS, DEFAULT_MEMORY};
use crate::crypto::Argon2Params;
use crate::error::{LockboxError, LockboxResult};

use super::prompt::Prompt;

/// Ask for iterations, memory and threads, in that order
///
/// Stops at the first answer that is not a `u32`; later fields are not
/// asked for.
pub fn ask_parameters<R: BufRead, W: Write>(prompt: &mut Prompt<R, W>) -> LockboxResult<Argon2Params> {
    prompt.say("Set the Argon2id key derivation cost (leave empty for the default).")?;

    let iterations = ask_field(
        prompt,
        "iterations",
        "Number of iterations",
        DEFAULT_ITERATIONS,
    )?;
    let memory = ask_field(prompt, "memory", "Memory usage in KiB", DEFAULT_MEMORY)?;
    let threads = ask_field(prompt, "threads", "Number of threads", default_threads())?;

    Ok(Argon2Params::new(iterations, memory, threads))
}

fn ask_field<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    field: &'static str,
    label: &str,
    default: u32,
) -> LockboxResult<u32> {
    let answer = prompt.line(&format!("{} [{}]", label, default))?;
    if answer.is_empty() {
        return Ok(default);
    }

    answer
        .parse::<u32>()
        .map_err(|_| LockboxError::invalid_parameter(field, answer))
}
