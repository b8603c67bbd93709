// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{bail, Context, Result};

/// One step of a scripted button session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Momentary press on the line with this identity (1..=5).
    Press(u8),
    /// Pause for this many milliseconds before the next step.
    Wait(u64),
}

/// Parse a stimulus script: one directive per line, `#` comments, blank
/// lines ignored.
///
/// ```text
/// # replay for the coalescing demo
/// press 3
/// wait 250
/// press 5
/// ```
pub fn parse(script: &str) -> Result<Vec<Directive>> {
    let mut directives = Vec::new();
    for (lineno, raw) in script.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or("");
        let arg = parts.next();
        if parts.next().is_some() {
            bail!("line {}: trailing tokens after '{}'", lineno + 1, verb);
        }

        match (verb, arg) {
            ("press", Some(arg)) => {
                let id: u8 = arg
                    .parse()
                    .with_context(|| format!("line {}: bad line id '{}'", lineno + 1, arg))?;
                if !(1..=5).contains(&id) {
                    bail!("line {}: line id {} outside 1..=5", lineno + 1, id);
                }
                directives.push(Directive::Press(id));
            }
            ("wait", Some(arg)) => {
                let ms: u64 = arg
                    .parse()
                    .with_context(|| format!("line {}: bad duration '{}'", lineno + 1, arg))?;
                directives.push(Directive::Wait(ms));
            }
            _ => bail!("line {}: unrecognized directive '{}'", lineno + 1, line),
        }
    }
    Ok(directives)
}
