//! Built-in command set
//!
//! Each submodule registers one category. Handlers resolve paths against the
//! session, call into [`crate::engine`], and report through the console.

mod compress;
mod files;
mod hash;
mod nav;
mod os;
mod search;
mod utility;

use crate::error::{FmshError, FmshResult};
use crate::registry::CommandRegistry;

/// Register every built-in command and alias.
///
/// A failing alias means a wiring mistake, so callers treat the error as fatal.
pub fn register_builtins(registry: &mut CommandRegistry) -> FmshResult<()> {
    nav::register(registry)?;
    files::register(registry)?;
    search::register(registry)?;
    hash::register(registry)?;
    compress::register(registry)?;
    os::register(registry)?;
    utility::register(registry)?;
    tracing::debug!(commands = registry.len(), "Registered built-in commands");
    Ok(())
}

fn register_aliases(registry: &mut CommandRegistry, target: &str, aliases: &[&str]) -> FmshResult<()> {
    for alias in aliases {
        registry.register_alias(alias, target)?;
    }
    Ok(())
}

/// Positional argument `index`, or [`FmshError::MissingArgument`] naming it.
fn arg<'a>(args: &'a [String], index: usize, name: &'static str) -> FmshResult<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or(FmshError::MissingArgument(name))
}

/// Remove boolean switches such as `-r` or `--recursive` from `args`.
///
/// Switches are pulled out before positional parsing so a short switch never
/// swallows the following path as its value.
fn take_switch(args: &[String], names: &[&str]) -> (bool, Vec<String>) {
    let is_switch = |a: &str| {
        names.iter().any(|n| {
            let dashes = if n.chars().count() == 1 { "-" } else { "--" };
            a.strip_prefix(dashes) == Some(*n)
        })
    };
    let found = args.iter().any(|a| is_switch(a));
    let rest = args.iter().filter(|a| !is_switch(a)).cloned().collect();
    (found, rest)
}
