use std::io::{self, IsTerminal};

use anyhow::Result;
use dialoguer::{Confirm, Select};

/// Whether prompts can be shown at all.
pub fn is_interactive() -> bool {
  io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Ask a yes/no question. Dismissing the prompt counts as "no".
pub fn confirm(message: &str, assume_yes: bool) -> Result<bool> {
  if assume_yes {
    return Ok(true);
  }

  if !is_interactive() {
    return Ok(false);
  }

  let answer = Confirm::new().with_prompt(message).default(false).interact_opt()?;
  Ok(answer.unwrap_or(false))
}

/// Pick one of `items`. `None` when dismissed with Esc or `q`.
pub fn select(prompt: &str, items: &[String]) -> Result<Option<usize>> {
  let index = Select::new().with_prompt(prompt).items(items).default(0).interact_opt()?;
  Ok(index)
}
