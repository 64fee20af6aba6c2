use std::io::BufRead;

use anyhow::{Context, Result, bail};
use dialoguer::{Confirm, Input, Password};

/// Uses `given` when present, otherwise asks for it.
pub fn text(label: &str, given: Option<String>) -> Result<String> {
    match given {
        Some(value) => Ok(value),
        None => Ok(Input::<String>::new().with_prompt(label).interact_text()?),
    }
}

/// Reads a password from stdin or a hidden prompt. `confirm` asks twice.
pub fn password(from_stdin: bool, confirm: bool) -> Result<String> {
    if from_stdin {
        return read_first_line(std::io::stdin().lock());
    }

    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

pub fn confirm(question: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(question).default(false).interact()?)
}

fn read_first_line(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("no password given on stdin");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdin_password_drops_the_line_ending() {
        let pw = read_first_line("s3cret pass\r\nignored\n".as_bytes()).unwrap();
        assert_eq!(pw, "s3cret pass");
    }

    #[test]
    fn empty_stdin_is_an_error() {
        assert!(read_first_line("".as_bytes()).is_err());
    }

    #[test]
    fn given_values_skip_the_prompt() {
        assert_eq!(text("Username", Some("alice".into())).unwrap(), "alice");
    }
}
