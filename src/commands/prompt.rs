use anyhow::{bail, Result};
use std::io::{BufRead, Write};

/// Reads one answer line. Returns `None` at end of input.
fn read_answer<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Asks a yes/no question; an empty answer picks `default`.
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
    default: bool,
) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    loop {
        write!(out, "{} {} ", question, hint)?;
        out.flush()?;

        let answer = match read_answer(input)? {
            Some(a) => a,
            None => return Ok(default),
        };
        match answer.to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(out, "Please answer y or n.")?,
        }
    }
}

/// Asks until a non-empty answer is given.
pub fn required<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<String> {
    loop {
        write!(out, "{}: ", label)?;
        out.flush()?;

        match read_answer(input)? {
            None => bail!("{} is required", label),
            Some(a) if a.is_empty() => continue,
            Some(a) => return Ok(a),
        }
    }
}

/// Asks once; an empty answer or end of input yields an empty string.
pub fn optional<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<String> {
    write!(out, "{}: ", label)?;
    out.flush()?;
    Ok(read_answer(input)?.unwrap_or_default())
}
