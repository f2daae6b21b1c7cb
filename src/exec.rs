//! Subprocess plumbing shared by the ffmpeg and TTS steps.

use std::process::{Command, Stdio};

use anyhow::{anyhow, bail, Context, Result};

/// Runs a tool to completion, discarding stdout. Failures carry the tail of
/// stderr so encoder errors stay readable.
pub fn run_tool(program: &str, args: &[String]) -> Result<()> {
    let output = Command::new(program)
        .args(args.iter().map(String::as_str))
        .stdin(Stdio::null())
        .output()
        .map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                anyhow!("{program} executable not found. Install it and retry.")
            } else {
                anyhow!(
                    "failed to spawn {program} (args='{}'): {error}",
                    args.join(" ")
                )
            }
        })?;

    if !output.status.success() {
        let stderr_tail = last_n_chars(&String::from_utf8_lossy(&output.stderr), 500);
        bail!(
            "{program} failed with status {} (args='{}', stderr_tail='{}')",
            output.status,
            args.join(" "),
            stderr_tail
        );
    }
    Ok(())
}

/// Runs a tool and returns its stdout as text.
pub fn run_tool_capture(program: &str, args: &[String]) -> Result<String> {
    let output = Command::new(program)
        .args(args.iter().map(String::as_str))
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to spawn {program}"))?;

    if !output.status.success() {
        let stderr_tail = last_n_chars(&String::from_utf8_lossy(&output.stderr), 500);
        bail!(
            "{program} failed with status {} (stderr_tail='{}')",
            output.status,
            stderr_tail
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Availability probe: does `program probe_arg` exit successfully?
pub fn tool_available(program: &str, probe_arg: &str) -> bool {
    Command::new(program)
        .arg(probe_arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

pub fn last_n_chars(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars().collect::<Vec<_>>();
    if chars.len() > max_chars {
        chars = chars[chars.len().saturating_sub(max_chars)..].to_vec();
    }
    chars.into_iter().collect::<String>().trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::last_n_chars;

    #[test]
    fn stderr_tail_is_trimmed_and_bounded() {
        assert_eq!(last_n_chars("  hello  ", 100), "hello");
        assert_eq!(last_n_chars("abcdef", 3), "def");
        assert_eq!(last_n_chars("", 3), "");
    }
}
