use std::process::{Command, Stdio};

use crate::error::{PlotError, PlotResult};

/// Expands `{placeholder}` markers in a command template.
///
/// Unused substitutions are allowed (a template does not have to mention
/// every placeholder), but no `{...}` marker may remain afterwards, so a
/// typo in a template fails loudly instead of being handed to the shell.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> PlotResult<String> {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    if let Some(start) = out.find('{')
        && let Some(end) = out[start..].find('}')
    {
        return Err(PlotError::validation(format!(
            "command template has an unexpanded placeholder '{}'",
            &out[start..=start + end]
        )));
    }
    Ok(out)
}

/// Blocking invocation of an external decoder/encoder command line.
///
/// Implementations must return [`PlotError::Process`] for a non-zero exit
/// status. Tests substitute counting/faking runners through this seam.
pub trait CommandRunner: Send + Sync {
    fn run(&self, cmd: &str) -> PlotResult<()>;
}

/// Runs command lines through `sh -c`, blocking until the process exits.
///
/// The templates use shell quoting and `%04d` patterns, so the line is
/// handed to the shell as-is rather than being tokenized here.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, cmd: &str) -> PlotResult<()> {
        tracing::debug!(%cmd, "executing");
        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| PlotError::process(format!("failed to spawn '{cmd}': {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlotError::process(format!(
                "'{cmd}' exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Whether the system `ffmpeg` binary is available.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_template_substitutes_all_vars() {
        let cmd = fill_template(
            "ffmpeg -i {video_path} {output_path}",
            &[("video_path", "/v/a.mp4"), ("output_path", "/t/out")],
        )
        .unwrap();
        assert_eq!(cmd, "ffmpeg -i /v/a.mp4 /t/out");
    }

    #[test]
    fn fill_template_ignores_unused_vars() {
        let cmd = fill_template(
            "ffmpeg -i {video_path}",
            &[("video_path", "/v/a.mp4"), ("frame_index", "3")],
        )
        .unwrap();
        assert_eq!(cmd, "ffmpeg -i /v/a.mp4");
    }

    #[test]
    fn fill_template_rejects_leftover_placeholder() {
        let err = fill_template(
            "ffmpeg -i {video_path} {output_path}",
            &[("video_path", "/v/a.mp4")],
        );
        assert!(err.is_err());
    }

    #[test]
    fn shell_runner_reports_nonzero_exit() {
        let err = ShellRunner.run("exit 3").unwrap_err();
        assert!(matches!(err, PlotError::Process(_)));
    }

    #[test]
    fn shell_runner_accepts_success() {
        assert!(ShellRunner.run("true").is_ok());
    }
}
