//! Running external extractor tools.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::classify::{classify_failure, classify_spawn_error};
use super::error::BackendError;

/// Append the URL after `--`, so a URL starting with `-` is never read as an option.
pub fn push_url(args: &mut Vec<OsString>, url: &str) {
    args.push("--".into());
    args.push(url.into());
}

/// Run `program` to completion and return its stdout.
///
/// The child is killed if the returned future is dropped, so an outer
/// timeout terminates the tool.
pub async fn run_tool(program: &Path, args: &[OsString]) -> Result<Vec<u8>, BackendError> {
    let tool = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());
    debug!("Running {} with {} args", tool, args.len());

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| classify_spawn_error(program, e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(
            "{} exited with {:?}: {}",
            tool,
            output.status.code(),
            stderr.trim()
        );
        Err(classify_failure(&tool, &stderr))
    }
}
