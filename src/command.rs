//! Running the administrative commands.

use std::io::{Read, Write};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs `cmd` to completion and returns its standard output.
///
/// If `input` is given, it is written to the standard input of the command,
/// which is closed afterwards.
///
/// The command runs in its own process group. The group is killed if the
/// command has not exited after `timeout`, and once it has exited, so
/// nothing it started outlives it or holds its output open.
///
/// # Errors
///
/// Returns an error if the command can not be spawned, does not finish in
/// time, exits unsuccessfully or writes anything but UTF-8 to its standard
/// output.
pub fn run(
    mut cmd: Command,
    input: Option<&str>,
    timeout: Duration,
) -> Result<String> {
    cmd.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .process_group(0);

    debug!(command = ?cmd, "running");

    let mut child = cmd
        .spawn()
        .with_context(|| format!("error running: {cmd:?}"))?;

    if let Some(input) = input {
        if let Err(error) = feed(&mut child, input) {
            reap(&mut child);
            return Err(error.context(format!("writing input to: {cmd:?}")));
        }
    }

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let start = Instant::now();

    let status = loop {
        let status = child
            .try_wait()
            .with_context(|| format!("waiting for: {cmd:?}"))?;

        match status {
            Some(status) => {
                kill_group(&child);
                break status;
            }
            None if start.elapsed() >= timeout => {
                reap(&mut child);
                return Err(anyhow!("timed out after {timeout:?}: {cmd:?}"));
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    let stdout = collect(stdout)
        .with_context(|| format!("reading output of: {cmd:?}"))?;
    let stderr = collect(stderr).unwrap_or_default();

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr);
        return Err(anyhow!(
            "error running: {cmd:?}: {status}: {}",
            stderr.trim()
        ));
    }

    String::from_utf8(stdout)
        .with_context(|| format!("parsing {cmd:?} command output to UTF8"))
}

fn feed(child: &mut Child, input: &str) -> Result<()> {
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("no stdin handle"))?;

    stdin.write_all(input.as_bytes())?;

    Ok(())
}

fn reap(child: &mut Child) {
    kill_group(child);
    let _ = child.wait();
}

/// Kills the process group led by `child`.
fn kill_group(child: &Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };

    // SAFETY: plain syscall, no memory is shared. The group id can not be
    // reused while any member is alive.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        trace!(
            pgid,
            error = %std::io::Error::last_os_error(),
            "process group already gone"
        );
    }
}

fn drain<R>(mut reader: R) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(
    handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
) -> Result<Vec<u8>> {
    match handle {
        Some(handle) => {
            let buf = handle
                .join()
                .map_err(|_| anyhow!("output reader panicked"))??;
            Ok(buf)
        }
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn output() {
        let output = run(sh("echo foo; echo bar"), None, TIMEOUT).unwrap();
        assert_eq!(output, "foo\nbar\n");
    }

    #[test]
    fn input() {
        let output =
            run(Command::new("cat"), Some("once nlist add *\n"), TIMEOUT)
                .unwrap();
        assert_eq!(output, "once nlist add *\n");
    }

    #[test]
    fn failure() {
        let error = run(sh("echo oops >&2; exit 3"), None, TIMEOUT)
            .unwrap_err()
            .to_string();

        assert!(error.contains("oops"), "{error}");
    }

    #[test]
    fn missing_command() {
        let cmd = Command::new("/nonexistent/mmpmon");
        assert!(run(cmd, None, TIMEOUT).is_err());
    }

    #[test]
    fn timeout() {
        let error = run(sh("sleep 5"), None, Duration::from_millis(50))
            .unwrap_err()
            .to_string();

        assert!(error.starts_with("timed out"), "{error}");
    }

    /// Returns `true` once `pid` has exited, zombies included.
    #[cfg(target_os = "linux")]
    fn is_gone(pid: &str) -> bool {
        std::fs::read_to_string(format!("/proc/{pid}/stat"))
            .map_or(true, |stat| stat.contains(") Z "))
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn timeout_kills_descendants() {
        let pid_file = std::env::temp_dir()
            .join(format!("gpfs-exporter-{}.pid", std::process::id()));

        let script = format!(
            "sleep 30 & echo $! > {}; wait",
            pid_file.display()
        );

        let error = run(sh(&script), None, Duration::from_millis(200))
            .unwrap_err()
            .to_string();
        assert!(error.starts_with("timed out"), "{error}");

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let _ = std::fs::remove_file(&pid_file);
        let pid = pid.trim();

        let deadline = Instant::now() + Duration::from_secs(2);
        while !is_gone(pid) && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }

        assert!(is_gone(pid), "sleep {pid} survived the timeout");
    }

    #[test]
    fn background_process_holding_output() {
        let start = Instant::now();

        let output = run(sh("sleep 30 & echo hi"), None, TIMEOUT).unwrap();

        assert_eq!(output, "hi\n");
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
