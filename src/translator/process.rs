//! External process translator
//!
//! Runs the configured command as
//! `<command> <args...> <input path> <json params>` and captures stdout.
//!
//! On unix the child leads its own process group. When the timeout fires or
//! the request future is dropped (client gone), the whole group is killed,
//! so workers the translator forked die with it.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::types::{TranslationOutput, TranslatorError};
use super::Translator;
use crate::config::TranslatorConfig;

/// How much of stderr is kept for logs
const STDERR_TAIL_BYTES: usize = 2048;

/// Translator backed by an external program
pub struct ProcessTranslator {
    config: TranslatorConfig,
}

impl ProcessTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, input: &Path, params: &str) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args).arg(input).arg(params);

        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        cmd.process_group(0);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Where the configured command would be loaded from, if it exists.
    ///
    /// Bare names are looked up on `PATH`; relative paths resolve against
    /// the working directory when one is configured.
    fn resolve_command(&self) -> Option<PathBuf> {
        let command = Path::new(&self.config.command);

        if command.components().count() > 1 || command.is_absolute() {
            let path = match &self.config.working_dir {
                Some(dir) if command.is_relative() => dir.join(command),
                _ => command.to_path_buf(),
            };
            return is_executable(&path).then_some(path);
        }

        let search = std::env::var_os("PATH")?;
        std::env::split_paths(&search)
            .map(|dir| dir.join(command))
            .find(|candidate| is_executable(candidate))
    }
}

#[async_trait]
impl Translator for ProcessTranslator {
    fn name(&self) -> &str {
        &self.config.command
    }

    async fn is_available(&self) -> bool {
        self.resolve_command().is_some()
    }

    async fn translate(
        &self,
        input: &Path,
        params: &str,
    ) -> Result<TranslationOutput, TranslatorError> {
        let start_time = Instant::now();

        let mut child = self
            .build_command(input, params)
            .spawn()
            .map_err(|e| TranslatorError::Spawn {
                command: self.config.command.clone(),
                source: e,
            })?;
        let group = ProcessGroup::of(child.id());

        tracing::debug!(
            command = %self.config.command,
            pid = child.id(),
            input = %input.display(),
            "Translator started"
        );

        let mut stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        let run = async {
            let mut bytes = Vec::new();
            let (read, tail, status) = tokio::join!(
                stdout.read_to_end(&mut bytes),
                read_tail(stderr, STDERR_TAIL_BYTES),
                child.wait(),
            );
            read?;
            Ok::<_, std::io::Error>((status?, bytes, tail?))
        };

        // Leaving early drops `group` and `child`, which kills every process
        // the translator started
        let (status, bytes, tail) = match tokio::time::timeout(self.config.timeout, run).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    command = %self.config.command,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Translator timed out, killed"
                );
                return Err(TranslatorError::TimedOut(self.config.timeout));
            }
        };
        group.release();

        let stderr = stderr_text(&tail);

        if !status.success() {
            return Err(TranslatorError::Failed {
                code: status.code(),
                stderr,
            });
        }

        Ok(TranslationOutput {
            bytes,
            stderr,
            elapsed: start_time.elapsed(),
        })
    }
}

/// Kills the translator's process group when dropped, unless released
struct ProcessGroup {
    #[cfg(unix)]
    leader: Option<nix::unistd::Pid>,
}

impl ProcessGroup {
    fn of(pid: Option<u32>) -> Self {
        #[cfg(unix)]
        {
            Self {
                leader: pid.map(|pid| nix::unistd::Pid::from_raw(pid as i32)),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = pid;
            Self {}
        }
    }

    /// The leader has been reaped; leave whatever is left alone
    fn release(self) {
        std::mem::forget(self);
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(leader) = self.leader.take() {
            use nix::sys::signal::{killpg, Signal};

            if let Err(e) = killpg(leader, Signal::SIGKILL) {
                tracing::debug!(pgid = leader.as_raw(), "killpg failed: {}", e);
            }
        }
    }
}

fn missing_pipe(name: &str) -> TranslatorError {
    TranslatorError::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        format!("translator {} was not captured", name),
    ))
}

/// Drain `reader`, keeping only its last `limit` bytes
async fn read_tail<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut tail = VecDeque::with_capacity(limit);
    let mut chunk = [0u8; 4096];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        tail.extend(&chunk[..n]);
        let excess = tail.len().saturating_sub(limit);
        tail.drain(..excess);
    }

    Ok(tail.into())
}

fn stderr_text(tail: &[u8]) -> String {
    String::from_utf8_lossy(tail).trim().to_string()
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
