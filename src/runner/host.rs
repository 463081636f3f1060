use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::{Builder, Runtime};

use super::{CommandOutput, CommandRequest, CommandRunner, Isolation, RunError};
use crate::config::RunnerConfig;

/// Runs commands on the local machine.
///
/// Child processes are driven by a current-thread tokio runtime built on the first `run` and dropped by `close`.
/// Isolation is delegated to the wrapper commands in [`RunnerConfig`].
pub struct HostRunner {
    config: RunnerConfig,
    runtime: Option<Runtime>,
    warned_unisolated: bool,
}

impl HostRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            runtime: None,
            warned_unisolated: false,
        }
    }

    /// The full argv for a request, wrapper included.
    fn command_line(&mut self, request: &CommandRequest) -> Vec<String> {
        let wrapper = match request.isolation {
            Isolation::ReadOnly => &self.config.read_only_wrapper,
            Isolation::ReadWrite => &self.config.read_write_wrapper,
        };
        if request.isolation == Isolation::ReadOnly && wrapper.is_empty() && !self.warned_unisolated {
            tracing::warn!("no read-only wrapper configured; commands run without filesystem isolation");
            self.warned_unisolated = true;
        }
        wrapper.iter().chain(&request.args).cloned().collect()
    }
}

impl CommandRunner for HostRunner {
    #[tracing::instrument(skip_all, fields(args = ?request.args, dir = %request.dir.display()))]
    fn run(&mut self, request: &CommandRequest) -> Result<CommandOutput, RunError> {
        if request.args.is_empty() {
            return Err(RunError::EmptyCommand);
        }
        let argv = self.command_line(request);
        let dir = if request.dir.as_os_str().is_empty() {
            Path::new("/")
        } else {
            request.dir.as_path()
        };

        let runtime = match self.runtime.take() {
            Some(rt) => rt,
            None => Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(RunError::Runtime)?,
        };
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let result = runtime.block_on(execute(&argv, dir, &self.config.env, timeout));
        self.runtime = Some(runtime);

        if let Ok(output) = &result {
            tracing::debug!(exit_code = output.exit_code, "command finished");
        }
        result
    }

    fn close(&mut self) -> Result<(), RunError> {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(Duration::from_secs(1));
        }
        Ok(())
    }
}

async fn execute(
    argv: &[String],
    dir: &Path,
    env: &std::collections::BTreeMap<String, String>,
    timeout: Duration,
) -> Result<CommandOutput, RunError> {
    let (program, args) = argv.split_first().ok_or(RunError::EmptyCommand)?;
    let child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RunError::Spawn {
            program: program.clone(),
            source,
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| RunError::Timeout {
            program: program.clone(),
            secs: timeout.as_secs(),
        })??;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: exit_code(output.status),
    })
}

/// The shell convention: a signal-killed process reports `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

impl Drop for HostRunner {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn runner() -> HostRunner {
        HostRunner::new(RunnerConfig {
            timeout_secs: 5,
            read_only_wrapper: Vec::new(),
            read_write_wrapper: Vec::new(),
            env: BTreeMap::from([("ATTRSCRIPT_TEST_VAR".to_string(), "hello".to_string())]),
        })
    }

    fn request(args: &[&str]) -> CommandRequest {
        CommandRequest {
            args: args.iter().map(|s| s.to_string()).collect(),
            dir: Default::default(),
            isolation: Isolation::ReadWrite,
        }
    }

    #[test]
    fn test_captures_output_and_exit_code() {
        let mut r = runner();
        let out = r.run(&request(&["sh", "-c", "echo out; echo err >&2; exit 3"])).unwrap();
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert_eq!(out.exit_code, 3);
        r.close().unwrap();
    }

    #[test]
    fn test_empty_dir_means_root() {
        let mut r = runner();
        assert_eq!(r.run(&request(&["pwd"])).unwrap().stdout.trim(), "/");
    }

    #[test]
    fn test_configured_env_is_visible() {
        let mut r = runner();
        let out = r.run(&request(&["sh", "-c", "printf %s \"$ATTRSCRIPT_TEST_VAR\""])).unwrap();
        assert_eq!(out.stdout, "hello");
    }

    #[test]
    fn test_wrapper_prefixes_read_only_commands() {
        let mut r = HostRunner::new(RunnerConfig {
            read_only_wrapper: vec!["echo".to_string(), "wrapped".to_string()],
            ..runner().config.clone()
        });
        let mut req = request(&["touch", "aa"]);
        req.isolation = Isolation::ReadOnly;
        assert_eq!(r.run(&req).unwrap().stdout, "wrapped touch aa\n");
    }

    #[test]
    fn test_spawn_failure_and_timeout() {
        let mut r = runner();
        assert!(matches!(
            r.run(&request(&["/definitely/not/a/program"])),
            Err(RunError::Spawn { .. })
        ));
        r.config.timeout_secs = 1;
        assert!(matches!(r.run(&request(&["sleep", "5"])), Err(RunError::Timeout { .. })));
    }

    #[test]
    fn test_signal_exit_code() {
        let mut r = runner();
        let out = r.run(&request(&["sh", "-c", "kill -9 $$"])).unwrap();
        assert_eq!(out.exit_code, 137);
    }

    #[test]
    fn test_empty_command() {
        assert!(matches!(runner().run(&request(&[])), Err(RunError::EmptyCommand)));
    }
}
