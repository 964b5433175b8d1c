//! Test environment for running the treemirror binary.
//!
//! `TestEnv` owns a temp project with a configuration file and a `bin/`
//! directory of fake `ssh` and `rsync` executables that log what they were
//! asked to do. Nothing leaves the machine.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use super::fixtures::CONFIG_TOML;

/// Result of running the treemirror CLI
#[derive(Debug)]
pub struct TestResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Fake ssh: logs each command body, keeps supervisor state in a file.
#[cfg(unix)]
const FAKE_SSH: &str = r#"#!/bin/sh
for arg in "$@"; do body="$arg"; done
if [ "$body" = "sh -s" ]; then body=$(cat); fi
printf '%s\n--\n' "$body" >> "$FAKE_LOG"
if [ -n "${FAKE_SSH_DOWN-}" ]; then
  echo "ssh: connect to host 203.0.113.7 port 22: Connection refused" >&2
  exit 255
fi
case "$body" in
  *"echo treemirror-ok"*) echo treemirror-ok ;;
  *'echo $HOME'*) echo /home/deploy ;;
  *"cp -a"*) echo created ;;
  *"du -sk"*) echo "2048 31" ;;
  *"supervisorctl"*" status") if [ -f "$FAKE_STATE/stopped" ]; then echo "api STOPPED"; else echo "api RUNNING pid 7, uptime 0:01:00"; fi ;;
  *"supervisorctl"*" stop "*) touch "$FAKE_STATE/stopped" ;;
  *"supervisorctl"*" start "*) rm -f "$FAKE_STATE/stopped" ;;
esac
exit 0
"#;

/// Fake rsync: answers `--version`, logs transfers, reports one file.
#[cfg(unix)]
const FAKE_RSYNC: &str = r#"#!/bin/sh
if [ "${1-}" = "--version" ]; then echo "rsync  version 3.2.7"; exit 0; fi
if [ -n "${FAKE_RSYNC_HANG-}" ]; then exec sleep 30; fi
printf 'rsync %s\n--\n' "$*" >> "$FAKE_LOG"
echo ">f+++++++++ app.py"
echo "Total transferred file size: 120 bytes"
exit 0
"#;

pub struct TestEnv {
    pub project: TempDir,
    bin_dir: PathBuf,
    state_dir: PathBuf,
    log_path: PathBuf,
    extra_env: Vec<(String, String)>,
}

impl TestEnv {
    /// Project with `treemirror.toml`, a `backend/` tree and fake tools.
    pub fn new() -> Self {
        Self::with_config(CONFIG_TOML)
    }

    pub fn with_config(config: &str) -> Self {
        let project = TempDir::new().unwrap();
        fs::create_dir_all(project.path().join("backend")).unwrap();
        fs::write(project.path().join("backend/app.py"), "print('hi')\n").unwrap();
        fs::write(project.path().join("treemirror.toml"), config).unwrap();

        let bin_dir = project.path().join(".bin");
        let state_dir = project.path().join(".state");
        fs::create_dir_all(&bin_dir).unwrap();
        fs::create_dir_all(&state_dir).unwrap();
        let log_path = project.path().join(".remote.log");

        let env = Self {
            project,
            bin_dir,
            state_dir,
            log_path,
            extra_env: Vec::new(),
        };
        env.install_fakes();
        env
    }

    #[cfg(unix)]
    fn install_fakes(&self) {
        use std::os::unix::fs::PermissionsExt;
        for (name, body) in [("ssh", FAKE_SSH), ("rsync", FAKE_RSYNC)] {
            let path = self.bin_dir.join(name);
            fs::write(&path, body).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[cfg(not(unix))]
    fn install_fakes(&self) {}

    /// Make every fake ssh call fail like a refused connection.
    pub fn host_down(mut self) -> Self {
        self.extra_env
            .push(("FAKE_SSH_DOWN".to_string(), "1".to_string()));
        self
    }

    /// Make the fake rsync stall long past any sane command timeout.
    pub fn rsync_hangs(mut self) -> Self {
        self.extra_env
            .push(("FAKE_RSYNC_HANG".to_string(), "1".to_string()));
        self
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.project.path().join(relative)
    }

    /// Everything the fake ssh and rsync were asked to run.
    pub fn remote_log(&self) -> String {
        fs::read_to_string(&self.log_path).unwrap_or_default()
    }

    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_from(self.project.path(), args)
    }

    pub fn run_from(&self, cwd: &Path, args: &[&str]) -> TestResult {
        let path = format!(
            "{}:{}",
            self.bin_dir.display(),
            std::env::var("PATH").unwrap_or_default()
        );
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_treemirror"));
        cmd.args(args)
            .current_dir(cwd)
            .env("PATH", path)
            .env("FAKE_LOG", &self.log_path)
            .env("FAKE_STATE", &self.state_dir)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("TREEMIRROR_CONFIG")
            .env_remove("TREEMIRROR_HOST")
            .env_remove("TREEMIRROR_USER")
            .env_remove("TREEMIRROR_KEY")
            .env_remove("TREEMIRROR_TRANSPORT");
        for (key, value) in &self.extra_env {
            cmd.env(key, value);
        }

        let output = cmd.output().unwrap();
        TestResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}
