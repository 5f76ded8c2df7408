//! Blocking subprocess execution shared by every external tool: the FFT rider,
//! the plotter, the figure converters and the document compiler.
//!
//! An [`Invocation`] is built first and can be printed before it runs, which
//! is what dry runs rely on.
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// A program, its arguments and the directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Shell-like rendering for logs and dry runs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| quote(&part.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).stdin(Stdio::null());
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> Error {
        Error::Spawn {
            command: self.command_line(),
            source,
        }
    }

    /// Runs to completion, capturing stdout and stderr.
    ///
    /// Only a failure to start the program is an error; a non-zero exit status
    /// is reported through [`Captured::status`].
    pub fn run(&self) -> Result<Captured> {
        debug!(command = %self.command_line(), "running");
        let output = self.command().output().map_err(|e| self.spawn_error(e))?;
        Ok(Captured {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Runs to completion with stdout and stderr sent to the given files.
    pub fn run_to_files(&self, stdout: &Path, stderr: &Path) -> Result<ExitStatus> {
        debug!(command = %self.command_line(), "running");
        let out = File::create(stdout)?;
        let err = File::create(stderr)?;
        self.command()
            .stdout(out)
            .stderr(err)
            .status()
            .map_err(|e| self.spawn_error(e))
    }
}

fn quote(part: &str) -> String {
    let plain = !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=,:+@%".contains(c));
    if plain {
        part.to_string()
    } else {
        format!("'{}'", part.replace('\'', r"'\''"))
    }
}

/// Output of a finished subprocess
#[derive(Debug, Clone)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Remainders of the stdout lines starting with `prefix`
    pub fn matching_lines<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.stdout.lines().filter_map(move |l| l.strip_prefix(prefix))
    }
}

/// Looks `program` up in `PATH` the way a shell would.
///
/// Programs given with a directory component are checked as-is.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    env::split_paths(&env::var_os("PATH")?)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_quotes_when_needed() {
        let inv = Invocation::new("asy")
            .args(["-f", "pdf"])
            .arg("-u")
            .arg("legendlist=\"main forward,main inverse\"");
        assert_eq!(
            inv.command_line(),
            r#"asy -f pdf -u 'legendlist="main forward,main inverse"'"#
        );
    }

    #[test]
    fn builder_keeps_order_and_directory() {
        let inv = Invocation::new("/opt/build/rocfft-rider")
            .args(["-x", "1024"])
            .current_dir("/opt/build");
        assert_eq!(inv.program(), Path::new("/opt/build/rocfft-rider"));
        assert_eq!(inv.arguments(), &[OsString::from("-x"), OsString::from("1024")]);
        assert_eq!(inv.working_dir(), Some(Path::new("/opt/build")));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = Invocation::new("/nonexistent/fftbench-test-binary").run().unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn captures_output_and_status() {
        let captured = Invocation::new("sh")
            .args(["-c", "echo 'Execution gpu time: 1 ms'; echo oops >&2; exit 3"])
            .run()
            .unwrap();
        assert!(!captured.success());
        assert_eq!(captured.status.code(), Some(3));
        assert_eq!(captured.stderr.trim(), "oops");
        assert_eq!(
            captured.matching_lines("Execution gpu time: ").collect::<Vec<_>>(),
            vec!["1 ms"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_the_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let captured = Invocation::new("pwd").current_dir(dir.path()).run().unwrap();
        assert_eq!(
            Path::new(captured.stdout.trim()).canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn finds_shell_on_path() {
        assert!(find_on_path("sh").is_some());
        assert!(find_on_path("fftbench-surely-not-installed").is_none());
    }
}
