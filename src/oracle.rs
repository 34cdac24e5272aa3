//! Classifying a candidate into `FAIL`, `PASS`, or `UNRESOLVED`.
//!
//! An oracle is assumed deterministic in verdict (the correctness of the
//! verdict cache depends on it), but may be expensive or variable in
//! latency. Oracle exceptions and per-query timeouts are never surfaced as
//! `Err`: they fold into `Verdict::Unresolved`, per the error handling
//! design's "local recovery is preferred" policy.

use std::fs;
use std::io::Write;
use std::path;
use std::process;
use std::time::{Duration, Instant};
use tempdir;

/// The three-way classification of a candidate configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The failure reproduces on this candidate.
    Fail,
    /// The failure does not reproduce.
    Pass,
    /// The candidate could not be evaluated meaningfully (syntactically
    /// invalid, the oracle crashed for an unrelated reason, or its
    /// evaluation was abandoned on timeout).
    Unresolved,
}

impl Verdict {
    /// Is this verdict `Fail`?
    pub fn is_fail(self) -> bool {
        self == Verdict::Fail
    }
}

/// A callable that classifies a materialized candidate.
///
/// Implementors may own external resources (subprocesses, files); they are
/// responsible for their own cleanup under all exit paths. `query` never
/// returns an error: anything that would otherwise be one is mapped to
/// `Verdict::Unresolved`.
pub trait Oracle {
    /// The materialized candidate type this oracle consumes, matching the
    /// input model's `Rendered` type.
    type Candidate;

    /// Classify `candidate`.
    fn query(&mut self, candidate: &Self::Candidate) -> Verdict;
}

impl<F, C> Oracle for F
where
    F: FnMut(&C) -> Verdict,
{
    type Candidate = C;

    fn query(&mut self, candidate: &C) -> Verdict {
        (*self)(candidate)
    }
}

/// An oracle that runs a user-provided script once per candidate.
///
/// The materialized candidate's bytes are written to a fresh temporary
/// file, the script is invoked with that file's path as its sole argument,
/// and its exit status classifies the verdict: exit code `0` is `Fail`
/// (the failure reproduces), exit code `1` is `Pass`, any other exit status
/// or a spawn failure is `Unresolved`. A script that does not exit within
/// its `timeout` (if any) is killed and also scored `Unresolved`.
#[derive(Debug)]
pub struct Script {
    program: path::PathBuf,
    timeout: Option<Duration>,
}

impl Script {
    /// Construct a `Script` oracle running `program`, with no per-query
    /// timeout.
    pub fn new<P: Into<path::PathBuf>>(program: P) -> Script {
        Script {
            program: program.into(),
            timeout: None,
        }
    }

    /// Set a per-query timeout. A script still running after `timeout`
    /// elapses is killed and its verdict is `Unresolved`.
    pub fn with_timeout(mut self, timeout: Duration) -> Script {
        self.timeout = Some(timeout);
        self
    }

    fn run(&self, bytes: &[u8]) -> Option<i32> {
        let dir = tempdir::TempDir::new("ddmin-oracle").ok()?;
        let path = dir.path().join("candidate");
        {
            let mut f = fs::File::create(&path).ok()?;
            f.write_all(bytes).ok()?;
        }

        let mut child = process::Command::new(&self.program)
            .arg(&path)
            .stdin(process::Stdio::null())
            .stdout(process::Stdio::null())
            .stderr(process::Stdio::null())
            .spawn()
            .ok()?;

        let deadline = self.timeout.map(|t| Instant::now() + t);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    return status.code();
                }
                Ok(None) => {
                    if let Some(deadline) = deadline {
                        if Instant::now() >= deadline {
                            let _ = child.kill();
                            let _ = child.wait();
                            return None;
                        }
                    }
                    ::std::thread::sleep(Duration::from_millis(5));
                }
                Err(_) => return None,
            }
        }
    }
}

impl<C: AsRef<[u8]>> Oracle for Script {
    type Candidate = C;

    fn query(&mut self, candidate: &C) -> Verdict {
        match self.run(candidate.as_ref()) {
            Some(0) => Verdict::Fail,
            Some(1) => Verdict::Pass,
            _ => Verdict::Unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_oracle() {
        let mut o = |c: &Vec<u8>| if c.windows(3).any(|w| w == b"abc") {
            Verdict::Fail
        } else {
            Verdict::Pass
        };
        assert_eq!(o.query(&b"xxabcxx".to_vec()), Verdict::Fail);
        assert_eq!(o.query(&b"xxxxxxx".to_vec()), Verdict::Pass);
    }

    #[cfg(unix)]
    #[test]
    fn script_oracle_exit_codes() {
        let dir = tempdir::TempDir::new("ddmin-oracle-test").unwrap();
        let script_path = dir.path().join("grep-abc.sh");
        {
            let mut f = fs::File::create(&script_path).unwrap();
            writeln!(f, "#!/bin/sh").unwrap();
            writeln!(f, "grep -q abc \"$1\"").unwrap();
        }
        let mut perms = fs::metadata(&script_path).unwrap().permissions();
        ::std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
        fs::set_permissions(&script_path, perms).unwrap();

        let mut oracle = Script::new(script_path);
        assert_eq!(oracle.query(&b"xxabcxx".to_vec()), Verdict::Fail);
        assert_eq!(oracle.query(&b"xxxxxxx".to_vec()), Verdict::Pass);
    }

    #[cfg(unix)]
    #[test]
    fn script_oracle_exit_code_other_than_zero_or_one_is_unresolved() {
        let dir = tempdir::TempDir::new("ddmin-oracle-test").unwrap();
        let script_path = dir.path().join("exit-2.sh");
        {
            let mut f = fs::File::create(&script_path).unwrap();
            writeln!(f, "#!/bin/sh").unwrap();
            writeln!(f, "exit 2").unwrap();
        }
        let mut perms = fs::metadata(&script_path).unwrap().permissions();
        ::std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
        fs::set_permissions(&script_path, perms).unwrap();

        let mut oracle = Script::new(script_path);
        assert_eq!(oracle.query(&b"anything".to_vec()), Verdict::Unresolved);
    }

    #[test]
    fn script_oracle_missing_program_is_unresolved() {
        let mut oracle = Script::new("/no/such/program/anywhere");
        assert_eq!(oracle.query(&b"anything".to_vec()), Verdict::Unresolved);
    }
}
