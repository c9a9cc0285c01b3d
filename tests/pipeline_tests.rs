//! Integration tests for the enumeration pipeline
//!
//! All tests run against the library with an in-memory candidate source and
//! a scripted prober - no network access. The output sink is a real file in
//! a temp directory so append/flush behavior is exercised end to end.

use o365_userenum::config::RunConfig;
use o365_userenum::error::{ProbeError, UserEnumError};
use o365_userenum::pipeline::{CandidateSource, Coordinator};
use o365_userenum::probe::{classify, Classification, ProbeResponse, Prober};
use reqwest::Url;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tempfile::tempdir;

fn test_config(output: &Path, workers: usize, queue_capacity: usize) -> RunConfig {
    RunConfig {
        users_path: PathBuf::from("unused.txt"),
        output_path: output.to_path_buf(),
        password: "Password1".into(),
        endpoint: Url::parse("https://outlook.office365.com/Microsoft-Server-ActiveSync").unwrap(),
        worker_count: workers,
        queue_capacity,
        probe_timeout: Duration::from_secs(5),
        echo_results: false,
        verbose: false,
    }
}

fn in_memory(names: &[&str]) -> CandidateSource {
    let owned: Vec<io::Result<String>> = names.iter().map(|n| Ok(n.to_string())).collect();
    Box::new(owned.into_iter())
}

/// Prober answering from a fixed (status, user-not-found) script; candidates
/// missing from the script fail at the transport layer.
struct ScriptedProber {
    script: HashMap<String, (u16, bool)>,
}

impl ScriptedProber {
    fn new(entries: &[(&str, u16, bool)]) -> Self {
        Self {
            script: entries
                .iter()
                .map(|&(name, status, not_found)| (name.to_string(), (status, not_found)))
                .collect(),
        }
    }
}

impl Prober for ScriptedProber {
    fn probe(&self, username: &str) -> Result<ProbeResponse, ProbeError> {
        match self.script.get(username) {
            Some(&(status, not_found)) => Ok(ProbeResponse {
                status,
                classification: classify(status, not_found),
            }),
            None => Err(ProbeError::Other(format!(
                "simulated timeout for '{}'",
                username
            ))),
        }
    }
}

/// Prober that raises the run's shutdown flag from inside its first probe.
struct CancellingProber {
    flag: OnceLock<Arc<AtomicBool>>,
}

impl CancellingProber {
    fn new() -> Self {
        Self {
            flag: OnceLock::new(),
        }
    }

    fn arm(&self, flag: Arc<AtomicBool>) {
        self.flag.set(flag).expect("armed twice");
    }
}

impl Prober for CancellingProber {
    fn probe(&self, _username: &str) -> Result<ProbeResponse, ProbeError> {
        if let Some(flag) = self.flag.get() {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(ProbeResponse {
            status: 401,
            classification: classify(401, false),
        })
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_classification_table_is_exact() {
    assert_eq!(classify(401, false), Classification::ValidUser);
    assert_eq!(classify(404, false), Classification::Unknown);
    assert_eq!(classify(404, true), Classification::InvalidUser);
    assert_eq!(classify(403, false), Classification::ValidPasswordSecondFactor);
    assert_eq!(classify(200, false), Classification::ValidLogin);
    assert_eq!(classify(500, true), Classification::Unknown);
}

#[test]
fn test_every_candidate_probed_exactly_once() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("results.txt");

    let names: Vec<String> = (0..25).map(|i| format!("user{:02}", i)).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let script: Vec<(&str, u16, bool)> = name_refs.iter().map(|&n| (n, 401, false)).collect();

    let coordinator = Coordinator::new(
        test_config(&output, 4, 2),
        in_memory(&name_refs),
        Arc::new(ScriptedProber::new(&script)),
    );
    let result = coordinator.run().unwrap();

    assert!(result.completed);
    assert_eq!(result.candidates, 25);
    assert_eq!(result.outcomes.probed, 25);
    assert_eq!(result.outcomes.valid_users, 25);
    assert_eq!(result.results_written, 25);

    let lines = read_lines(&output);
    assert_eq!(lines.len(), 25);

    // Each candidate appears exactly once, order unconstrained
    let seen: HashSet<&str> = lines
        .iter()
        .map(|line| {
            line.rsplit(' ')
                .next()
                .unwrap()
                .split(':')
                .next()
                .unwrap()
        })
        .collect();
    assert_eq!(seen.len(), 25);
    for name in &name_refs {
        assert!(seen.contains(name), "missing record for {}", name);
    }
}

#[test]
fn test_known_status_scenarios() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("results.txt");

    let coordinator = Coordinator::new(
        test_config(&output, 3, 2),
        in_memory(&["alice", "bob", "eve", "mallory", "trent"]),
        Arc::new(ScriptedProber::new(&[
            ("alice", 401, false),
            ("bob", 404, true),
            ("eve", 403, false),
            ("mallory", 200, false),
            ("trent", 404, false),
        ])),
    );
    let result = coordinator.run().unwrap();

    assert!(result.completed);
    assert_eq!(result.outcomes.probed, 5);
    assert_eq!(result.outcomes.valid_users, 1);
    assert_eq!(result.outcomes.invalid_users, 1);
    assert_eq!(result.outcomes.second_factor, 1);
    assert_eq!(result.outcomes.valid_logins, 1);
    assert_eq!(result.outcomes.unknown, 1);
    assert_eq!(result.outcomes.transport_errors, 0);

    let lines = read_lines(&output);
    assert_eq!(lines.len(), 5);
    assert!(lines.contains(&"[+] 401 VALID_USER alice:Password1".to_string()));
    assert!(lines.contains(&"[-] 404 INVALID_USER bob:Password1".to_string()));
    assert!(lines.contains(&"[#] 403 VALID_PASSWD_2FA eve:Password1".to_string()));
    assert!(lines.contains(&"[!] 200 VALID_LOGIN mallory:Password1".to_string()));
    assert!(lines.contains(&"[?] 404 UNKNOWN trent:Password1".to_string()));
}

#[test]
fn test_transport_failure_yields_unknown_with_placeholder() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("results.txt");

    // carol is not scripted, so her probe fails at the transport layer
    let coordinator = Coordinator::new(
        test_config(&output, 2, 1),
        in_memory(&["carol"]),
        Arc::new(ScriptedProber::new(&[])),
    );
    let result = coordinator.run().unwrap();

    assert!(result.completed);
    assert_eq!(result.outcomes.probed, 1);
    assert_eq!(result.outcomes.unknown, 1);
    assert_eq!(result.outcomes.transport_errors, 1);

    let lines = read_lines(&output);
    assert_eq!(lines, vec!["[?] ??? UNKNOWN carol:Password1"]);
}

#[test]
fn test_more_workers_than_candidates_still_terminates() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("results.txt");

    let coordinator = Coordinator::new(
        test_config(&output, 8, 4),
        in_memory(&["alice", "bob"]),
        Arc::new(ScriptedProber::new(&[
            ("alice", 401, false),
            ("bob", 404, true),
        ])),
    );
    let result = coordinator.run().unwrap();

    assert!(result.completed);
    assert_eq!(result.outcomes.probed, 2);
    assert_eq!(result.results_written, 2);
}

#[test]
fn test_cancellation_before_start_drops_all_work() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("results.txt");

    let coordinator = Coordinator::new(
        test_config(&output, 1, 1),
        in_memory(&["a", "b", "c", "d", "e"]),
        Arc::new(ScriptedProber::new(&[("a", 401, false)])),
    );
    coordinator.shutdown_flag().store(true, Ordering::SeqCst);
    let result = coordinator.run().unwrap();

    assert!(!result.completed);
    assert_eq!(result.candidates, 0);
    assert_eq!(result.results_written, 0);
    assert!(read_lines(&output).is_empty());
}

#[test]
fn test_cancellation_mid_run_keeps_completed_work() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("results.txt");

    let prober = Arc::new(CancellingProber::new());
    let coordinator = Coordinator::new(
        test_config(&output, 1, 1),
        in_memory(&["a", "b", "c", "d", "e"]),
        Arc::clone(&prober) as Arc<dyn Prober>,
    );
    prober.arm(coordinator.shutdown_flag());
    let result = coordinator.run().unwrap();

    // The single worker cancels the run from inside its first probe: that
    // one result still reaches the sink, nothing else is dequeued.
    assert!(!result.completed);
    assert_eq!(result.outcomes.probed, 1);
    assert_eq!(result.results_written, 1);
    assert_eq!(read_lines(&output).len(), 1);
}

#[test]
fn test_source_read_error_terminates_cleanly() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("results.txt");

    let source: CandidateSource = Box::new(
        vec![
            Ok("alice".to_string()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad byte")),
        ]
        .into_iter(),
    );
    let coordinator = Coordinator::new(
        test_config(&output, 2, 2),
        source,
        Arc::new(ScriptedProber::new(&[("alice", 401, false)])),
    );

    let err = coordinator.run().unwrap_err();
    assert!(matches!(err, UserEnumError::Io(_)));

    // Work queued before the failure still drained into the sink
    let lines = read_lines(&output);
    assert_eq!(lines, vec!["[+] 401 VALID_USER alice:Password1"]);
}

#[test]
fn test_unwritable_output_fails_before_probing() {
    let coordinator = Coordinator::new(
        test_config(Path::new("/no/such/dir/results.txt"), 2, 2),
        in_memory(&["alice"]),
        Arc::new(ScriptedProber::new(&[("alice", 401, false)])),
    );

    let err = coordinator.run().unwrap_err();
    assert!(matches!(err, UserEnumError::Report(_)));
}

#[test]
fn test_empty_source_completes_with_no_records() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("results.txt");

    let coordinator = Coordinator::new(
        test_config(&output, 4, 2),
        in_memory(&[]),
        Arc::new(ScriptedProber::new(&[])),
    );
    let result = coordinator.run().unwrap();

    assert!(result.completed);
    assert_eq!(result.candidates, 0);
    assert_eq!(result.outcomes.probed, 0);
    assert_eq!(result.results_written, 0);
    assert!(read_lines(&output).is_empty());
}
