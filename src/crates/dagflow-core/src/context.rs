//! Run context: the metadata value threaded through every message in one run.

use crate::error::NodeFailure;

/// In-band abort signal. Present once any node on the path raises; absent otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Abort,
}

/// Metadata carried alongside every message of one run (§3 "Run context").
///
/// `start_execution` is stamped exactly once, by the start node, immediately
/// before it invokes its user function, and propagates read-only through
/// every downstream message from then on. `end_execution` is stamped by the
/// end node right after it resolves (or is marked skipped). The three
/// derived fields are computed by the assembler once the end node's message
/// arrives — see [`RunContext::graph_overhead_ms`] and friends.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub start_request: i64,
    pub start_execution: Option<i64>,
    pub end_execution: Option<i64>,
    pub control: Option<Control>,
    pub ex: Option<NodeFailure>,
}

impl RunContext {
    pub(crate) fn new(run_id: String, start_request: i64) -> Self {
        Self { run_id, start_request, start_execution: None, end_execution: None, control: None, ex: None }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.control, Some(Control::Abort))
    }

    /// Marks the run as aborted. Monotonic: once set, later calls on other
    /// messages must not un-set it (enforced by callers, not by this type).
    pub(crate) fn mark_abort(&mut self, ex: NodeFailure) {
        self.control = Some(Control::Abort);
        self.ex = Some(ex);
    }

    /// Time between run creation and the first node beginning execution.
    pub fn graph_overhead_ms(&self) -> Option<i64> {
        self.start_execution.map(|s| s - self.start_request)
    }

    /// Wall time spent actually running nodes, start to end.
    pub fn elapsed_execution_ms(&self) -> Option<i64> {
        match (self.start_execution, self.end_execution) {
            (Some(s), Some(e)) => Some(e - s),
            _ => None,
        }
    }

    /// Wall time for the whole run, request to end.
    pub fn elapsed_total_ms(&self) -> Option<i64> {
        self.end_execution.map(|e| e - self.start_request)
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before Unix epoch").as_millis() as i64
}

/// Run-id alphabet: `A–Z a–z 0–9 - _`, length 21, sampled uniformly per run (§6).
pub(crate) fn generate_run_id() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..21).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect()
}
