//! Observer dispatch: asynchronous, non-blocking, failure-swallowing (§4.5).

use crate::record::NodeRecord;
use std::sync::Arc;

/// A sink receiving per-node execution records. Cloned cheaply (it's an
/// `Arc`) into every node task that might need to report to it.
pub type Observer = Arc<dyn Fn(NodeRecord) + Send + Sync>;

/// Fire `record` at `observer` on a detached task. Never blocks the
/// dataflow; a panicking observer is caught and logged, not propagated.
pub(crate) fn dispatch(observer: &Option<Observer>, record: NodeRecord) {
    let Some(obs) = observer.clone() else { return };
    tokio::spawn(async move {
        let node = record.node.clone();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| obs(record)));
        if outcome.is_err() {
            tracing::warn!(node = %node, "observer callback panicked; ignoring");
        }
    });
}
