mod buffer;
mod policy;

pub use buffer::SnapshotRing;
pub use policy::{
    ReconcileOutcome, SendThrottle, hard_reconcile, needs_reconciliation, reconcile, soft_merge,
};
