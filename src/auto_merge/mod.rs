//! Auto-merge: permission checks and queueing of merge intents.
//!
//! Performing the merge itself is left to a separate executor that reads
//! the pending intents.

pub mod intent;
pub mod permission;
pub mod policy;
pub mod queue;
pub mod router;

pub use intent::{AutoMergeIntent, IntentStatus, SaveOutcome};
pub use permission::{PermissionDecision, PermissionEvaluator};
pub use policy::{LabelMergePolicy, PolicyDenial};
pub use queue::CommentingMergeQueue;
pub use router::AutoMergeRouter;
