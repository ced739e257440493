//! Backport handling: label parsing, bookkeeping, command-driven
//! cherry-pick submission and collaborator invitations.

pub mod dispatcher;
pub mod invite;
pub mod labels;
pub mod router;

pub use dispatcher::{CherryPickDispatcher, DispatchReport, LifecycleReport};
pub use labels::{BackportTarget, LabelParser};
pub use router::CherryPickRouter;
