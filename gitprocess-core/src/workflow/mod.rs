//! Workflow module for the branch creation session
//!
//! The coordinator walks one interactive session from clone to policy copy;
//! the policy copy itself is reached through the [`PolicyCopier`] seam so the
//! hosting service integration lives in its own crate.

pub mod coordinator;
pub mod copier;

pub use coordinator::{Coordinator, Outcome, WorkflowStep};
pub use copier::{CopySummary, PolicyCopier, PolicyCopy};
