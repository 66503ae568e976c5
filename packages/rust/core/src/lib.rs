//! Governance workflows over the flat-file record store.
//!
//! Every workflow reads the documents it needs through a [`RepoContext`],
//! computes the new contents in memory and returns a
//! [`WritePlan`](repogov_storage::WritePlan). Nothing here writes to disk;
//! the caller either prints the plan or hands it to the store.

pub mod agent_log;
pub mod allocate;
pub mod context;
pub mod hitl;
pub mod lifecycle;
pub mod tasks;
pub mod transplant;
pub mod waiver;

pub use allocate::{Scope, allocate};
pub use context::RepoContext;
pub use lifecycle::{classify_record, classify_waiver, parse_date};
pub use transplant::{FieldMatcher, FieldUpdate, Placement, move_record, mutate_field_in_file};
