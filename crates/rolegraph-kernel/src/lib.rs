//! # rolegraph-kernel: Functional core of `rolegraph`
//!
//! The kernel is the pure, deterministic heart of the role catalog. It
//! receives committed commands and produces state changes plus effects to
//! execute.
//!
//! ## Key Principles
//!
//! - **No IO**: The kernel never touches disk, network, or any external resource
//! - **No locks**: Serialization of mutations is the caller's job
//! - **Pure functions**: `apply_committed(state, command) -> (state, effects)`
//!
//! ## Architecture
//!
//! - [`command`]: Commands that can be submitted (`CreateRole`, `GrantRole`, ...)
//! - [`effects`]: Effects for the runtime to execute (`RoleWrite`, `MembershipWrite`, notices)
//! - [`graph`]: The membership graph with cycle detection
//! - [`state`]: In-memory kernel state (role store, graph, owned objects)
//! - [`kernel`]: The `apply_committed` function that ties it all together
//!
//! ## Example
//!
//! ```
//! use rolegraph_kernel::{Command, State, apply_committed};
//! use rolegraph_types::RoleAttributes;
//!
//! let state = State::new();
//! let cmd = Command::create_role("joe", RoleAttributes::new());
//!
//! let (state, effects) = apply_committed(state, cmd).unwrap();
//! assert!(state.lookup("joe").is_some());
//! assert_eq!(effects.len(), 2);
//! ```

pub mod command;
pub mod effects;
pub mod graph;
pub mod kernel;
pub mod state;


// Kani verification harnesses for bounded model checking
#[cfg(kani)]
mod kani_proofs;

// Re-export commonly used items
pub use command::Command;
pub use effects::{Effect, KernelNotice};
pub use graph::{EdgeInsert, GraphError, MembershipGraph};
pub use kernel::{KernelError, apply_committed, apply_committed_batch};
pub use state::{ClusterMetadata, DatabaseMetadata, State};
