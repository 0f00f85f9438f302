// src/core/mod.rs

// The `core` module holds everything that is not user interface: the data
// model, the route analysis pieces and their collaborators.

/// Data structures shared across the application, such as `HopMap`,
/// `TargetRequest` and `Finding`.
pub mod models;

pub mod error;

/// Findings store plus the catalog that explains each finding kind.
pub mod knowledge_base;

pub mod output;
pub mod permission;
pub mod report;
pub mod route;
pub mod run_once;

/// The route divergence scanner and the per-host session driving it.
pub mod scanner;

/// Traceroute collaborator interface and its TCP implementation.
pub mod trace;
