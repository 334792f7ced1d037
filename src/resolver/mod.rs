// src/resolver/mod.rs

//! Dependency resolution and action planning
//!
//! `ActionResolver` computes which packages an install or uninstall request
//! touches, `ActionPlanner` orders them into an executable plan. The
//! dependency graph, requirement bookkeeping and version selection policy
//! live in their own modules.

mod conflict;
mod context;
mod engine;
mod graph;
mod plan;
mod select;

pub use conflict::{Requirement, RequirementSet};
pub use context::{DependencyBehavior, ResolverContext};
pub use engine::{ActionResolver, MAX_RESOLUTION_STEPS};
pub use graph::{DependencyEdge, DependencyGraph};
pub use plan::{ActionPlanner, Closure, ClosureNode, PackageActionDescription, PackageActionType};
pub use select::{filter_candidates, select_version};
