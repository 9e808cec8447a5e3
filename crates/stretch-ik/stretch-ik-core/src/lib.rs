//! stretch-ik-core: scale solver for two-bone IK chains (host-agnostic)
//!
//! The crate computes two segment lengths ("up" and "down") for a two-bone IK chain from the
//! chain's root, tip and pole-vector transforms, blending rigid rest length, elastic stretch,
//! sliding bias and pole-vector snapping.
//!
//! Host adapters build a [`Schema`] once (usually through [`register_stretch_ik`]), create one
//! [`StretchIkNode`] per rig chain, write inputs with [`StretchIkNode::set_input`] and read
//! outputs lazily with [`StretchIkNode::get_output`]. The pure solver is available directly
//! as [`solve`].

pub mod config;
pub mod error;
pub mod node;
pub mod registry;
pub mod schema;
pub mod solver;
pub mod types;

// Re-exports for host adapters
pub use config::{Config, SolverConfig, MIN_GLOBAL_SCALE};
pub use error::{ConfigError, NodeError, RegistryError, SchemaError};
pub use node::{CacheState, Diagnostic, StretchIkNode};
pub use registry::{register_stretch_ik, NodeRegistry, RegisteredType};
pub use schema::{
    stretch_ik_schema, AffectsEdge, AffectsPolicy, Direction, NodeTypeInfo, ParamId, ParamKind,
    ParamSpec, Schema, SchemaBuilder, STRETCH_IK_NODE,
};
pub use solver::{solve, solve_staged, SolveTrace};
pub use types::{ParamValue, ScalePair, SolverInputs, Transform4};
