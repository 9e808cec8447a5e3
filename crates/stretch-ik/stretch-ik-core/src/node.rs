//! Lazily evaluated stretch IK node: holds the current inputs, a single cached output pair and
//! per-output staleness.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SolverConfig;
use crate::error::NodeError;
use crate::schema::{ParamId, Schema};
use crate::solver::solve_staged;
use crate::types::{ParamValue, ScalePair, SolverInputs, Transform4};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Stale,
    Fresh,
}

/// Non-fatal conditions noticed while writing inputs or computing.
///
/// They are reported, never corrected: the values written and the pair produced are left
/// exactly as they are.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    DomainViolation {
        param: ParamId,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    DegenerateGeometry {
        chain_length: f64,
        pair: ScalePair,
    },
}

/// One instance per rig chain. The host serialises access to each instance.
#[derive(Debug, Clone)]
pub struct StretchIkNode {
    schema: Arc<Schema>,
    solver: SolverConfig,
    inputs: SolverInputs,
    cached: ScalePair,
    states: HashMap<ParamId, CacheState>,
    computes: u64,
    diagnostics: Vec<Diagnostic>,
}

impl StretchIkNode {
    /// Create a node with every input at its schema default and every output stale.
    pub fn new(schema: Arc<Schema>, solver: SolverConfig) -> Result<Self, NodeError> {
        let mut inputs = SolverInputs::default();
        let mut cached = ScalePair::default();
        let mut states = HashMap::new();
        for spec in schema.params() {
            if spec.id.is_output() {
                if let Some(v) = spec.default.as_scalar() {
                    match spec.id {
                        ParamId::UpScale => cached.up = v,
                        _ => cached.down = v,
                    }
                }
                states.insert(spec.id, CacheState::Stale);
            } else {
                inputs.set(spec.id, spec.default.clone())?;
            }
        }
        Ok(Self {
            schema,
            solver,
            inputs,
            cached,
            states,
            computes: 0,
            diagnostics: Vec::new(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Current input snapshot.
    pub fn inputs(&self) -> &SolverInputs {
        &self.inputs
    }

    /// Number of times the solver has actually run on this node.
    pub fn compute_count(&self) -> u64 {
        self.computes
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn resolve(&self, name: &str) -> Result<ParamId, NodeError> {
        self.schema
            .lookup(name)
            .ok_or_else(|| NodeError::UnknownParameter {
                name: name.to_string(),
            })
    }

    fn resolve_output(&self, name: &str) -> Result<ParamId, NodeError> {
        let id = self.resolve(name)?;
        if !self.states.contains_key(&id) {
            return Err(NodeError::NotAnOutput {
                name: name.to_string(),
            });
        }
        Ok(id)
    }

    pub fn cache_state(&self, output: &str) -> Result<CacheState, NodeError> {
        let id = self.resolve_output(output)?;
        Ok(self.states.get(&id).copied().unwrap_or(CacheState::Stale))
    }

    pub fn get_input(&self, name: &str) -> Result<ParamValue, NodeError> {
        let id = self.resolve(name)?;
        self.inputs.get(id).ok_or_else(|| NodeError::NotAnInput {
            name: name.to_string(),
        })
    }

    /// Write an input and invalidate the outputs it affects.
    ///
    /// Values outside the declared domain are stored as given and reported through
    /// [`diagnostics`](Self::diagnostics).
    pub fn set_input(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), NodeError> {
        let id = self.resolve(name)?;
        let value = value.into();
        let violation = match (self.schema.spec(id), value.as_scalar()) {
            (Some(spec), Some(v)) if !spec.contains(v) => Some(Diagnostic::DomainViolation {
                param: id,
                value: v,
                min: spec.min,
                max: spec.max,
            }),
            _ => None,
        };
        self.inputs.set(id, value)?;

        self.diagnostics.retain(
            |d| !matches!(d, Diagnostic::DomainViolation { param, .. } if *param == id),
        );
        if let Some(diag) = violation {
            warn!(param = id.name(), ?diag, "input outside declared domain");
            self.diagnostics.push(diag);
        }

        self.invalidate_id(id);
        Ok(())
    }

    pub fn set_scalar(&mut self, name: &str, value: f64) -> Result<(), NodeError> {
        self.set_input(name, value)
    }

    pub fn set_transform(&mut self, name: &str, value: Transform4) -> Result<(), NodeError> {
        self.set_input(name, value)
    }

    /// Mark every output that `changed` affects as stale. Returns the outputs touched.
    pub fn invalidate(&mut self, changed: &str) -> Result<Vec<ParamId>, NodeError> {
        let id = self.resolve(changed)?;
        Ok(self.invalidate_id(id))
    }

    fn invalidate_id(&mut self, changed: ParamId) -> Vec<ParamId> {
        let affected = self.schema.affected_by(changed).to_vec();
        for output in &affected {
            self.states.insert(*output, CacheState::Stale);
        }
        debug!(input = changed.name(), ?affected, "invalidated outputs");
        affected
    }

    /// Read one output, recomputing the pair first if that output is stale.
    pub fn get_output(&mut self, name: &str) -> Result<f64, NodeError> {
        let id = self.resolve_output(name)?;
        if self.states.get(&id) != Some(&CacheState::Fresh) {
            self.compute();
        }
        self.cached.get(id).ok_or_else(|| NodeError::NotAnOutput {
            name: name.to_string(),
        })
    }

    /// Read both outputs, recomputing once if either is stale.
    pub fn get_pair(&mut self) -> ScalePair {
        if self.states.values().any(|s| *s == CacheState::Stale) {
            self.compute();
        }
        self.cached
    }

    fn compute(&mut self) {
        let trace = solve_staged(&self.inputs, &self.solver);
        self.cached = trace.result;
        for state in self.states.values_mut() {
            *state = CacheState::Fresh;
        }
        self.computes += 1;

        self.diagnostics
            .retain(|d| !matches!(d, Diagnostic::DegenerateGeometry { .. }));
        if !trace.result.is_finite() {
            let diag = Diagnostic::DegenerateGeometry {
                chain_length: trace.chain_length,
                pair: trace.result,
            };
            warn!(?diag, "stretch ik produced a non-finite pair");
            self.diagnostics.push(diag);
        }
        debug!(
            up = trace.result.up,
            down = trace.result.down,
            computes = self.computes,
            "stretch ik recomputed"
        );
    }
}
