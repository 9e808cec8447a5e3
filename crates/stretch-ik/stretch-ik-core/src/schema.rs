//! Parameter schema for the stretch IK node: names, kinds, defaults, domains and the
//! input → output "affects" relation used for invalidation.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::types::{ParamValue, Transform4};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamId {
    StartTransform,
    EndTransform,
    PoleVectorTransform,
    UpInitLength,
    DownInitLength,
    GlobalScale,
    Stretch,
    Slide,
    PoleVecLock,
    UpScale,
    DownScale,
}

impl ParamId {
    pub const INPUTS: [ParamId; 9] = [
        ParamId::StartTransform,
        ParamId::EndTransform,
        ParamId::PoleVectorTransform,
        ParamId::UpInitLength,
        ParamId::DownInitLength,
        ParamId::GlobalScale,
        ParamId::Stretch,
        ParamId::Slide,
        ParamId::PoleVecLock,
    ];

    pub const OUTPUTS: [ParamId; 2] = [ParamId::UpScale, ParamId::DownScale];

    /// Host-facing long name.
    pub fn name(self) -> &'static str {
        match self {
            ParamId::StartTransform => "startTransform",
            ParamId::EndTransform => "endTransform",
            ParamId::PoleVectorTransform => "poleVectorTransform",
            ParamId::UpInitLength => "upInitLength",
            ParamId::DownInitLength => "downInitLength",
            ParamId::GlobalScale => "globalScale",
            ParamId::Stretch => "stretch",
            ParamId::Slide => "slide",
            ParamId::PoleVecLock => "poleVecLock",
            ParamId::UpScale => "upScale",
            ParamId::DownScale => "downScale",
        }
    }

    pub fn kind(self) -> ParamKind {
        match self {
            ParamId::StartTransform | ParamId::EndTransform | ParamId::PoleVectorTransform => {
                ParamKind::Transform
            }
            _ => ParamKind::Scalar,
        }
    }

    #[inline]
    pub fn is_output(self) -> bool {
        matches!(self, ParamId::UpScale | ParamId::DownScale)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Scalar,
    Transform,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

/// Declaration of a single parameter, including the host attribute flags.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub id: ParamId,
    pub name: &'static str,
    pub short_name: &'static str,
    pub kind: ParamKind,
    pub direction: Direction,
    pub default: ParamValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub keyable: bool,
    pub storable: bool,
    pub writable: bool,
    pub doc: &'static str,
}

impl ParamSpec {
    /// `true` when `value` lies inside `[min, max]` (open ends are unbounded).
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Host bookkeeping used when registering the node type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeTypeInfo {
    pub type_id: u32,
    pub name: &'static str,
    pub version: &'static str,
}

pub const STRETCH_IK_NODE: NodeTypeInfo = NodeTypeInfo {
    type_id: 0x80015,
    name: "stretchIk",
    version: "1.0",
};

/// Which affects edges to declare.
///
/// `Literal` matches the historical declaration, in which `upScale` is not invalidated by
/// `globalScale` or `downInitLength`. `Corrected` declares every input the solver reads
/// against both outputs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffectsPolicy {
    #[default]
    Literal,
    Corrected,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AffectsEdge {
    pub input: ParamId,
    pub output: ParamId,
}

/// Validated, immutable parameter table.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub node_type: NodeTypeInfo,
    params: Vec<ParamSpec>,
    affects: Vec<AffectsEdge>,
    #[serde(skip)]
    by_name: HashMap<&'static str, ParamId>,
    #[serde(skip)]
    outputs_of: HashMap<ParamId, Vec<ParamId>>,
    #[serde(skip)]
    inputs_of: HashMap<ParamId, Vec<ParamId>>,
}

impl Schema {
    pub fn builder(node_type: NodeTypeInfo) -> SchemaBuilder {
        SchemaBuilder {
            node_type,
            params: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn edges(&self) -> &[AffectsEdge] {
        &self.affects
    }

    /// Resolve a long or short parameter name.
    pub fn lookup(&self, name: &str) -> Option<ParamId> {
        self.by_name.get(name).copied()
    }

    pub fn spec(&self, id: ParamId) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.id == id)
    }

    /// Outputs invalidated by a change to `input`.
    pub fn affected_by(&self, input: ParamId) -> &[ParamId] {
        self.outputs_of.get(&input).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Inputs declared as affecting `output`.
    pub fn dependencies_of(&self, output: ParamId) -> &[ParamId] {
        self.inputs_of.get(&output).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn outputs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params
            .iter()
            .filter(|p| p.direction == Direction::Output)
    }

    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self).map_err(|err| SchemaError::Export {
            reason: err.to_string(),
        })
    }
}

pub struct SchemaBuilder {
    node_type: NodeTypeInfo,
    params: Vec<ParamSpec>,
    edges: Vec<(ParamId, ParamId)>,
}

impl SchemaBuilder {
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn affects(mut self, input: ParamId, output: ParamId) -> Self {
        self.edges.push((input, output));
        self
    }

    /// Validate the declarations and freeze them into a [`Schema`].
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut by_name: HashMap<&'static str, ParamId> = HashMap::new();
        let mut directions: HashMap<ParamId, Direction> = HashMap::new();

        for spec in &self.params {
            if directions.insert(spec.id, spec.direction).is_some() {
                return Err(SchemaError::DuplicateId {
                    name: spec.name.to_string(),
                });
            }
            for name in [spec.name, spec.short_name] {
                if by_name.insert(name, spec.id).is_some() {
                    return Err(SchemaError::DuplicateName {
                        name: name.to_string(),
                    });
                }
            }
            if let (Some(min), Some(max)) = (spec.min, spec.max) {
                if min > max {
                    return Err(SchemaError::InvertedDomain {
                        name: spec.name.to_string(),
                        min,
                        max,
                    });
                }
            }
            if spec.default.kind() != spec.kind || spec.id.kind() != spec.kind {
                return Err(SchemaError::KindMismatch {
                    name: spec.name.to_string(),
                });
            }
            if spec.id.is_output() != (spec.direction == Direction::Output) {
                return Err(SchemaError::DirectionMismatch {
                    name: spec.name.to_string(),
                });
            }
        }

        let mut affects: Vec<AffectsEdge> = Vec::with_capacity(self.edges.len());
        let mut outputs_of: HashMap<ParamId, Vec<ParamId>> = HashMap::new();
        let mut inputs_of: HashMap<ParamId, Vec<ParamId>> = HashMap::new();
        for (input, output) in self.edges {
            let input_dir = directions
                .get(&input)
                .ok_or_else(|| SchemaError::UndeclaredParameter {
                    name: input.name().to_string(),
                })?;
            let output_dir = directions
                .get(&output)
                .ok_or_else(|| SchemaError::UndeclaredParameter {
                    name: output.name().to_string(),
                })?;
            if *input_dir != Direction::Input || *output_dir != Direction::Output {
                return Err(SchemaError::InvalidEdge {
                    input: input.name().to_string(),
                    output: output.name().to_string(),
                });
            }
            let edge = AffectsEdge { input, output };
            if affects.contains(&edge) {
                continue;
            }
            affects.push(edge);
            outputs_of.entry(input).or_default().push(output);
            inputs_of.entry(output).or_default().push(input);
        }

        Ok(Schema {
            node_type: self.node_type,
            params: self.params,
            affects,
            by_name,
            outputs_of,
            inputs_of,
        })
    }
}

// Helpers
fn transform_in(id: ParamId, short_name: &'static str, doc: &'static str) -> ParamSpec {
    ParamSpec {
        id,
        name: id.name(),
        short_name,
        kind: ParamKind::Transform,
        direction: Direction::Input,
        default: ParamValue::Transform(Transform4::identity()),
        min: None,
        max: None,
        keyable: true,
        storable: true,
        writable: true,
        doc,
    }
}

fn scalar_in(
    id: ParamId,
    short_name: &'static str,
    min: Option<f64>,
    max: Option<f64>,
    doc: &'static str,
) -> ParamSpec {
    ParamSpec {
        id,
        name: id.name(),
        short_name,
        kind: ParamKind::Scalar,
        direction: Direction::Input,
        default: ParamValue::Scalar(0.0),
        min,
        max,
        keyable: true,
        storable: true,
        writable: true,
        doc,
    }
}

fn scalar_out(id: ParamId, short_name: &'static str, doc: &'static str) -> ParamSpec {
    ParamSpec {
        id,
        name: id.name(),
        short_name,
        kind: ParamKind::Scalar,
        direction: Direction::Output,
        default: ParamValue::Scalar(1.0),
        min: None,
        max: None,
        keyable: false,
        storable: false,
        writable: false,
        doc,
    }
}

/// Build the stretch IK schema with the requested affects declaration.
pub fn stretch_ik_schema(policy: AffectsPolicy) -> Result<Schema, SchemaError> {
    use ParamId::*;

    let mut builder = Schema::builder(STRETCH_IK_NODE)
        .param(transform_in(StartTransform, "stm", "World transform of the chain root."))
        .param(transform_in(EndTransform, "enm", "World transform of the chain tip."))
        .param(transform_in(
            PoleVectorTransform,
            "pvm",
            "World transform of the pole-vector locator.",
        ))
        .param(scalar_in(
            UpInitLength,
            "uil",
            Some(0.0),
            None,
            "Rest length of the proximal segment.",
        ))
        .param(scalar_in(
            DownInitLength,
            "dil",
            Some(0.0),
            None,
            "Rest length of the distal segment.",
        ))
        .param(scalar_in(
            GlobalScale,
            "gls",
            Some(0.001),
            None,
            "Uniform rig scale.",
        ))
        .param(scalar_in(
            Stretch,
            "str",
            Some(0.0),
            Some(1.0),
            "0 keeps rest length, 1 follows the target fully.",
        ))
        .param(scalar_in(
            Slide,
            "sld",
            Some(-1.0),
            Some(1.0),
            "Shifts length between the segments; the sign picks the growing one.",
        ))
        .param(scalar_in(
            PoleVecLock,
            "pvl",
            Some(0.0),
            Some(1.0),
            "Blend towards snapping both segments onto the pole vector.",
        ))
        .param(scalar_out(UpScale, "ups", "Length of the proximal segment."))
        .param(scalar_out(DownScale, "dws", "Length of the distal segment."));

    for input in [
        StartTransform,
        EndTransform,
        Stretch,
        Slide,
        PoleVecLock,
        PoleVectorTransform,
        UpInitLength,
    ] {
        builder = builder.affects(input, UpScale);
    }
    for input in [
        StartTransform,
        EndTransform,
        Stretch,
        Slide,
        PoleVecLock,
        PoleVectorTransform,
        GlobalScale,
        DownInitLength,
    ] {
        builder = builder.affects(input, DownScale);
    }

    if policy == AffectsPolicy::Corrected {
        builder = builder
            .affects(GlobalScale, UpScale)
            .affects(DownInitLength, UpScale)
            .affects(UpInitLength, DownScale);
    }

    builder.build()
}
