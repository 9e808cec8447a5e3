//! Value types shared by the schema, the solver and the node.

use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::NodeError;
use crate::schema::{ParamId, ParamKind};

/// 4x4 affine transform in host layout.
///
/// Hosts use the row-vector convention, so the world position lives in the last row
/// (`m[3][0..3]`). Element `(r, c)` of the backing matrix is row `r`, column `c` of the host
/// matrix.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformRepr", into = "TransformRepr")]
pub struct Transform4(Matrix4<f64>);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TransformRepr {
    Rows { rows: [[f64; 4]; 4] },
    Translate { translate: [f64; 3] },
}

impl From<TransformRepr> for Transform4 {
    fn from(repr: TransformRepr) -> Self {
        match repr {
            TransformRepr::Rows { rows } => Transform4::from_rows(rows),
            TransformRepr::Translate { translate: [x, y, z] } => {
                Transform4::from_translation(x, y, z)
            }
        }
    }
}

impl From<Transform4> for TransformRepr {
    fn from(t: Transform4) -> Self {
        TransformRepr::Rows { rows: t.to_rows() }
    }
}

impl Default for Transform4 {
    fn default() -> Self {
        Transform4::identity()
    }
}

impl Transform4 {
    pub fn identity() -> Self {
        Transform4(Matrix4::identity())
    }

    /// Build from host rows (translation in the last row).
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut m = Matrix4::zeros();
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                m[(r, c)] = *v;
            }
        }
        Transform4(m)
    }

    /// Identity rotation/scale placed at `(x, y, z)`.
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(3, 0)] = x;
        m[(3, 1)] = y;
        m[(3, 2)] = z;
        Transform4(m)
    }

    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.0[(r, c)];
            }
        }
        rows
    }

    /// World position carried by the transform.
    #[inline]
    pub fn translation(&self) -> Vector3<f64> {
        Vector3::new(self.0[(3, 0)], self.0[(3, 1)], self.0[(3, 2)])
    }
}

/// A parameter value as supplied by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ParamValue {
    Scalar(f64),
    Transform(Transform4),
}

impl ParamValue {
    #[inline]
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Scalar(_) => ParamKind::Scalar,
            ParamValue::Transform(_) => ParamKind::Transform,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ParamValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Scalar(v)
    }
}

impl From<Transform4> for ParamValue {
    fn from(t: Transform4) -> Self {
        ParamValue::Transform(t)
    }
}

/// Snapshot of every input the solver reads during one evaluation.
///
/// Missing fields deserialize to the schema defaults (identity transforms, zero scalars).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverInputs {
    pub start_transform: Transform4,
    pub end_transform: Transform4,
    pub pole_vector_transform: Transform4,
    pub up_init_length: f64,
    pub down_init_length: f64,
    pub global_scale: f64,
    pub stretch: f64,
    pub slide: f64,
    pub pole_vec_lock: f64,
}

impl SolverInputs {
    /// Read an input by id. Returns `None` for outputs.
    pub fn get(&self, id: ParamId) -> Option<ParamValue> {
        use ParamId::*;
        let value = match id {
            StartTransform => ParamValue::Transform(self.start_transform),
            EndTransform => ParamValue::Transform(self.end_transform),
            PoleVectorTransform => ParamValue::Transform(self.pole_vector_transform),
            UpInitLength => ParamValue::Scalar(self.up_init_length),
            DownInitLength => ParamValue::Scalar(self.down_init_length),
            GlobalScale => ParamValue::Scalar(self.global_scale),
            Stretch => ParamValue::Scalar(self.stretch),
            Slide => ParamValue::Scalar(self.slide),
            PoleVecLock => ParamValue::Scalar(self.pole_vec_lock),
            UpScale | DownScale => return None,
        };
        Some(value)
    }

    /// Overwrite one input. Outputs and kind mismatches are rejected.
    pub fn set(&mut self, id: ParamId, value: ParamValue) -> Result<(), NodeError> {
        use ParamId::*;
        if id.is_output() {
            return Err(NodeError::NotWritable {
                name: id.name().to_string(),
            });
        }
        let expected = id.kind();
        let mismatch = || NodeError::TypeMismatch {
            name: id.name().to_string(),
            expected,
            actual: value.kind(),
        };
        match (id, &value) {
            (StartTransform, ParamValue::Transform(t)) => self.start_transform = *t,
            (EndTransform, ParamValue::Transform(t)) => self.end_transform = *t,
            (PoleVectorTransform, ParamValue::Transform(t)) => self.pole_vector_transform = *t,
            (UpInitLength, ParamValue::Scalar(v)) => self.up_init_length = *v,
            (DownInitLength, ParamValue::Scalar(v)) => self.down_init_length = *v,
            (GlobalScale, ParamValue::Scalar(v)) => self.global_scale = *v,
            (Stretch, ParamValue::Scalar(v)) => self.stretch = *v,
            (Slide, ParamValue::Scalar(v)) => self.slide = *v,
            (PoleVecLock, ParamValue::Scalar(v)) => self.pole_vec_lock = *v,
            _ => return Err(mismatch()),
        }
        Ok(())
    }
}

/// The solver output: absolute segment lengths for the proximal and distal bones.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalePair {
    pub up: f64,
    pub down: f64,
}

impl Default for ScalePair {
    fn default() -> Self {
        ScalePair { up: 1.0, down: 1.0 }
    }
}

impl ScalePair {
    pub fn new(up: f64, down: f64) -> Self {
        ScalePair { up, down }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.up.is_finite() && self.down.is_finite()
    }

    /// Pick the half of the pair that backs `id`.
    pub fn get(&self, id: ParamId) -> Option<f64> {
        match id {
            ParamId::UpScale => Some(self.up),
            ParamId::DownScale => Some(self.down),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_reads_last_row() {
        let t = Transform4::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [4.0, 5.0, 6.0, 1.0],
        ]);
        assert_eq!(t.translation(), Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(t, Transform4::from_translation(4.0, 5.0, 6.0));
    }

    #[test]
    fn transform_accepts_translate_shorthand() {
        let t: Transform4 = serde_json::from_str(r#"{ "translate": [1.0, 2.0, 3.0] }"#).unwrap();
        assert_eq!(t.translation(), Vector3::new(1.0, 2.0, 3.0));

        let json = serde_json::to_value(t).unwrap();
        assert_eq!(json["rows"][3], serde_json::json!([1.0, 2.0, 3.0, 1.0]));
    }

    #[test]
    fn inputs_fill_missing_fields_with_defaults() {
        let inputs: SolverInputs =
            serde_json::from_str(r#"{ "upInitLength": 5.0, "poleVecLock": 0.5 }"#).unwrap();
        assert_eq!(inputs.up_init_length, 5.0);
        assert_eq!(inputs.pole_vec_lock, 0.5);
        assert_eq!(inputs.global_scale, 0.0);
        assert_eq!(inputs.start_transform, Transform4::identity());
    }

    #[test]
    fn set_rejects_outputs_and_wrong_kinds() {
        let mut inputs = SolverInputs::default();
        assert!(matches!(
            inputs.set(ParamId::UpScale, ParamValue::Scalar(2.0)),
            Err(NodeError::NotWritable { .. })
        ));
        assert!(matches!(
            inputs.set(ParamId::Stretch, Transform4::identity().into()),
            Err(NodeError::TypeMismatch { .. })
        ));
        inputs.set(ParamId::Slide, ParamValue::Scalar(-0.25)).unwrap();
        assert_eq!(inputs.get(ParamId::Slide), Some(ParamValue::Scalar(-0.25)));
        assert_eq!(inputs.get(ParamId::DownScale), None);
    }
}
