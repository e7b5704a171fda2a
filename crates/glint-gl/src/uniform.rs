//! Uniform value model and the type→upload-path mapping.
//!
//! The target API exposes one upload entry point per (family, arity) pair and
//! uploading through the wrong one is undefined behavior, so the mapping from
//! a declared [`UniformType`] to the concrete [`UniformCall`] is exact:
//! mismatched arity or payload family is an error, never a silent cast. Bool
//! and sampler uniforms ride the integer path; matrices always upload with
//! the transpose flag fixed to `false`.

/// A uniform's declared type in the program interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    FloatVec2,
    FloatVec3,
    FloatVec4,
    Int,
    IntVec2,
    IntVec3,
    IntVec4,
    Bool,
    BoolVec2,
    BoolVec3,
    BoolVec4,
    FloatMat2,
    FloatMat3,
    FloatMat4,
    Sampler2d,
    SamplerCube,
}

/// A captured uniform value: scalar or array-shaped, per payload family.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformData {
    Float(f32),
    Int(i32),
    Bool(bool),
    FloatArray(Vec<f32>),
    IntArray(Vec<i32>),
    BoolArray(Vec<bool>),
}

/// A type-resolved upload, naming exactly one entry point of the API.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformCall {
    /// `uniform{components}f[v]`.
    Float { components: u8, data: Vec<f32> },
    /// `uniform{components}i[v]`; also carries bool and sampler uploads.
    Int { components: u8, data: Vec<i32> },
    /// `uniformMatrix{order}fv`.
    Matrix {
        order: u8,
        transpose: bool,
        data: Vec<f32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniformError {
    #[error("uniform type {ty:?} expects {expected} components, value has {found}")]
    ArityMismatch {
        ty: UniformType,
        expected: usize,
        found: usize,
    },

    #[error("uniform type {ty:?} is incompatible with the captured value shape")]
    DataKindMismatch { ty: UniformType },
}

impl UniformType {
    /// Component count for vector types, matrix order for matrix types.
    pub fn components(self) -> u8 {
        match self {
            UniformType::Float
            | UniformType::Int
            | UniformType::Bool
            | UniformType::Sampler2d
            | UniformType::SamplerCube => 1,
            UniformType::FloatVec2
            | UniformType::IntVec2
            | UniformType::BoolVec2
            | UniformType::FloatMat2 => 2,
            UniformType::FloatVec3
            | UniformType::IntVec3
            | UniformType::BoolVec3
            | UniformType::FloatMat3 => 3,
            UniformType::FloatVec4
            | UniformType::IntVec4
            | UniformType::BoolVec4
            | UniformType::FloatMat4 => 4,
        }
    }

    fn is_matrix(self) -> bool {
        matches!(
            self,
            UniformType::FloatMat2 | UniformType::FloatMat3 | UniformType::FloatMat4
        )
    }

    fn is_float(self) -> bool {
        matches!(
            self,
            UniformType::Float
                | UniformType::FloatVec2
                | UniformType::FloatVec3
                | UniformType::FloatVec4
        )
    }

    /// Resolve the captured value to its upload call.
    pub fn upload(self, data: &UniformData) -> Result<UniformCall, UniformError> {
        let expected = self.components() as usize;

        if self.is_matrix() {
            let values = match data {
                UniformData::FloatArray(v) => v,
                _ => return Err(UniformError::DataKindMismatch { ty: self }),
            };
            let len = expected * expected;
            if values.len() != len {
                return Err(UniformError::ArityMismatch {
                    ty: self,
                    expected: len,
                    found: values.len(),
                });
            }
            return Ok(UniformCall::Matrix {
                order: self.components(),
                transpose: false,
                data: values.clone(),
            });
        }

        if self.is_float() {
            let values = match data {
                UniformData::Float(v) if expected == 1 => vec![*v],
                UniformData::FloatArray(v) => v.clone(),
                _ => return Err(UniformError::DataKindMismatch { ty: self }),
            };
            if values.len() != expected {
                return Err(UniformError::ArityMismatch {
                    ty: self,
                    expected,
                    found: values.len(),
                });
            }
            return Ok(UniformCall::Float {
                components: self.components(),
                data: values,
            });
        }

        // Int, bool, and sampler families all upload as integers.
        let values = match data {
            UniformData::Int(v) if expected == 1 => vec![*v],
            UniformData::Bool(v) if expected == 1 => vec![i32::from(*v)],
            UniformData::IntArray(v) => v.clone(),
            UniformData::BoolArray(v) => v.iter().map(|b| i32::from(*b)).collect(),
            _ => return Err(UniformError::DataKindMismatch { ty: self }),
        };
        if values.len() != expected {
            return Err(UniformError::ArityMismatch {
                ty: self,
                expected,
                found: values.len(),
            });
        }
        Ok(UniformCall::Int {
            components: self.components(),
            data: values,
        })
    }
}
