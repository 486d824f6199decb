use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use crate::initialization::RandErr;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, VolumeErr>;

/// Every failure that can surface from attaching, hydrating or resetting a body.
#[derive(Debug)]
pub enum VolumeErr {
    /// The checkpoint resource could not be retrieved.
    CheckpointFetch { url: String, reason: String },
    /// The retrieved bytes are not a usable checkpoint.
    CheckpointDecode(String),
    /// A stored tensor doesn't have the shape of the parameter it should restore.
    CheckpointShapeMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// The stored names and the extension's names differ under a strict load.
    CheckpointKeyMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    /// A supplied value can't be written into the parameter it names.
    ParameterShapeMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// The body already carries a volumetric extension.
    AttachmentConflict { model_type: String },
    /// An in-place write on a gradient tracked parameter outside of a no-grad scope.
    GradTracked { name: String },
    /// A write addressed to a parameter that doesn't exist.
    UnknownParameter { name: String },
    InvalidConfig(String),
    Init(RandErr),
    Io(io::Error),
}

impl Display for VolumeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeErr::CheckpointFetch { url, reason } => {
                write!(f, "failed to fetch checkpoint from {url}: {reason}")
            }
            VolumeErr::CheckpointDecode(msg) => write!(f, "invalid checkpoint: {msg}"),
            VolumeErr::CheckpointShapeMismatch {
                name,
                expected,
                got,
            } => write!(
                f,
                "checkpoint tensor {name} has shape {got:?}, expected {expected:?}"
            ),
            VolumeErr::CheckpointKeyMismatch {
                missing,
                unexpected,
            } => write!(
                f,
                "checkpoint keys don't match the extension, missing {missing:?}, unexpected {unexpected:?}"
            ),
            VolumeErr::ParameterShapeMismatch {
                name,
                expected,
                got,
            } => write!(
                f,
                "value for parameter {name} has shape {got:?}, expected {expected:?}"
            ),
            VolumeErr::AttachmentConflict { model_type } => write!(
                f,
                "the body already carries a volumetric extension of type {model_type}"
            ),
            VolumeErr::GradTracked { name } => write!(
                f,
                "parameter {name} requires grad and can't be written in place while gradients are tracked"
            ),
            VolumeErr::UnknownParameter { name } => {
                write!(f, "there is no parameter named {name}")
            }
            VolumeErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            VolumeErr::Init(e) => write!(f, "parameter initialization failed: {e}"),
            VolumeErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for VolumeErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            VolumeErr::Init(e) => Some(e),
            VolumeErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for VolumeErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RandErr> for VolumeErr {
    fn from(value: RandErr) -> Self {
        Self::Init(value)
    }
}

impl From<safetensors::SafeTensorError> for VolumeErr {
    fn from(value: safetensors::SafeTensorError) -> Self {
        Self::CheckpointDecode(value.to_string())
    }
}
