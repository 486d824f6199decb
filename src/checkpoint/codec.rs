use std::collections::{BTreeMap, HashMap};

use half::{bf16, f16};
use ndarray::{ArrayD, IxDyn};
use safetensors::tensor::{self, Dtype, SafeTensors, TensorView};

use crate::{Result, VolumeErr};

/// Key prefix of the tensors making up a checkpoint's `state_dict` field.
pub const STATE_DICT_PREFIX: &str = "state_dict.";

/// A mapping from parameter name to weight tensor.
pub type StateDict = BTreeMap<String, ArrayD<f32>>;

/// A decoded checkpoint.
///
/// Checkpoints are safetensors files, the `state_dict` field is made of every
/// tensor stored under the `state_dict.` prefix. Any other tensor is kept
/// aside in `extras`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Checkpoint {
    pub state_dict: StateDict,
    pub extras: StateDict,
    pub metadata: HashMap<String, String>,
}

impl Checkpoint {
    /// Creates a new `Checkpoint` holding only a state dict.
    pub fn new(state_dict: StateDict) -> Self {
        Self {
            state_dict,
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Decodes a checkpoint from the raw bytes of a safetensors file.
    ///
    /// # Arguments
    /// * `bytes` - The serialized checkpoint.
    ///
    /// # Returns
    /// An error if the bytes aren't a valid safetensors file, a tensor has an
    /// unsupported element type or there is no `state_dict` field.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let tensors = SafeTensors::deserialize(bytes)?;
        let (_, header) = SafeTensors::read_metadata(bytes)?;

        let mut checkpoint = Self {
            metadata: header.metadata().clone().unwrap_or_default(),
            ..Default::default()
        };

        for (key, view) in tensors.tensors() {
            let values = to_f32(&key, view.dtype(), view.data())?;
            let tensor = ArrayD::from_shape_vec(IxDyn(view.shape()), values)
                .map_err(|e| VolumeErr::CheckpointDecode(format!("tensor {key}: {e}")))?;

            match key.strip_prefix(STATE_DICT_PREFIX) {
                Some(name) => checkpoint.state_dict.insert(name.to_string(), tensor),
                None => checkpoint.extras.insert(key, tensor),
            };
        }

        if checkpoint.state_dict.is_empty() {
            return Err(VolumeErr::CheckpointDecode(
                "the checkpoint has no state_dict".to_string(),
            ));
        }

        Ok(checkpoint)
    }

    /// Encodes the checkpoint as a safetensors file with f32 elements.
    ///
    /// # Returns
    /// The serialized bytes or an error if safetensors rejects the layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let buffers: Vec<(String, Vec<usize>, Vec<u8>)> = self
            .state_dict
            .iter()
            .map(|(name, tensor)| (format!("{STATE_DICT_PREFIX}{name}"), tensor))
            .chain(self.extras.iter().map(|(name, tensor)| (name.clone(), tensor)))
            .map(|(key, tensor)| {
                let bytes = tensor.iter().flat_map(|v| v.to_le_bytes()).collect();
                (key, tensor.shape().to_vec(), bytes)
            })
            .collect();

        let views = buffers
            .iter()
            .map(|(key, shape, bytes)| {
                let view = TensorView::new(Dtype::F32, shape.clone(), bytes)?;
                Ok((key.as_str(), view))
            })
            .collect::<Result<Vec<_>>>()?;

        let metadata = (!self.metadata.is_empty()).then(|| self.metadata.clone());
        Ok(tensor::serialize(views, &metadata)?)
    }
}

/// Converts little endian raw tensor data into f32 values.
fn to_f32(key: &str, dtype: Dtype, data: &[u8]) -> Result<Vec<f32>> {
    let values = match dtype {
        Dtype::F32 => data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        Dtype::F64 => data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect(),
        Dtype::F16 => data
            .chunks_exact(2)
            .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
        Dtype::BF16 => data
            .chunks_exact(2)
            .map(|c| bf16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
        other => {
            return Err(VolumeErr::CheckpointDecode(format!(
                "tensor {key} has unsupported dtype {other:?}"
            )));
        }
    };

    Ok(values)
}
