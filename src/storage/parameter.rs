use ndarray::{ArrayD, IxDyn};

use super::{Device, is_grad_enabled};
use crate::{Result, VolumeErr};

/// A learnable tensor together with its placement and tracking state.
///
/// The values can only be written through the owning `ParameterSet`, which
/// knows the parameter's name and enforces the gradient mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    data: ArrayD<f32>,
    device: Device,
    requires_grad: bool,
    version: u64,
}

impl Parameter {
    /// Creates a new `Parameter` placed on the cpu.
    ///
    /// # Arguments
    /// * `data` - The initial values.
    /// * `requires_grad` - Whether in-place writes must happen inside a no-grad scope.
    ///
    /// # Returns
    /// A new `Parameter` instance.
    pub fn new(data: ArrayD<f32>, requires_grad: bool) -> Self {
        Self {
            data,
            device: Device::Cpu,
            requires_grad,
            version: 0,
        }
    }

    /// Creates a new tracked `Parameter` filled with zeros.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::new(ArrayD::zeros(IxDyn(shape)), true)
    }

    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    pub fn set_requires_grad(&mut self, requires_grad: bool) {
        self.requires_grad = requires_grad;
    }

    /// Amount of in-place writes this parameter went through.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Moves the parameter to `device`, the values are left as they are.
    pub fn to_device(&mut self, device: Device) {
        self.device = device;
    }

    /// Whether `value` fits this parameter.
    ///
    /// The shapes must be equal, except that a value may leave out a leading
    /// batch axis of size one: `[3]` fits `[1, 3]` but neither `[1]` fits `[10]`
    /// nor `[3]` fits `[4, 3]`.
    pub fn accepts(&self, value: &ArrayD<f32>) -> bool {
        let shape = self.shape();
        value.shape() == shape || (shape.first() == Some(&1) && value.shape() == &shape[1..])
    }

    /// Overwrites the values with `value`, which must fit this parameter.
    pub(super) fn assign(&mut self, name: &str, value: &ArrayD<f32>) -> Result<()> {
        let view = self
            .accepts(value)
            .then(|| value.broadcast(self.data.raw_dim()))
            .flatten();
        let Some(view) = view else {
            return Err(VolumeErr::ParameterShapeMismatch {
                name: name.to_string(),
                expected: self.shape().to_vec(),
                got: value.shape().to_vec(),
            });
        };

        self.check_writable(name)?;
        self.data.assign(&view);
        self.version += 1;
        Ok(())
    }

    /// Overwrites every value with `value`.
    pub(super) fn fill(&mut self, name: &str, value: f32) -> Result<()> {
        self.check_writable(name)?;
        self.data.fill(value);
        self.version += 1;
        Ok(())
    }

    fn check_writable(&self, name: &str) -> Result<()> {
        if self.requires_grad && is_grad_enabled() {
            return Err(VolumeErr::GradTracked {
                name: name.to_string(),
            });
        }

        Ok(())
    }
}
