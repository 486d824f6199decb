use super::{BodyModelType, Gender};
use crate::storage::{Device, ParameterSet};

/// The capabilities a host body model must offer to be augmented with a volumetric extension.
///
/// The body owns its kinematic parameters (pose, shape, orientation, translation, ...),
/// how they drive the mesh is up to the implementor.
pub trait ParametricBody {
    fn gender(&self) -> Gender;

    fn model_type(&self) -> BodyModelType;

    /// Amount of joints in the kinematic tree.
    fn num_joints(&self) -> usize {
        self.model_type().num_joints()
    }

    /// Width of the shape code.
    fn num_betas(&self) -> usize;

    fn parameters(&self) -> &ParameterSet;

    fn parameters_mut(&mut self) -> &mut ParameterSet;

    /// Moves every parameter of the body to `device`.
    fn to_device(&mut self, device: Device) {
        self.parameters_mut().to_device(device);
    }
}
