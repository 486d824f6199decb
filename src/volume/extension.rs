use crate::{
    Result,
    body::ParametricBody,
    checkpoint::{self, LoadPolicy, LoadReport, StateDict},
    storage::{Device, ParameterSet},
};

/// A learned volumetric module keyed to the pose and shape parameters of a body.
///
/// How the module evaluates occupancy or distances is up to the implementor,
/// the attacher only needs to build it, identify it and restore its weights.
pub trait VolumetricExtension: Sized {
    /// Builds a freshly initialized extension, deriving whatever geometry it needs from `body`.
    fn from_body<B: ParametricBody>(body: &B) -> Result<Self>;

    /// The variant identifier used to select pretrained checkpoints.
    fn model_type(&self) -> &str;

    fn parameters(&self) -> &ParameterSet;

    fn parameters_mut(&mut self) -> &mut ParameterSet;

    /// Restores the parameters from a stored state dict.
    ///
    /// # Arguments
    /// * `state` - The stored tensors, by parameter name.
    /// * `policy` - How to treat names that only exist on one side.
    ///
    /// # Returns
    /// What was restored, or an error leaving every parameter untouched.
    fn load_state_dict(&mut self, state: &StateDict, policy: LoadPolicy) -> Result<LoadReport> {
        checkpoint::load_state_dict(self.parameters_mut(), state, policy)
    }

    /// A snapshot of every parameter's values.
    fn state_dict(&self) -> StateDict {
        self.parameters()
            .iter()
            .map(|(name, param)| (name.to_string(), param.data().clone()))
            .collect()
    }

    fn to_device(&mut self, device: Device) {
        self.parameters_mut().to_device(device);
    }
}
