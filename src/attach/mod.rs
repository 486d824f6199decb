mod attacher;
mod augmented;

pub use attacher::{attach_volume, attach_volume_default, attach_volume_with};
pub use augmented::{
    AugmentedBody, ParameterResettable, ResetValues, VOLUME_NAMESPACE, is_volume_param,
};
