mod device;
mod grad;
mod parameter;
mod set;

pub use device::Device;
pub use grad::{is_grad_enabled, no_grad};
pub use parameter::Parameter;
pub use set::ParameterSet;
