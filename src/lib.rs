pub mod attach;
pub mod body;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod initialization;
pub mod storage;
pub mod volume;

pub use attach::{
    AugmentedBody, ParameterResettable, ResetValues, attach_volume, attach_volume_default,
    attach_volume_with,
};
pub use config::{AttachConfig, ReattachPolicy};
pub use error::{Result, VolumeErr};
