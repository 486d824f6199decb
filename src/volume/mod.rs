mod extension;
mod smpl;

pub use extension::VolumetricExtension;
pub use smpl::VolumetricSmpl;
