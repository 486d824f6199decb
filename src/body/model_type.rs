use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::VolumeErr;

/// The family of a parametric body model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyModelType {
    #[default]
    Smpl,
    SmplH,
    SmplX,
}

impl BodyModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyModelType::Smpl => "smpl",
            BodyModelType::SmplH => "smplh",
            BodyModelType::SmplX => "smplx",
        }
    }

    /// Amount of joints in the kinematic tree, the root included.
    pub fn num_joints(&self) -> usize {
        match self {
            BodyModelType::Smpl => 24,
            BodyModelType::SmplH => 52,
            BodyModelType::SmplX => 55,
        }
    }

    /// Amount of axis-angle body joints, the root and the hands excluded.
    pub fn num_body_joints(&self) -> usize {
        match self {
            BodyModelType::Smpl => 23,
            BodyModelType::SmplH | BodyModelType::SmplX => 21,
        }
    }

    pub fn has_hands(&self) -> bool {
        !matches!(self, BodyModelType::Smpl)
    }

    pub fn has_face(&self) -> bool {
        matches!(self, BodyModelType::SmplX)
    }
}

impl Display for BodyModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyModelType {
    type Err = VolumeErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smpl" => Ok(BodyModelType::Smpl),
            "smplh" => Ok(BodyModelType::SmplH),
            "smplx" => Ok(BodyModelType::SmplX),
            other => Err(VolumeErr::InvalidConfig(format!(
                "unknown body model type: {other}"
            ))),
        }
    }
}
