use std::num::NonZeroUsize;

use super::{BodyModelType, Gender, ParametricBody};
use crate::{
    Result, VolumeErr,
    storage::{Parameter, ParameterSet},
};

const MAX_BETAS: usize = 300;
const FULL_HAND_POSE: usize = 45;

/// A SMPL family body holding its kinematic parameters.
///
/// Every parameter is zero initialized, tracked and batched along the first axis.
#[derive(Debug, Clone)]
pub struct SmplBody {
    model_type: BodyModelType,
    gender: Gender,
    batch_size: usize,
    num_betas: usize,
    params: ParameterSet,
}

impl SmplBody {
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl ParametricBody for SmplBody {
    fn gender(&self) -> Gender {
        self.gender
    }

    fn model_type(&self) -> BodyModelType {
        self.model_type
    }

    fn num_betas(&self) -> usize {
        self.num_betas
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }
}

/// Builds a `SmplBody`.
#[derive(Debug, Clone)]
pub struct SmplBuilder {
    model_type: BodyModelType,
    gender: Gender,
    batch_size: NonZeroUsize,
    num_betas: usize,
    num_expression_coeffs: usize,
    num_pca_comps: Option<usize>,
}

impl Default for SmplBuilder {
    fn default() -> Self {
        Self {
            model_type: BodyModelType::Smpl,
            gender: Gender::Neutral,
            batch_size: NonZeroUsize::MIN,
            num_betas: 10,
            num_expression_coeffs: 10,
            num_pca_comps: Some(6),
        }
    }
}

impl SmplBuilder {
    /// Creates a new `SmplBuilder` for a neutral SMPL body with a batch of one.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_type(mut self, model_type: BodyModelType) -> Self {
        self.model_type = model_type;
        self
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn num_betas(mut self, num_betas: usize) -> Self {
        self.num_betas = num_betas;
        self
    }

    /// Only used by SMPL-X bodies.
    pub fn num_expression_coeffs(mut self, num_expression_coeffs: usize) -> Self {
        self.num_expression_coeffs = num_expression_coeffs;
        self
    }

    /// Hand pose as `n` PCA components, or the full axis-angle hand pose when `None`.
    /// Ignored by SMPL bodies.
    pub fn num_pca_comps(mut self, num_pca_comps: Option<usize>) -> Self {
        self.num_pca_comps = num_pca_comps;
        self
    }

    /// Builds the body with every parameter set to zero.
    ///
    /// # Returns
    /// An error if the shape code width is out of range.
    pub fn build(self) -> Result<SmplBody> {
        if self.num_betas == 0 || self.num_betas > MAX_BETAS {
            return Err(VolumeErr::InvalidConfig(format!(
                "num_betas must be in 1..={MAX_BETAS}, got {}",
                self.num_betas
            )));
        }

        let b = self.batch_size.get();
        let mut params = ParameterSet::new();

        params.insert("betas", Parameter::zeros(&[b, self.num_betas]));
        params.insert("global_orient", Parameter::zeros(&[b, 3]));
        params.insert(
            "body_pose",
            Parameter::zeros(&[b, self.model_type.num_body_joints() * 3]),
        );
        params.insert("transl", Parameter::zeros(&[b, 3]));

        if self.model_type.has_hands() {
            let hand = self.num_pca_comps.unwrap_or(FULL_HAND_POSE);
            params.insert("left_hand_pose", Parameter::zeros(&[b, hand]));
            params.insert("right_hand_pose", Parameter::zeros(&[b, hand]));
        }

        if self.model_type.has_face() {
            params.insert("jaw_pose", Parameter::zeros(&[b, 3]));
            params.insert("leye_pose", Parameter::zeros(&[b, 3]));
            params.insert("reye_pose", Parameter::zeros(&[b, 3]));
            params.insert(
                "expression",
                Parameter::zeros(&[b, self.num_expression_coeffs]),
            );
        }

        log::debug!(
            "built {} body: gender={} batch={b} params={}",
            self.model_type,
            self.gender,
            params.numel()
        );

        Ok(SmplBody {
            model_type: self.model_type,
            gender: self.gender,
            batch_size: b,
            num_betas: self.num_betas,
            params,
        })
    }
}
