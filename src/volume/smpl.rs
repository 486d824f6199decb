use std::{cell::RefCell, rc::Rc};

use rand::{SeedableRng, rngs::StdRng};

use super::VolumetricExtension;
use crate::{
    Result,
    body::{BodyModelType, ParametricBody},
    initialization::{ConstParamGen, ParamGen, RandParamGen},
    storage::{Parameter, ParameterSet},
};

const LATENT: usize = 8;
const HIDDEN: usize = 32;
const INIT_SEED: u64 = 0x5eed;

/// The volumetric extension of the SMPL body family.
///
/// One latent code is encoded per body part from query points and the shape
/// code, a shared decoder maps the codes to occupancy.
#[derive(Debug, Clone)]
pub struct VolumetricSmpl {
    model_type: BodyModelType,
    num_parts: usize,
    shape_dim: usize,
    params: ParameterSet,
}

impl VolumetricSmpl {
    /// Amount of body parts, one per joint of the body.
    pub fn num_parts(&self) -> usize {
        self.num_parts
    }

    /// Width of the shape code the part encoder consumes.
    pub fn shape_dim(&self) -> usize {
        self.shape_dim
    }

    pub fn body_model_type(&self) -> BodyModelType {
        self.model_type
    }
}

fn init(param_gen: &mut impl ParamGen, shape: &[usize]) -> Result<Parameter> {
    Ok(Parameter::new(param_gen.tensor(shape)?, true))
}

impl VolumetricExtension for VolumetricSmpl {
    fn from_body<B: ParametricBody>(body: &B) -> Result<Self> {
        let num_parts = body.num_joints();
        let shape_dim = body.num_betas();
        let encoder_in = 3 + shape_dim;

        let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(INIT_SEED)));
        let mut zeros = ConstParamGen::zeros();

        let mut params = ParameterSet::new();
        let mut encoder = RandParamGen::kaiming(Rc::clone(&rng), encoder_in)?;
        params.insert(
            "part_encoder.weight",
            init(&mut encoder, &[num_parts, LATENT, encoder_in])?,
        );
        params.insert(
            "part_encoder.bias",
            init(&mut zeros, &[num_parts, LATENT])?,
        );

        let mut hidden = RandParamGen::xavier_uniform(Rc::clone(&rng), LATENT + 3, HIDDEN)?;
        params.insert(
            "decoder.0.weight",
            init(&mut hidden, &[HIDDEN, LATENT + 3])?,
        );
        params.insert("decoder.0.bias", init(&mut zeros, &[HIDDEN])?);

        let mut out = RandParamGen::xavier_uniform(rng, HIDDEN, 1)?;
        params.insert("decoder.1.weight", init(&mut out, &[1, HIDDEN])?);
        params.insert("decoder.1.bias", init(&mut zeros, &[1])?);

        Ok(Self {
            model_type: body.model_type(),
            num_parts,
            shape_dim,
            params,
        })
    }

    fn model_type(&self) -> &str {
        self.model_type.as_str()
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        body::{Gender, SmplBuilder},
        checkpoint::LoadPolicy,
    };

    fn create_test_volume(model_type: BodyModelType) -> VolumetricSmpl {
        let body = SmplBuilder::new().model_type(model_type).build().unwrap();
        VolumetricSmpl::from_body(&body).unwrap()
    }

    #[test]
    fn derived_from_body() {
        let volume = create_test_volume(BodyModelType::SmplX);

        assert_eq!(volume.model_type(), "smplx");
        assert_eq!(volume.num_parts(), 55);
        assert_eq!(volume.shape_dim(), 10);
        assert_eq!(
            volume.parameters().get("part_encoder.weight").unwrap().shape(),
            &[55, LATENT, 13]
        );
    }

    #[test]
    fn parameter_names() {
        let volume = create_test_volume(BodyModelType::Smpl);
        let names: Vec<_> = volume.parameters().names().collect();

        assert_eq!(
            names,
            [
                "part_encoder.weight",
                "part_encoder.bias",
                "decoder.0.weight",
                "decoder.0.bias",
                "decoder.1.weight",
                "decoder.1.bias",
            ]
        );
    }

    #[test]
    fn deterministic_init() {
        let a = create_test_volume(BodyModelType::Smpl);
        let b = create_test_volume(BodyModelType::Smpl);

        assert_eq!(a.parameters(), b.parameters());
    }

    #[test]
    fn weights_not_trivial() {
        let volume = create_test_volume(BodyModelType::Smpl);
        let weight = volume.parameters().get("decoder.0.weight").unwrap();

        assert!(weight.data().iter().any(|&v| v != 0.));
        assert!(weight.requires_grad());
    }

    #[test]
    fn gender_independent_shapes() {
        let male = SmplBuilder::new().gender(Gender::Male).build().unwrap();
        let female = SmplBuilder::new().gender(Gender::Female).build().unwrap();

        let a = VolumetricSmpl::from_body(&male).unwrap();
        let b = VolumetricSmpl::from_body(&female).unwrap();

        assert_eq!(a.parameters(), b.parameters());
    }

    #[test]
    fn state_dict_restores() {
        let mut volume = create_test_volume(BodyModelType::SmplH);
        let mut state = volume.state_dict();
        state
            .values_mut()
            .for_each(|tensor| tensor.mapv_inplace(|v| v + 1.));

        let report = volume.load_state_dict(&state, LoadPolicy::Strict).unwrap();

        assert!(report.is_complete());
        assert_eq!(volume.state_dict(), state);
    }
}
