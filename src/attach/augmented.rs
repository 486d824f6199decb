use std::collections::BTreeMap;

use ndarray::{Array, ArrayD, Dimension, arr1};

use crate::{
    Result,
    body::{Gender, ParametricBody},
    storage::{Device, Parameter, no_grad},
    volume::VolumetricExtension,
};

/// The name the extension is attached under, it prefixes its parameter names.
pub const VOLUME_NAMESPACE: &str = "volume";

/// Whether `name` belongs to the attached extension.
pub fn is_volume_param(name: &str) -> bool {
    name.strip_prefix(VOLUME_NAMESPACE)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

/// Something whose kinematic parameters can be reset in bulk.
pub trait ParameterResettable {
    /// Sets every resettable parameter to the supplied value, or to zero when none is supplied.
    ///
    /// # Arguments
    /// * `values` - Values by parameter name.
    ///
    /// # Returns
    /// An error, with nothing written, if any supplied value doesn't fit its parameter.
    fn reset_params(&mut self, values: &ResetValues) -> Result<()>;
}

/// Values to reset parameters to, by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetValues(BTreeMap<String, ArrayD<f32>>);

impl ResetValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<D: Dimension>(mut self, name: impl Into<String>, value: Array<f32, D>) -> Self {
        self.insert(name, value);
        self
    }

    /// Same as `with` for a flat list of values.
    pub fn with_values(self, name: impl Into<String>, values: &[f32]) -> Self {
        self.with(name, arr1(values))
    }

    pub fn insert<D: Dimension>(&mut self, name: impl Into<String>, value: Array<f32, D>) {
        self.0.insert(name.into(), value.into_dyn());
    }

    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArrayD<f32>)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ArrayD<f32>)> for ResetValues {
    fn from_iter<I: IntoIterator<Item = (String, ArrayD<f32>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A parametric body carrying a volumetric extension.
///
/// The combined parameters are the body's under their own names followed by
/// the extension's under the `volume.` namespace. Resetting only ever touches
/// the body's side.
#[derive(Debug, Clone)]
pub struct AugmentedBody<B, V> {
    pub(super) body: B,
    pub(super) volume: V,
}

impl<B: ParametricBody, V: VolumetricExtension> AugmentedBody<B, V> {
    pub(super) fn new(body: B, volume: V) -> Self {
        Self { body, volume }
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn volume(&self) -> &V {
        &self.volume
    }

    pub fn volume_mut(&mut self) -> &mut V {
        &mut self.volume
    }

    pub fn gender(&self) -> Gender {
        self.body.gender()
    }

    /// Every parameter of the body and the extension, by combined name.
    pub fn named_parameters(&self) -> Vec<(String, &Parameter)> {
        let body = self
            .body
            .parameters()
            .iter()
            .map(|(name, param)| (name.to_string(), param));

        let volume = self
            .volume
            .parameters()
            .iter()
            .map(|(name, param)| (format!("{VOLUME_NAMESPACE}.{name}"), param));

        body.chain(volume).collect()
    }

    /// Looks a parameter up by combined name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        match name.strip_prefix(VOLUME_NAMESPACE).and_then(|rest| rest.strip_prefix('.')) {
            Some(rest) => self.volume.parameters().get(rest),
            None => self.body.parameters().get(name),
        }
    }

    /// Moves the body together with the extension to `device`.
    pub fn to_device(&mut self, device: Device) {
        self.body.to_device(device);
        self.volume.to_device(device);
    }

    /// Splits the augmented body back into its parts.
    pub fn detach(self) -> (B, V) {
        (self.body, self.volume)
    }
}

impl<B: ParametricBody, V: VolumetricExtension> ParameterResettable for AugmentedBody<B, V> {
    fn reset_params(&mut self, values: &ResetValues) -> Result<()> {
        no_grad(|| {
            let params = self.body.parameters();

            for (name, value) in values.iter() {
                if is_volume_param(name) {
                    log::debug!("ignoring reset value for extension parameter {name}");
                } else if !params.contains(name) {
                    log::warn!("ignoring reset value for unknown parameter {name}");
                } else {
                    params.check_assign(name, value)?;
                }
            }

            let names: Vec<String> = params
                .names()
                .filter(|name| !is_volume_param(name))
                .map(str::to_string)
                .collect();

            let params = self.body.parameters_mut();
            for name in &names {
                match values.get(name) {
                    Some(value) => params.assign(name, value)?,
                    None => params.fill(name, 0.)?,
                }
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, IxDyn, arr2};

    use super::*;
    use crate::{
        VolumeErr,
        body::{BodyModelType, SmplBuilder},
        storage::is_grad_enabled,
        volume::VolumetricSmpl,
    };

    fn create_test_body() -> AugmentedBody<crate::body::SmplBody, VolumetricSmpl> {
        let body = SmplBuilder::new().build().unwrap();
        let volume = VolumetricSmpl::from_body(&body).unwrap();
        AugmentedBody::new(body, volume)
    }

    #[test]
    fn namespace() {
        assert!(is_volume_param("volume"));
        assert!(is_volume_param("volume.decoder.0.weight"));
        assert!(!is_volume_param("volumetric_scale"));
        assert!(!is_volume_param("body_pose"));
    }

    #[test]
    fn combined_names() {
        let augmented = create_test_body();
        let names: Vec<_> = augmented
            .named_parameters()
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        assert_eq!(names[..4], ["betas", "global_orient", "body_pose", "transl"]);
        assert!(names[4..].iter().all(|name| is_volume_param(name)));
        assert!(augmented.parameter("volume.decoder.1.bias").is_some());
        assert!(augmented.parameter("transl").is_some());
        assert!(augmented.parameter("volume.transl").is_none());
    }

    #[test]
    fn reset_zeroes_and_sets() {
        let mut augmented = create_test_body();
        let values = ResetValues::new().with_values("transl", &[1., 2., 3.]);

        augmented.reset_params(&values).unwrap();

        let transl = augmented.parameter("transl").unwrap();
        assert_eq!(transl.data(), &arr2(&[[1., 2., 3.]]).into_dyn());
        let betas = augmented.parameter("betas").unwrap();
        assert_eq!(betas.data(), &ArrayD::<f32>::zeros(IxDyn(&[1, 10])));
    }

    #[test]
    fn reset_keeps_volume() {
        let mut augmented = create_test_body();
        let before = augmented.volume().parameters().clone();
        let values = ResetValues::new()
            .with_values("volume.decoder.1.bias", &[5.])
            .with_values("global_orient", &[0.1, 0.2, 0.3]);

        augmented.reset_params(&values).unwrap();
        augmented.reset_params(&ResetValues::new()).unwrap();

        assert_eq!(augmented.volume().parameters(), &before);
    }

    #[test]
    fn reset_all_or_nothing() {
        let mut augmented = create_test_body();
        augmented
            .reset_params(&ResetValues::new().with_values("transl", &[1., 1., 1.]))
            .unwrap();
        let before = augmented.body().parameters().clone();

        let values = ResetValues::new()
            .with_values("betas", &[1.; 10])
            .with_values("transl", &[1., 2.]);
        let err = augmented.reset_params(&values).unwrap_err();

        assert!(matches!(
            err,
            VolumeErr::ParameterShapeMismatch { ref name, .. } if name == "transl"
        ));
        assert_eq!(augmented.body().parameters(), &before);
    }

    #[test]
    fn reset_needs_exact_shape() {
        let mut augmented = create_test_body();

        for value in [arr1(&[7.]).into_dyn(), ArrayD::zeros(IxDyn(&[2, 10]))] {
            let values = ResetValues::new().with("betas", value);
            let err = augmented.reset_params(&values).unwrap_err();
            assert!(matches!(
                err,
                VolumeErr::ParameterShapeMismatch { ref name, .. } if name == "betas"
            ));
        }

        let betas = augmented.parameter("betas").unwrap();
        assert!(betas.data().iter().all(|&v| v == 0.));
        assert_eq!(betas.version(), 0);
    }

    #[test]
    fn reset_ignores_unknown() {
        let mut augmented = create_test_body();

        augmented
            .reset_params(&ResetValues::new().with_values("jaw_pose", &[1., 2., 3.]))
            .unwrap();

        assert!(augmented.parameter("jaw_pose").is_none());
    }

    #[test]
    fn reset_outside_grad_tracking() {
        let mut augmented = create_test_body();

        assert!(is_grad_enabled());
        augmented.reset_params(&ResetValues::new()).unwrap();
        assert!(is_grad_enabled());
        assert!(augmented.body().parameters().iter().all(|(_, p)| p.requires_grad()));
    }

    #[test]
    fn to_device_moves_everything() {
        let mut augmented = create_test_body();
        let before: Vec<_> = augmented
            .named_parameters()
            .into_iter()
            .map(|(_, p)| p.data().clone())
            .collect();

        augmented.to_device(Device::Cuda(0));

        let params = augmented.named_parameters();
        assert!(params.iter().all(|(_, p)| p.device() == Device::Cuda(0)));
        assert!(params.iter().zip(&before).all(|((_, p), data)| p.data() == data));
    }

    #[test]
    fn detach() {
        let augmented = create_test_body();
        let (body, volume) = augmented.detach();

        assert_eq!(body.model_type(), BodyModelType::Smpl);
        assert_eq!(volume.model_type(), "smpl");
    }
}
