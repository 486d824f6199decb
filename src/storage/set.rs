use ndarray::ArrayD;

use super::{Device, Parameter};
use crate::{Result, VolumeErr};

/// An ordered collection of named parameters.
///
/// Insertion order is preserved, it's the order in which the parameters are
/// listed, reset and serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, Parameter)>,
}

impl ParameterSet {
    /// Creates a new empty `ParameterSet`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, replacing in place any previous parameter with the same name.
    ///
    /// # Arguments
    /// * `name` - The parameter's name.
    /// * `param` - The parameter.
    pub fn insert(&mut self, name: impl Into<String>, param: Parameter) {
        let name = name.into();

        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = param,
            None => self.entries.push((name, param)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total amount of scalar values across every parameter.
    pub fn numel(&self) -> usize {
        self.entries.iter().map(|(_, p)| p.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Checks that `value` could be written into the parameter `name` without writing it.
    ///
    /// # Returns
    /// An `UnknownParameter` if there is no such parameter, a `ParameterShapeMismatch`
    /// if `value` doesn't fit it.
    pub fn check_assign(&self, name: &str, value: &ArrayD<f32>) -> Result<()> {
        let param = self.lookup(name)?;

        if !param.accepts(value) {
            return Err(VolumeErr::ParameterShapeMismatch {
                name: name.to_string(),
                expected: param.shape().to_vec(),
                got: value.shape().to_vec(),
            });
        }

        Ok(())
    }

    /// Overwrites the parameter `name` with `value`.
    ///
    /// # Returns
    /// An error if there is no such parameter, the shapes don't match or the
    /// parameter is tracked and gradients are enabled.
    pub fn assign(&mut self, name: &str, value: &ArrayD<f32>) -> Result<()> {
        self.lookup_mut(name)?.assign(name, value)
    }

    /// Overwrites every value of the parameter `name` with `value`.
    pub fn fill(&mut self, name: &str, value: f32) -> Result<()> {
        self.lookup_mut(name)?.fill(name, value)
    }

    /// The device of the first parameter, `None` when the set is empty.
    pub fn device(&self) -> Option<Device> {
        self.entries.first().map(|(_, param)| param.device())
    }

    /// Moves every parameter to `device`.
    pub fn to_device(&mut self, device: Device) {
        self.entries
            .iter_mut()
            .for_each(|(_, param)| param.to_device(device));
    }

    fn lookup(&self, name: &str) -> Result<&Parameter> {
        self.get(name).ok_or_else(|| unknown(name))
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut Parameter> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
            .ok_or_else(|| unknown(name))
    }
}

fn unknown(name: &str) -> VolumeErr {
    VolumeErr::UnknownParameter {
        name: name.to_string(),
    }
}

impl FromIterator<(String, Parameter)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, Parameter)>>(iter: I) -> Self {
        let mut set = Self::new();
        iter.into_iter()
            .for_each(|(name, param)| set.insert(name, param));
        set
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;

    use super::*;
    use crate::storage::no_grad;

    fn create_test_set() -> ParameterSet {
        let mut set = ParameterSet::new();
        set.insert("pose", Parameter::zeros(&[3]));
        set.insert("shape", Parameter::zeros(&[10]));
        set
    }

    #[test]
    fn insertion_order() {
        let set = create_test_set();
        let names: Vec<_> = set.names().collect();

        assert_eq!(names, ["pose", "shape"]);
        assert_eq!(set.numel(), 13);
    }

    #[test]
    fn insert_replaces() {
        let mut set = create_test_set();
        set.insert("pose", Parameter::zeros(&[6]));

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("pose").unwrap().shape(), &[6]);
        assert_eq!(set.names().next(), Some("pose"));
    }

    #[test]
    fn assign_by_name() {
        let mut set = create_test_set();
        let value = arr1(&[1., 2., 3.]).into_dyn();

        no_grad(|| set.assign("pose", &value)).unwrap();

        assert_eq!(set.get("pose").unwrap().data(), &value);
    }

    #[test]
    fn unknown_name() {
        let mut set = create_test_set();
        let value = arr1(&[1.]).into_dyn();

        assert!(matches!(
            set.check_assign("nope", &value),
            Err(VolumeErr::UnknownParameter { ref name }) if name == "nope"
        ));
        assert!(matches!(
            no_grad(|| set.fill("nope", 0.)),
            Err(VolumeErr::UnknownParameter { .. })
        ));
    }

    #[test]
    fn check_assign_mismatch() {
        let set = create_test_set();
        let value = arr1(&[1., 2.]).into_dyn();

        let err = set.check_assign("pose", &value).unwrap_err();
        assert!(matches!(
            err,
            VolumeErr::ParameterShapeMismatch { ref name, .. } if name == "pose"
        ));
    }

    #[test]
    fn to_device() {
        let mut set = create_test_set();
        assert_eq!(set.device(), Some(Device::Cpu));
        set.to_device(Device::Mps);

        assert!(set.iter().all(|(_, p)| p.device() == Device::Mps));
        assert_eq!(set.device(), Some(Device::Mps));
        assert_eq!(ParameterSet::new().device(), None);
    }
}
