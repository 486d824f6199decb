use super::ParamGen;

/// A parameter generator that always generates the same value.
pub struct ConstParamGen {
    value: f32,
}

impl ConstParamGen {
    /// Creates a new `ConstParamGen` parameter generator.
    ///
    /// # Arguments
    /// * `value` - The value to always generate.
    ///
    /// # Returns
    /// A new `ConstParamGen` instance.
    pub fn new(value: f32) -> Self {
        Self { value }
    }

    /// Creates a generator of zeros, used for biases and kinematic parameters.
    pub fn zeros() -> Self {
        Self::new(0.)
    }
}

impl ParamGen for ConstParamGen {
    fn sample(&mut self, n: usize) -> Vec<f32> {
        vec![self.value; n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let mut param_gen = ConstParamGen::new(1.);
        assert!(param_gen.sample(0).is_empty());
    }

    #[test]
    fn exact() {
        const SIZE: usize = 10;

        let mut param_gen = ConstParamGen::new(1.);
        assert_eq!(param_gen.sample(SIZE), vec![1.; SIZE]);
    }

    #[test]
    fn tensor_shape() {
        let mut param_gen = ConstParamGen::zeros();
        let tensor = param_gen.tensor(&[2, 3, 4]).unwrap();

        assert_eq!(tensor.shape(), &[2, 3, 4]);
        assert!(tensor.iter().all(|&v| v == 0.));
    }
}
