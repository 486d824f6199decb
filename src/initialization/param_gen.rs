use ndarray::{ArrayD, IxDyn};

use super::{RandErr, Result};

/// A `ParamGen` generates values for the initial state of a module's parameters.
pub trait ParamGen {
    /// Samples exactly `n` values.
    ///
    /// # Arguments
    /// * `n` - The amount of values to generate.
    fn sample(&mut self, n: usize) -> Vec<f32>;

    /// Samples a whole tensor of the given shape in row-major order.
    ///
    /// # Arguments
    /// * `shape` - The shape of the generated tensor.
    ///
    /// # Returns
    /// A new tensor filled with sampled values, or an error if `sample`
    /// didn't return exactly as many values as the tensor holds.
    fn tensor(&mut self, shape: &[usize]) -> Result<ArrayD<f32>> {
        let expected = shape.iter().product();
        let values = self.sample(expected);
        let got = values.len();

        ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|_| RandErr::SampleCount { expected, got })
    }
}
