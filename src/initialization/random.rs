use std::{cell::RefCell, rc::Rc};

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::{ParamGen, RandErr, Result};

/// A parameter generator that follows a certain probabilistic distribution.
///
/// The random number generator is shared so that a whole module can be
/// initialized from a single seed, layer after layer.
pub struct RandParamGen<R: Rng, D: Distribution<f32>> {
    rng: Rc<RefCell<R>>,
    distribution: D,
}

impl<R: Rng, D: Distribution<f32>> RandParamGen<R, D> {
    /// Creates a new `RandParamGen` parameter generator.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `distribution` - The distribution to sample the random numbers from.
    pub fn new(rng: Rc<RefCell<R>>, distribution: D) -> Self {
        Self { rng, distribution }
    }
}

impl<R: Rng> RandParamGen<R, Uniform<f32>> {
    /// Creates a new `RandParamGen` parameter generator with a uniform distribution.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `low` - The inclusive lower limit.
    /// * `high` - The exclusive upper limit.
    ///
    /// # Returns
    /// An error if the range is invalid (low >= high).
    pub fn uniform(rng: Rc<RefCell<R>>, low: f32, high: f32) -> Result<Self> {
        let distribution = Uniform::new(low, high).map_err(|_| RandErr::Uniform { low, high })?;
        Ok(Self::new(rng, distribution))
    }

    /// Creates a new `RandParamGen` parameter generator using Xavier uniform initialization.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `fan_in` - The number of input units in the weight tensor.
    /// * `fan_out` - The number of output units in the weight tensor.
    ///
    /// # Returns
    /// An error if both fans are zero.
    pub fn xavier_uniform(rng: Rc<RefCell<R>>, fan_in: usize, fan_out: usize) -> Result<Self> {
        if fan_in + fan_out == 0 {
            return Err(RandErr::EmptyFan {
                init: "xavier uniform",
                fan_in,
                fan_out,
            });
        }

        let range = (6. / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(rng, -range, range)
    }
}

impl<R: Rng> RandParamGen<R, Normal<f32>> {
    /// Creates a new `RandParamGen` parameter generator with a normal distribution.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `mean` - The mean of the distribution.
    /// * `std_dev` - The standard deviation of the distribution.
    ///
    /// # Returns
    /// An error if `std_dev` is not finite (Nan or infinite).
    pub fn normal(rng: Rc<RefCell<R>>, mean: f32, std_dev: f32) -> Result<Self> {
        let distribution =
            Normal::new(mean, std_dev).map_err(|_| RandErr::Normal { mean, std_dev })?;
        Ok(Self::new(rng, distribution))
    }

    /// Creates a new `RandParamGen` parameter generator using Kaiming normal initialization.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `fan_in` - The number of input units in the weight tensor.
    ///
    /// # Returns
    /// An error if `fan_in` is zero.
    pub fn kaiming(rng: Rc<RefCell<R>>, fan_in: usize) -> Result<Self> {
        if fan_in == 0 {
            return Err(RandErr::EmptyFan {
                init: "kaiming",
                fan_in,
                fan_out: 0,
            });
        }

        let std_dev = (2. / fan_in as f32).sqrt();
        Self::normal(rng, 0., std_dev)
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen for RandParamGen<R, D> {
    fn sample(&mut self, n: usize) -> Vec<f32> {
        let mut rng = self.rng.borrow_mut();
        (0..n).map(|_| self.distribution.sample(&mut *rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded_rng() -> Rc<RefCell<StdRng>> {
        Rc::new(RefCell::new(StdRng::seed_from_u64(42)))
    }

    #[test]
    fn exact() {
        const SIZE: usize = 10;

        let mut param_gen = RandParamGen::uniform(seeded_rng(), -1., 1.).unwrap();
        let sample = param_gen.sample(SIZE);

        assert_eq!(sample.len(), SIZE);
        assert!(sample.iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn invalid_range() {
        let err = RandParamGen::uniform(seeded_rng(), 1., -1.).err();
        assert_eq!(err, Some(RandErr::Uniform { low: 1., high: -1. }));
    }

    #[test]
    fn invalid_std_dev() {
        let err = RandParamGen::normal(seeded_rng(), 0., -1.).err();
        assert!(matches!(err, Some(RandErr::Normal { mean, .. }) if mean == 0.));
    }

    #[test]
    fn empty_fans() {
        let kaiming = RandParamGen::kaiming(seeded_rng(), 0).err();
        let xavier = RandParamGen::xavier_uniform(seeded_rng(), 0, 0).err();

        assert!(matches!(kaiming, Some(RandErr::EmptyFan { init: "kaiming", .. })));
        assert!(matches!(xavier, Some(RandErr::EmptyFan { fan_out: 0, .. })));
        assert!(RandParamGen::xavier_uniform(seeded_rng(), 0, 4).is_ok());
    }

    #[test]
    fn same_seed_same_values() {
        let mut a = RandParamGen::kaiming(seeded_rng(), 16).unwrap();
        let mut b = RandParamGen::kaiming(seeded_rng(), 16).unwrap();

        assert_eq!(a.tensor(&[4, 4]).unwrap(), b.tensor(&[4, 4]).unwrap());
    }

    #[test]
    fn shared_rng_advances() {
        let rng = seeded_rng();
        let mut a = RandParamGen::xavier_uniform(Rc::clone(&rng), 4, 4).unwrap();
        let mut b = RandParamGen::xavier_uniform(rng, 4, 4).unwrap();

        assert_ne!(a.sample(8), b.sample(8));
    }
}
