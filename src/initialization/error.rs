use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type of the parameter generators.
pub type Result<T> = std::result::Result<T, RandErr>;

/// Why a parameter generator couldn't be built or couldn't fill a tensor.
///
/// Each variant keeps the arguments the failing initializer was given, so
/// the error tells which layer of a module was misconfigured.
#[derive(Debug, Clone, PartialEq)]
pub enum RandErr {
    /// `low..high` is empty or not finite.
    Uniform { low: f32, high: f32 },
    /// The standard deviation is negative or not finite.
    Normal { mean: f32, std_dev: f32 },
    /// A fan based initializer was given no units to scale by.
    EmptyFan {
        init: &'static str,
        fan_in: usize,
        fan_out: usize,
    },
    /// A generator returned another amount of values than the tensor holds.
    SampleCount { expected: usize, got: usize },
}

impl Display for RandErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RandErr::Uniform { low, high } => {
                write!(f, "invalid uniform range [{low}, {high})")
            }
            RandErr::Normal { mean, std_dev } => {
                write!(f, "invalid normal distribution, mean {mean} std dev {std_dev}")
            }
            RandErr::EmptyFan {
                init,
                fan_in,
                fan_out,
            } => write!(
                f,
                "{init} initialization needs units, got fan in {fan_in} and fan out {fan_out}"
            ),
            RandErr::SampleCount { expected, got } => {
                write!(f, "generator returned {got} values for a tensor of {expected}")
            }
        }
    }
}

impl Error for RandErr {}
