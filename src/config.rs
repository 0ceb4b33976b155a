use num_traits::Float;

/// Construction-time settings for a [`ShortestPathsGenerator`](crate::ShortestPathsGenerator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config<T> {
    /// Slack allowed when checking that a row's probabilities (and each
    /// single probability) do not exceed 1.
    pub tolerance: T,
}

impl<T: Float> Config<T> {
    pub fn with_tolerance(tolerance: T) -> Self {
        Config { tolerance }
    }
}

impl<T: Float> Default for Config<T> {
    fn default() -> Self {
        Config {
            tolerance: T::from(1e-6).unwrap_or_else(T::epsilon),
        }
    }
}
