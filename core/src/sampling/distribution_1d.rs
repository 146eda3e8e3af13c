//! 1D Distribution.

use crate::pbrt::*;

/// A piecewise-constant 1D function's PDF and CDF, used to pick one item
/// (e.g. a light) in proportion to its weight.
#[derive(Clone, Debug)]
pub struct Distribution1D {
    /// Piecewise-constant function.
    pub func: Vec<Float>,

    /// CDF for `func`; `func.len() + 1` entries from 0 to 1.
    pub cdf: Vec<Float>,

    /// Integral of `func`.
    pub func_int: Float,
}

impl Distribution1D {
    /// Returns a new `Distribution1D` for given piecewise-constant function.
    ///
    /// * `f` - Piecewise-constant 1D function; values must be non-negative.
    pub fn new(f: Vec<Float>) -> Self {
        let n = f.len();
        assert!(n > 0, "Distribution1D needs at least one value");

        let mut cdf: Vec<Float> = std::iter::once(0.0)
            .chain(f.iter().scan(0.0, |acc, v| {
                *acc += v / n as Float;
                Some(*acc)
            }))
            .collect();

        // A zero function degenerates into a uniform distribution.
        let func_int = cdf[n];
        if func_int == 0.0 {
            cdf.iter_mut()
                .enumerate()
                .for_each(|(i, v)| *v = i as Float / n as Float);
        } else {
            cdf.iter_mut().skip(1).for_each(|v| *v /= func_int);
        }

        Self { func: f, cdf, func_int }
    }

    /// Returns the number of sample points for the piecewise-constant function.
    pub fn count(&self) -> usize {
        self.func.len()
    }

    /// Return the sampled index and its probability given a random sample.
    ///
    /// * `u` - The random sample in [0, 1).
    pub fn sample_discrete(&self, u: Float) -> (usize, Float) {
        let offset = find_interval(self.cdf.len(), |index| self.cdf[index] <= u);
        (offset, self.discrete_pdf(offset))
    }

    /// Return the PDF for sampling a given value from the discrete PDF.
    ///
    /// * `index` - Sample index.
    pub fn discrete_pdf(&self, index: usize) -> Float {
        assert!(index < self.count());
        if self.func_int > 0.0 {
            self.func[index] / (self.func_int * self.count() as Float)
        } else {
            1.0 / self.count() as Float
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn samples_proportional_to_weight() {
        let d = Distribution1D::new(vec![1.0, 3.0]);
        assert!(approx_eq!(Float, d.discrete_pdf(0), 0.25, epsilon = 1e-6));
        assert!(approx_eq!(Float, d.discrete_pdf(1), 0.75, epsilon = 1e-6));
        assert_eq!(d.sample_discrete(0.1).0, 0);
        assert_eq!(d.sample_discrete(0.3).0, 1);
        assert_eq!(d.sample_discrete(0.99).0, 1);
    }

    #[test]
    fn zero_function_is_uniform() {
        let d = Distribution1D::new(vec![0.0, 0.0, 0.0, 0.0]);
        let (index, pdf) = d.sample_discrete(0.6);
        assert_eq!(index, 2);
        assert!(approx_eq!(Float, pdf, 0.25, epsilon = 1e-6));
    }

    #[test]
    fn single_entry() {
        let d = Distribution1D::new(vec![5.0]);
        assert_eq!(d.sample_discrete(0.7), (0, 1.0));
    }
}
