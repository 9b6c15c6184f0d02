use num_traits::{Float, FloatConst};

/// First order exponential low-pass filter.
///
/// Each sample moves the output by `alpha` of the way towards it, lower `alpha` means more
/// filtering. The output starts at zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LowPassFilter<T> {
    output: T,
    alpha: T,
}

impl<T: Float> Default for LowPassFilter<T> {
    fn default() -> Self {
        Self::new(T::one())
    }
}

impl<T: Float> LowPassFilter<T> {
    pub fn new(alpha: T) -> Self {
        Self {
            output: T::zero(),
            alpha,
        }
    }

    pub fn apply(&mut self, sample: T) -> T {
        self.output = self.alpha * sample + (T::one() - self.alpha) * self.output;
        self.output
    }

    pub fn output(&self) -> T {
        self.output
    }

    pub fn alpha(&self) -> T {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: T) {
        self.alpha = alpha;
    }

    pub fn reset(&mut self, value: T) {
        self.output = value;
    }
}

/// Filter coefficient for a first order low-pass at `cutoff_freq` hz sampled every `dt` seconds.
pub fn alpha<T: Float + FloatConst>(dt: T, cutoff_freq: T) -> T {
    if cutoff_freq <= T::zero() || dt <= T::zero() {
        return T::one();
    }

    let rc = T::one() / ((T::PI() + T::PI()) * cutoff_freq);
    dt / (dt + rc)
}
