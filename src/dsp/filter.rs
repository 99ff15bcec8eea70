use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Every response below comes out of the same two-integrator state-variable core
(trapezoidal integration, Simper style). The core produces band (v1) and low
(v2) from the input (v0); each response is just a different weighted sum:

    y = m0 * v0 + m1 * v1 + m2 * v2

| type        | g                     | m0    | m1            | m2       |
| ----------- | --------------------- | ----- | ------------- | -------- |
| low-pass    | tan(pi fc / fs)       | 0     | 0             | 1        |
| high-pass   | "                     | 1     | -k            | -1       |
| band-pass   | "                     | 0     | k             | 0        |
| notch       | "                     | 1     | -k            | 0        |
| all-pass    | "                     | 1     | -2k           | 0        |
| low-shelf   | tan(..) / sqrt(A)     | 1     | k (A - 1)     | A² - 1   |
| high-shelf  | tan(..) * sqrt(A)     | A²    | k (1 - A) A   | 1 - A²   |
| band-shelf  | tan(..), k = 1/(Q A)  | 1     | k (A² - 1)    | 0        |

k = 1/Q, A = sqrt(linear gain). Gain only matters for the three shelf types.
Band-pass is scaled by k so its peak is unity whatever the Q.
*/

/// Lowest cutoff the filter will run at.
pub const MIN_CUTOFF: f32 = 10.0;
/// Highest cutoff as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.49;
const MIN_Q: f32 = 0.1;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
    AllPass,
    LowShelf,
    HighShelf,
    BandShelf,
}

impl FilterType {
    pub const ALL: [FilterType; 8] = [
        FilterType::LowPass,
        FilterType::HighPass,
        FilterType::BandPass,
        FilterType::Notch,
        FilterType::AllPass,
        FilterType::LowShelf,
        FilterType::HighShelf,
        FilterType::BandShelf,
    ];

    /// Resolve a control value; rounded and clamped so any float picks a type.
    pub fn from_value(value: f32) -> Self {
        if !value.is_finite() {
            return FilterType::LowPass;
        }
        let index = value.round().clamp(0.0, (Self::ALL.len() - 1) as f32) as usize;
        Self::ALL[index]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

/// Per-block filter coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    g: f32,
    k: f32,
    m0: f32,
    m1: f32,
    m2: f32,
}

impl Coefficients {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, q: f32, gain: f32, sample_rate: f32) -> Self {
        let max_cutoff = sample_rate * MAX_CUTOFF_RATIO;
        let cutoff = if cutoff_hz.is_finite() {
            cutoff_hz.clamp(MIN_CUTOFF, max_cutoff)
        } else {
            MIN_CUTOFF
        };
        let q = if q.is_finite() { q.max(MIN_Q) } else { MIN_Q };
        let gain = if gain.is_finite() { gain.max(1e-6) } else { 1.0 };

        let warped = (PI * cutoff / sample_rate).tan();
        let k = 1.0 / q;
        let a = gain.sqrt();

        let (g, k, m0, m1, m2) = match filter_type {
            FilterType::LowPass => (warped, k, 0.0, 0.0, 1.0),
            FilterType::HighPass => (warped, k, 1.0, -k, -1.0),
            FilterType::BandPass => (warped, k, 0.0, k, 0.0),
            FilterType::Notch => (warped, k, 1.0, -k, 0.0),
            FilterType::AllPass => (warped, k, 1.0, -2.0 * k, 0.0),
            FilterType::LowShelf => (warped / a.sqrt(), k, 1.0, k * (a - 1.0), a * a - 1.0),
            FilterType::HighShelf => (
                warped * a.sqrt(),
                k,
                a * a,
                k * (1.0 - a) * a,
                1.0 - a * a,
            ),
            FilterType::BandShelf => {
                let k = 1.0 / (q * a);
                (warped, k, 1.0, k * (a * a - 1.0), 0.0)
            }
        };

        Self { g, k, m0, m1, m2 }
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::new(FilterType::LowPass, 1_000.0, 0.707, 1.0, 48_000.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory
    coefficients: Coefficients,
}

impl SVFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coefficients(coefficients: Coefficients) -> Self {
        Self {
            coefficients,
            ..Self::default()
        }
    }

    pub fn set_coefficients(&mut self, coefficients: Coefficients) {
        self.coefficients = coefficients;
    }

    /// Run the core once and return every basic response.
    pub fn next_sample(&mut self, sample: f32) -> FilterOutputs {
        let Coefficients { g, k, .. } = self.coefficients;
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }

    /// Run the core once and return the configured response.
    #[inline]
    pub fn tick(&mut self, sample: f32) -> f32 {
        let outputs = self.next_sample(sample);
        let Coefficients { m0, m1, m2, .. } = self.coefficients;
        m0 * sample + m1 * outputs.bandpass + m2 * outputs.lowpass
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
