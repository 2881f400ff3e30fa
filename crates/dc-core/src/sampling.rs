//! Calibrated distributions for shift durations, capacities and counts.
//!
//! Every sampler is a `rand_distr::Distribution<f64>` built once from its
//! parameter struct (`…::new(params)` validates and fails with
//! [`DcError::Distribution`] before the clock starts) and then sampled with
//! any `Rng`, normally the shift's [`ShiftRng`](crate::ShiftRng).
//!
//! | Sampler               | Shape                                             | Used for                     |
//! |-----------------------|---------------------------------------------------|------------------------------|
//! | [`UniformRange`]      | `U(low, high)`                                    | crane / crew task times      |
//! | [`ShiftedWeibull`]    | `γ + β(−ln(1−U))^(1/α)`, floored at 0             | box capacity, ad-hoc counts  |
//! | [`ShiftedLogNormal`]  | `LN(μ, σ) + γ`, floored at 0                      | ad-hoc checkpoints           |
//! | [`BandedLogNormal`]   | `LN(μ, σ) + γ` clamped to `[low, high]`           | pallet load / dispatch       |
//! | [`ChiSquaredPrep`]    | `χ²(df) + shift` clamped to `[low, high]`         | mixed-pallet pick prep       |
//! | [`TruncatedLogNormal`]| mean/CV log-normal, rejection then clamp          | per-pallet check             |
//! | [`ReturnTrip`]        | shifted LN, p90 winsor, rescale, floor            | truck round trip             |

use rand::Rng;
use rand_distr::{ChiSquared, Distribution, LogNormal};

use crate::{DcError, DcResult};

/// Bounds applied to `U` before inverse-CDF transforms so `ln(1−U)` is finite.
const UNIT_EPS: f64 = 1e-12;

/// 90th percentile of the standard normal.
const Z90: f64 = 1.281_551_565_544_600_4;

/// `U(0,1)` kept away from both ends.
#[inline]
fn unit_open<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.r#gen::<f64>().clamp(UNIT_EPS, 1.0 - UNIT_EPS)
}

fn invalid(name: &'static str, reason: impl Into<String>) -> DcError {
    DcError::Distribution { name, reason: reason.into() }
}

fn check_band(name: &'static str, low: f64, high: f64) -> DcResult<()> {
    if !(low.is_finite() && high.is_finite()) || low > high {
        return Err(invalid(name, format!("band [{low}, {high}] is empty or not finite")));
    }
    Ok(())
}

fn log_normal(name: &'static str, mu: f64, sigma: f64) -> DcResult<LogNormal<f64>> {
    if !mu.is_finite() {
        return Err(invalid(name, format!("mu {mu} is not finite")));
    }
    LogNormal::new(mu, sigma).map_err(|e| invalid(name, format!("sigma {sigma}: {e}")))
}

// ── Uniform ───────────────────────────────────────────────────────────────────

/// Closed uniform range in minutes.  A degenerate range (`low == high`)
/// always yields `low`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniformRange {
    pub low:  f64,
    pub high: f64,
}

impl UniformRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn validate(&self, name: &'static str) -> DcResult<()> {
        check_band(name, self.low, self.high)?;
        if self.low < 0.0 {
            return Err(invalid(name, format!("negative lower bound {}", self.low)));
        }
        Ok(())
    }
}

impl Distribution<f64> for UniformRange {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.high > self.low {
            rng.gen_range(self.low..=self.high)
        } else {
            self.low
        }
    }
}

// ── Shifted Weibull ───────────────────────────────────────────────────────────

/// Three-parameter Weibull: shape `alpha`, scale `beta`, location `gamma`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeibullParams {
    pub alpha: f64,
    pub beta:  f64,
    pub gamma: f64,
}

#[derive(Copy, Clone, Debug)]
pub struct ShiftedWeibull {
    params: WeibullParams,
}

impl ShiftedWeibull {
    pub fn new(params: WeibullParams) -> DcResult<Self> {
        let WeibullParams { alpha, beta, gamma } = params;
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(invalid("weibull", format!("shape {alpha} must be > 0")));
        }
        if !(beta.is_finite() && beta > 0.0) {
            return Err(invalid("weibull", format!("scale {beta} must be > 0")));
        }
        if !gamma.is_finite() {
            return Err(invalid("weibull", "location is not finite"));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> WeibullParams {
        self.params
    }

    /// Rounded, non-negative draw capped at `max`: a daily arrival count.
    pub fn sample_count<R: Rng + ?Sized>(&self, rng: &mut R, max: u32) -> u32 {
        let n = self.sample(rng).round();
        (n as u32).min(max)
    }

    /// Rounded draw of at least 1: a truck's box capacity.
    pub fn sample_capacity<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        (self.sample(rng).round() as u32).max(1)
    }
}

impl Distribution<f64> for ShiftedWeibull {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let WeibullParams { alpha, beta, gamma } = self.params;
        let u = unit_open(rng);
        let w = beta * (-(1.0 - u).ln()).powf(1.0 / alpha);
        (gamma + w).max(0.0)
    }
}

// ── Shifted log-normal ────────────────────────────────────────────────────────

/// Log-normal of the underlying normal `(mu, sigma)` plus a location shift.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogNormalParams {
    pub mu:    f64,
    pub sigma: f64,
    pub gamma: f64,
}

/// `max(0, LN(μ, σ) + γ)`.
#[derive(Copy, Clone, Debug)]
pub struct ShiftedLogNormal {
    inner: LogNormal<f64>,
    gamma: f64,
}

impl ShiftedLogNormal {
    pub fn new(params: LogNormalParams) -> DcResult<Self> {
        Ok(Self {
            inner: log_normal("shifted log-normal", params.mu, params.sigma)?,
            gamma: params.gamma,
        })
    }
}

impl Distribution<f64> for ShiftedLogNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        (self.inner.sample(rng) + self.gamma).max(0.0)
    }
}

/// `clamp(LN(μ, σ) + γ, low, high)` for crane handling times that must stay
/// inside an operational band.
#[derive(Copy, Clone, Debug)]
pub struct BandedLogNormal {
    inner: LogNormal<f64>,
    gamma: f64,
    low:   f64,
    high:  f64,
}

impl BandedLogNormal {
    pub fn new(params: LogNormalParams, low: f64, high: f64) -> DcResult<Self> {
        check_band("banded log-normal", low, high)?;
        Ok(Self {
            inner: log_normal("banded log-normal", params.mu, params.sigma)?,
            gamma: params.gamma,
            low,
            high,
        })
    }
}

impl Distribution<f64> for BandedLogNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        (self.inner.sample(rng) + self.gamma).clamp(self.low, self.high)
    }
}

// ── Chi-squared prep ──────────────────────────────────────────────────────────

/// `clamp(χ²(df) + shift, low, high)` for pick preparation of one mixed pallet.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChiSquaredParams {
    pub df:    f64,
    pub shift: f64,
    pub low:   f64,
    pub high:  f64,
}

impl Default for ChiSquaredParams {
    fn default() -> Self {
        Self { df: 4.0, shift: 3.0, low: 0.2, high: 20.0 }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ChiSquaredPrep {
    inner: ChiSquared<f64>,
    shift: f64,
    low:   f64,
    high:  f64,
}

impl ChiSquaredPrep {
    pub fn new(params: ChiSquaredParams) -> DcResult<Self> {
        check_band("chi-squared", params.low, params.high)?;
        if !(params.df.is_finite() && params.df > 0.0) {
            return Err(invalid("chi-squared", format!("degrees of freedom {} must be > 0", params.df)));
        }
        let inner = ChiSquared::new(params.df).map_err(|e| invalid("chi-squared", e.to_string()))?;
        Ok(Self { inner, shift: params.shift, low: params.low, high: params.high })
    }
}

impl Distribution<f64> for ChiSquaredPrep {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        (self.inner.sample(rng) + self.shift).clamp(self.low, self.high)
    }
}

// ── Truncated log-normal (mean / CV) ──────────────────────────────────────────

/// Log-normal parameterised by its own mean and coefficient of variation,
/// truncated to `[low, high]`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TruncatedLogNormalParams {
    pub mean:          f64,
    pub cv:            f64,
    pub low:           f64,
    pub high:          f64,
    pub max_resamples: u32,
}

impl Default for TruncatedLogNormalParams {
    fn default() -> Self {
        Self { mean: 1.0, cv: 0.30, low: 0.4, high: 2.0, max_resamples: 8 }
    }
}

/// Rejection-samples up to `max_resamples` times, then clamps the last draw.
#[derive(Copy, Clone, Debug)]
pub struct TruncatedLogNormal {
    inner:         LogNormal<f64>,
    low:           f64,
    high:          f64,
    max_resamples: u32,
}

impl TruncatedLogNormal {
    pub fn new(params: TruncatedLogNormalParams) -> DcResult<Self> {
        check_band("truncated log-normal", params.low, params.high)?;
        if !(params.mean.is_finite() && params.mean > 0.0) {
            return Err(invalid("truncated log-normal", format!("mean {} must be > 0", params.mean)));
        }
        if !(params.cv.is_finite() && params.cv >= 0.0) {
            return Err(invalid("truncated log-normal", format!("cv {} must be >= 0", params.cv)));
        }
        let sigma = (1.0 + params.cv * params.cv).ln().sqrt();
        let mu = params.mean.ln() - 0.5 * sigma * sigma;
        Ok(Self {
            inner:         log_normal("truncated log-normal", mu, sigma)?,
            low:           params.low,
            high:          params.high,
            max_resamples: params.max_resamples.max(1),
        })
    }
}

impl Distribution<f64> for TruncatedLogNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let mut x = self.low;
        for _ in 0..self.max_resamples {
            x = self.inner.sample(rng);
            if (self.low..=self.high).contains(&x) {
                return x;
            }
        }
        x.clamp(self.low, self.high)
    }
}

// ── Return trip ───────────────────────────────────────────────────────────────

/// Truck round-trip duration model.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReturnTripParams {
    pub mu:        f64,
    pub sigma:     f64,
    pub gamma:     f64,
    /// Multiplicative rescale applied after winsorizing.
    pub alpha:     f64,
    /// Hard lower bound in minutes.
    pub floor_min: f64,
}

impl Default for ReturnTripParams {
    fn default() -> Self {
        Self { mu: 8.8962, sigma: 0.0232, gamma: -6979.4, alpha: 0.7505, floor_min: 60.0 }
    }
}

/// `max(floor, α · min(max(0, LN(μ, σ) + γ), p90))`.
#[derive(Copy, Clone, Debug)]
pub struct ReturnTrip {
    inner: LogNormal<f64>,
    gamma: f64,
    alpha: f64,
    floor: f64,
    p90:   f64,
}

impl ReturnTrip {
    pub fn new(params: ReturnTripParams) -> DcResult<Self> {
        if !(params.alpha.is_finite() && params.alpha > 0.0) {
            return Err(invalid("return trip", format!("rescale {} must be > 0", params.alpha)));
        }
        if !(params.floor_min.is_finite() && params.floor_min >= 0.0) {
            return Err(invalid("return trip", format!("floor {} must be >= 0", params.floor_min)));
        }
        Ok(Self {
            inner: log_normal("return trip", params.mu, params.sigma)?,
            gamma: params.gamma,
            alpha: params.alpha,
            floor: params.floor_min,
            p90:   (params.mu + params.sigma * Z90).exp() + params.gamma,
        })
    }

    /// Upper winsorizing bound before rescale.
    pub fn p90(&self) -> f64 {
        self.p90
    }
}

impl Distribution<f64> for ReturnTrip {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let t = (self.inner.sample(rng) + self.gamma).max(0.0).min(self.p90);
        (self.alpha * t).max(self.floor)
    }
}
