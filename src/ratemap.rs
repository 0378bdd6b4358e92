//! Rate Map Estimator - empirical tuning curves from spikes and occupancy
//!
//! Positions are binned into equal-width bins; each bin's rate is the spike
//! count divided by time spent there. Purely diagnostic: nothing here feeds
//! back into spike generation.
//!
//! ## Empty Bins
//!
//! A bin the agent never visited has no defined rate. `EmptyBins::Zero`
//! reports 0.0, `EmptyBins::Nan` reports NaN. Smoothing skips NaN bins and
//! leaves them NaN.

use serde::{Deserialize, Serialize};

use crate::error::{
    checked_size, ensure_finite, ensure_len, ensure_non_negative, Result, SimError, MAX_ELEMENTS,
};
use crate::spikes::SpikeMatrix;
use crate::trajectory::Trajectory;
use crate::tuning::linspace;

/// Gaussian kernel half-width in sigmas
const KERNEL_TRUNCATE: f64 = 4.0;

/// Interval covered by the bins
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinRange {
    /// `[0, track_length]`
    #[default]
    Track,
    /// `[min(position), max(position)]`
    Observed,
}

/// Sentinel for bins with zero occupancy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyBins {
    #[default]
    Zero,
    Nan,
}

/// Rate map estimation options
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateMapConfig {
    /// Number of spatial bins
    pub n_bins: usize,
    /// Gaussian smoothing sigma in bins; 0 disables smoothing
    pub smooth_sigma: f64,
    pub range: BinRange,
    pub empty_bins: EmptyBins,
}

impl Default for RateMapConfig {
    fn default() -> Self {
        Self {
            n_bins: 100,
            smooth_sigma: 0.0,
            range: BinRange::Track,
            empty_bins: EmptyBins::Zero,
        }
    }
}

impl RateMapConfig {
    /// Population heatmap settings: observed range, NaN for unvisited bins,
    /// 50 bins smoothed with sigma 1
    pub fn heatmap() -> Self {
        Self {
            n_bins: 50,
            smooth_sigma: 1.0,
            range: BinRange::Observed,
            empty_bins: EmptyBins::Nan,
        }
    }

    pub fn with_bins(mut self, n_bins: usize) -> Self {
        self.n_bins = n_bins;
        self
    }

    pub fn with_smoothing(mut self, smooth_sigma: f64) -> Self {
        self.smooth_sigma = smooth_sigma;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n_bins == 0 {
            return Err(SimError::InvalidParameter {
                name: "n_bins",
                value: 0.0,
                reason: "must be >= 1",
            });
        }
        if self.n_bins >= MAX_ELEMENTS {
            return Err(SimError::InvalidParameter {
                name: "n_bins",
                value: self.n_bins as f64,
                reason: "too many bins to allocate",
            });
        }
        ensure_non_negative("smooth_sigma", self.smooth_sigma)
    }
}

/// Empirical rate maps for every cell of a spike matrix
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RateMaps {
    /// `n_bins + 1` bin edges (m)
    pub bin_edges: Vec<f64>,
    /// Bin midpoints (m)
    pub bin_centers: Vec<f64>,
    /// Time spent in each bin (s)
    pub occupancy: Vec<f64>,
    /// Row-major rates (Hz), `n_cells` rows of `n_bins`
    rates: Vec<f64>,
    n_cells: usize,
}

impl RateMaps {
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    pub fn n_bins(&self) -> usize {
        self.bin_centers.len()
    }

    /// Rate curve of one cell
    ///
    /// # Panics
    ///
    /// Panics if `cell >= self.n_cells()`.
    pub fn cell(&self, cell: usize) -> &[f64] {
        let n = self.n_bins();
        &self.rates[cell * n..(cell + 1) * n]
    }

    /// Iterate rate curves in cell order
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.rates.chunks(self.n_bins().max(1)).take(self.n_cells)
    }

    /// Bin center and rate of the highest finite bin, `None` if all are NaN
    ///
    /// # Panics
    ///
    /// Panics if `cell >= self.n_cells()`.
    pub fn peak(&self, cell: usize) -> Option<(f64, f64)> {
        self.cell(cell)
            .iter()
            .zip(&self.bin_centers)
            .filter(|(r, _)| r.is_finite())
            .fold(None, |best: Option<(f64, f64)>, (&r, &x)| match best {
                Some((_, best_r)) if best_r >= r => best,
                _ => Some((x, r)),
            })
    }
}

/// Equal-width binning of `[lo, hi]`, last bin closed on the right
struct Bins {
    lo: f64,
    hi: f64,
    width: f64,
    n: usize,
}

impl Bins {
    fn new(lo: f64, hi: f64, n: usize) -> Result<Self> {
        ensure_finite("bin range", lo)?;
        ensure_finite("bin range", hi)?;
        if !(hi > lo) {
            return Err(SimError::InvalidParameter {
                name: "bin range",
                value: hi - lo,
                reason: "position range is degenerate",
            });
        }
        Ok(Self {
            lo,
            hi,
            width: (hi - lo) / n as f64,
            n,
        })
    }

    fn for_trajectory(trajectory: &Trajectory, range: BinRange, n: usize) -> Result<Self> {
        match range {
            BinRange::Track => Self::new(0.0, trajectory.track_length(), n),
            BinRange::Observed => {
                let (lo, hi) = trajectory
                    .positions()
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
                Self::new(lo, hi, n)
            }
        }
    }

    #[inline]
    fn index(&self, x: f64) -> Option<usize> {
        if !(self.lo..=self.hi).contains(&x) {
            return None;
        }
        let i = ((x - self.lo) / self.width) as usize;
        Some(i.min(self.n - 1))
    }

    fn edges(&self) -> Vec<f64> {
        linspace(self.lo, self.hi, self.n + 1)
    }
}

/// Empirical rate maps for every row of `spikes`.
pub fn compute_rate_maps(
    spikes: &SpikeMatrix,
    trajectory: &Trajectory,
    config: &RateMapConfig,
) -> Result<RateMaps> {
    config.validate()?;
    ensure_len("spike matrix bins", trajectory.len(), spikes.n_bins())?;

    let n_bins = config.n_bins;
    let bins = Bins::for_trajectory(trajectory, config.range, n_bins)?;
    let bin_edges = bins.edges();
    let bin_centers: Vec<f64> = bin_edges.windows(2).map(|e| 0.5 * (e[0] + e[1])).collect();

    // Bin index per sample, computed once and shared by all cells
    let sample_bins: Vec<Option<usize>> =
        trajectory.positions().iter().map(|&x| bins.index(x)).collect();

    let mut occupancy = vec![0.0; n_bins];
    for b in sample_bins.iter().flatten() {
        occupancy[*b] += trajectory.dt();
    }

    let empty = match config.empty_bins {
        EmptyBins::Zero => 0.0,
        EmptyBins::Nan => f64::NAN,
    };

    let n_cells = spikes.n_cells();
    let mut rates = vec![0.0; checked_size("n_cells * n_bins", n_cells, n_bins)?];
    let mut counts = vec![0u64; n_bins];
    for cell in 0..n_cells {
        counts.iter_mut().for_each(|c| *c = 0);
        for (&k, b) in spikes.row(cell).iter().zip(&sample_bins) {
            if let Some(b) = b {
                counts[*b] += k as u64;
            }
        }

        let row = &mut rates[cell * n_bins..(cell + 1) * n_bins];
        for ((rate, &count), &occ) in row.iter_mut().zip(&counts).zip(&occupancy) {
            *rate = if occ > 0.0 { count as f64 / occ } else { empty };
        }
        if config.smooth_sigma > 0.0 {
            let smoothed = gaussian_smooth(row, config.smooth_sigma);
            row.copy_from_slice(&smoothed);
        }
    }

    Ok(RateMaps {
        bin_edges,
        bin_centers,
        occupancy,
        rates,
        n_cells,
    })
}

/// Validation map: `[0, track_length]`, zero for unvisited bins, no smoothing.
pub fn compute_empirical_rate_maps(
    n_bins: usize,
    spikes: &SpikeMatrix,
    trajectory: &Trajectory,
) -> Result<RateMaps> {
    let config = RateMapConfig::default().with_bins(n_bins);
    compute_rate_maps(spikes, trajectory, &config)
}

/// Fraction of samples falling in each of `n_bins` track bins
pub fn occupancy_fraction(trajectory: &Trajectory, n_bins: usize) -> Result<Vec<f64>> {
    RateMapConfig::default().with_bins(n_bins).validate()?;
    let bins = Bins::for_trajectory(trajectory, BinRange::Track, n_bins)?;

    let mut hist = vec![0usize; n_bins];
    for &x in trajectory.positions() {
        if let Some(b) = bins.index(x) {
            hist[b] += 1;
        }
    }
    let total: usize = hist.iter().sum();
    if total == 0 {
        return Ok(vec![0.0; n_bins]);
    }
    Ok(hist.into_iter().map(|h| h as f64 / total as f64).collect())
}

/// Gaussian smoothing along one axis.
///
/// Kernel truncated at 4 sigma, out-of-range taps take the nearest edge
/// value. NaN entries carry no weight and stay NaN. A non-finite or
/// non-positive `sigma` returns the input unchanged.
pub fn gaussian_smooth(values: &[f64], sigma: f64) -> Vec<f64> {
    let n = values.len();
    if !(sigma > 0.0 && sigma.is_finite()) || n == 0 {
        return values.to_vec();
    }

    // Taps past `n` only repeat the edge values
    let radius = (KERNEL_TRUNCATE * sigma + 0.5).min(n as f64) as isize;
    let kernel: Vec<f64> = (-radius..=radius)
        .map(|k| {
            let z = k as f64 / sigma;
            (-0.5 * z * z).exp()
        })
        .collect();

    let last = n as isize - 1;
    (0..n)
        .map(|i| {
            if values[i].is_nan() {
                return f64::NAN;
            }
            let mut acc = 0.0;
            let mut norm = 0.0;
            for (tap, &w) in kernel.iter().enumerate() {
                let j = (i as isize + tap as isize - radius).clamp(0, last) as usize;
                let v = values[j];
                if !v.is_nan() {
                    acc += w * v;
                    norm += w;
                }
            }
            acc / norm
        })
        .collect()
}
