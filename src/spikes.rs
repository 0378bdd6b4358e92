//! Spike Generator - discretized inhomogeneous Poisson spike trains
//!
//! Each (cell, bin) pair gets one independent draw whose mean follows the
//! cell's expected rate at the agent's position in that bin. There is no
//! refractoriness and no coupling between cells.
//!
//! ## Per-bin Sampling
//!
//! | Mode | Draw | Bin values |
//! |------|------|------------|
//! | `Clamped` | Bernoulli, `p = min(rate * dt, 1)` | 0 or 1 |
//! | `Exact` | Bernoulli, `p = 1 - exp(-rate * dt)` | 0 or 1 |
//! | `Poisson` | Poisson count, mean `rate * dt` | 0, 1, 2, ... |
//!
//! `rate * dt` is only a probability while it stays well below 1. `Clamped`
//! logs a warning with the number of affected bins whenever it has to cap
//! a probability.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{checked_size, ensure_len, ensure_non_negative, Result, SimError};
use crate::rng::{bernoulli, poisson};
use crate::trajectory::Trajectory;
use crate::tuning::PlaceCellPopulation;

/// How an expected count `rate * dt` becomes a bin value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sampling {
    /// Bernoulli with `rate * dt` capped at 1
    #[default]
    Clamped,
    /// Bernoulli with the probability of at least one Poisson event
    Exact,
    /// Full Poisson count per bin
    Poisson,
}

/// Spike generation options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeConfig {
    pub sampling: Sampling,
}

impl SpikeConfig {
    pub fn with_sampling(sampling: Sampling) -> Self {
        Self { sampling }
    }
}

/// One constant-rate neuron with no spatial tuning
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseCellParams {
    /// Firing rate (Hz)
    pub firing_rate: f64,
}

impl NoiseCellParams {
    pub fn new(firing_rate: f64) -> Result<Self> {
        ensure_non_negative("firing_rate", firing_rate)?;
        Ok(Self { firing_rate })
    }

    /// `n` noise cells with rates drawn uniformly from `[min_rate, max_rate]`
    pub fn uniform_population<R: Rng + ?Sized>(
        n: usize,
        min_rate: f64,
        max_rate: f64,
        rng: &mut R,
    ) -> Result<Vec<Self>> {
        ensure_non_negative("min_rate", min_rate)?;
        ensure_non_negative("max_rate", max_rate)?;
        if max_rate < min_rate {
            return Err(SimError::InvalidParameter {
                name: "max_rate",
                value: max_rate,
                reason: "must be >= min_rate",
            });
        }
        Ok((0..n)
            .map(|_| Self {
                firing_rate: rng.gen_range(min_rate..=max_rate),
            })
            .collect())
    }
}

/// Recipe for a noise population with uniformly drawn rates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseCellConfig {
    pub n_cells: usize,
    /// Lowest firing rate (Hz)
    pub min_rate: f64,
    /// Highest firing rate (Hz)
    pub max_rate: f64,
}

impl Default for NoiseCellConfig {
    fn default() -> Self {
        Self {
            n_cells: 10,
            min_rate: 0.1,
            max_rate: 1.0,
        }
    }
}

impl NoiseCellConfig {
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<NoiseCellParams>> {
        NoiseCellParams::uniform_population(self.n_cells, self.min_rate, self.max_rate, rng)
    }
}

/// Spike counts, `n_cells` rows by `n_bins` columns, row-major.
///
/// Columns line up 1:1 with the samples of the trajectory the matrix was
/// generated from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SpikeMatrixParts")]
pub struct SpikeMatrix {
    n_cells: usize,
    n_bins: usize,
    counts: Vec<u32>,
}

#[derive(Deserialize)]
struct SpikeMatrixParts {
    n_cells: usize,
    n_bins: usize,
    counts: Vec<u32>,
}

impl TryFrom<SpikeMatrixParts> for SpikeMatrix {
    type Error = SimError;

    fn try_from(parts: SpikeMatrixParts) -> Result<Self> {
        let expected = checked_size("n_cells * n_bins", parts.n_cells, parts.n_bins)?;
        ensure_len("spike counts", expected, parts.counts.len())?;
        Ok(Self {
            n_cells: parts.n_cells,
            n_bins: parts.n_bins,
            counts: parts.counts,
        })
    }
}

impl SpikeMatrix {
    /// All-zero matrix
    pub fn zeros(n_cells: usize, n_bins: usize) -> Result<Self> {
        Ok(Self {
            n_cells,
            n_bins,
            counts: vec![0; checked_size("n_cells * n_bins", n_cells, n_bins)?],
        })
    }

    /// Matrix from per-cell rows of equal length
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self> {
        let n_bins = rows.first().map_or(0, Vec::len);
        let mut counts = Vec::with_capacity(rows.len() * n_bins);
        for row in rows {
            ensure_len("spike row", n_bins, row.len())?;
            counts.extend_from_slice(row);
        }
        Ok(Self {
            n_cells: rows.len(),
            n_bins,
            counts,
        })
    }

    /// `(n_cells, n_bins)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_cells, self.n_bins)
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Counts for one cell across all bins
    ///
    /// # Panics
    ///
    /// Panics if `cell >= self.n_cells()`.
    pub fn row(&self, cell: usize) -> &[u32] {
        &self.counts[cell * self.n_bins..(cell + 1) * self.n_bins]
    }

    /// # Panics
    ///
    /// Panics if `cell` or `bin` is out of range.
    pub fn get(&self, cell: usize, bin: usize) -> u32 {
        self.counts[cell * self.n_bins + bin]
    }

    /// Row-major view of all counts
    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }

    /// Total spikes per cell
    pub fn spike_counts(&self) -> Vec<u64> {
        (0..self.n_cells)
            .map(|c| self.row(c).iter().map(|&k| k as u64).sum())
            .collect()
    }

    /// Total spikes in the matrix
    pub fn total_spikes(&self) -> u64 {
        self.counts.iter().map(|&k| k as u64).sum()
    }

    /// Times of every spike of `cell`; a bin with `k` spikes repeats its time `k` times
    ///
    /// Panics like [`SpikeMatrix::row`].
    pub fn spike_times(&self, cell: usize, trajectory: &Trajectory) -> Vec<f64> {
        self.gather(cell, trajectory.times())
    }

    /// Positions of every spike of `cell`
    pub fn spike_positions(&self, cell: usize, trajectory: &Trajectory) -> Vec<f64> {
        self.gather(cell, trajectory.positions())
    }

    fn gather(&self, cell: usize, values: &[f64]) -> Vec<f64> {
        self.row(cell)
            .iter()
            .zip(values)
            .flat_map(|(&k, &v)| std::iter::repeat(v).take(k as usize))
            .collect()
    }

    /// Rows of `self` followed by rows of `other`
    pub fn vstack(&self, other: &SpikeMatrix) -> Result<SpikeMatrix> {
        if self.n_bins != other.n_bins && self.n_cells > 0 && other.n_cells > 0 {
            return Err(SimError::ShapeMismatch {
                expected: (other.n_cells, self.n_bins),
                actual: other.shape(),
            });
        }
        let n_bins = if self.n_cells > 0 { self.n_bins } else { other.n_bins };
        let mut counts = Vec::with_capacity(self.counts.len() + other.counts.len());
        counts.extend_from_slice(&self.counts);
        counts.extend_from_slice(&other.counts);
        Ok(SpikeMatrix {
            n_cells: self.n_cells + other.n_cells,
            n_bins,
            counts,
        })
    }
}

/// Per-bin sampler shared by place and noise cells
struct BinSampler {
    sampling: Sampling,
    dt: f64,
    clamped: usize,
}

impl BinSampler {
    fn new(config: &SpikeConfig, dt: f64) -> Self {
        Self {
            sampling: config.sampling,
            dt,
            clamped: 0,
        }
    }

    #[inline]
    fn draw<R: Rng + ?Sized>(&mut self, rate: f64, rng: &mut R) -> Result<u32> {
        let expected = rate * self.dt;
        if !expected.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "rate * dt",
                value: expected,
                reason: "expected count per bin must be finite",
            });
        }
        Ok(match self.sampling {
            Sampling::Clamped => {
                if expected > 1.0 {
                    self.clamped += 1;
                }
                bernoulli(rng, expected) as u32
            }
            Sampling::Exact => bernoulli(rng, -(-expected).exp_m1()) as u32,
            Sampling::Poisson => poisson(rng, expected),
        })
    }

    fn report(&self, kind: &str) {
        if self.clamped > 0 {
            log::warn!(
                "{}: rate * dt exceeded 1 in {} bins (dt={}); probabilities clamped, use Sampling::Exact or Sampling::Poisson or a smaller dt",
                kind,
                self.clamped,
                self.dt
            );
        }
    }
}

/// Spike trains for a place-cell population along a trajectory.
///
/// Draw order is cell-major (all bins of cell 0, then cell 1, ...), so a
/// given seed always yields the same matrix.
pub fn generate_place_cell_spikes<R: Rng + ?Sized>(
    population: &PlaceCellPopulation,
    trajectory: &Trajectory,
    config: &SpikeConfig,
    rng: &mut R,
) -> Result<SpikeMatrix> {
    population.validate()?;

    let n_bins = trajectory.len();
    let mut spikes = SpikeMatrix::zeros(population.len(), n_bins)?;
    let mut sampler = BinSampler::new(config, trajectory.dt());

    for (cell, params) in population.cells().iter().enumerate() {
        let row = &mut spikes.counts[cell * n_bins..(cell + 1) * n_bins];
        for (slot, &x) in row.iter_mut().zip(trajectory.positions()) {
            *slot = sampler.draw(params.rate_at(x), rng)?;
        }
    }

    sampler.report("place cells");
    log::debug!(
        "place cells: {} cells x {} bins, {} spikes",
        spikes.n_cells,
        n_bins,
        spikes.total_spikes()
    );
    Ok(spikes)
}

/// Array-shaped entry point: parallel parameter arrays and raw
/// position/time sequences.
#[allow(clippy::too_many_arguments)]
pub fn place_cell_spikes_from_arrays<R: Rng + ?Sized>(
    centers: &[f64],
    sigmas: &[f64],
    peak_rates: &[f64],
    baseline_rate: f64,
    position: &[f64],
    time: &[f64],
    dt: f64,
    track_length: f64,
    config: &SpikeConfig,
    rng: &mut R,
) -> Result<SpikeMatrix> {
    let population = PlaceCellPopulation::from_arrays(centers, sigmas, peak_rates, baseline_rate)?;
    let trajectory = Trajectory::from_parts(position.to_vec(), time.to_vec(), dt, track_length)?;
    generate_place_cell_spikes(&population, &trajectory, config, rng)
}

/// Spike trains for constant-rate noise cells, one column per trajectory
/// sample. Position plays no part; only the sample count and `dt` matter.
pub fn generate_noise_cell_spikes<R: Rng + ?Sized>(
    cells: &[NoiseCellParams],
    trajectory: &Trajectory,
    config: &SpikeConfig,
    rng: &mut R,
) -> Result<SpikeMatrix> {
    for cell in cells {
        ensure_non_negative("firing_rate", cell.firing_rate)?;
    }

    let n_bins = trajectory.len();
    let mut spikes = SpikeMatrix::zeros(cells.len(), n_bins)?;
    let mut sampler = BinSampler::new(config, trajectory.dt());

    for (cell, params) in cells.iter().enumerate() {
        for slot in &mut spikes.counts[cell * n_bins..(cell + 1) * n_bins] {
            *slot = sampler.draw(params.firing_rate, rng)?;
        }
    }

    sampler.report("noise cells");
    log::debug!(
        "noise cells: {} cells x {} bins, {} spikes",
        spikes.n_cells,
        n_bins,
        spikes.total_spikes()
    );
    Ok(spikes)
}
