//! Tuning Model - Gaussian place fields
//!
//! Expected firing rate as a function of position:
//!
//! ```text
//! rate(x) = baseline + (peak - baseline) * exp(-(x - center)^2 / (2 * width^2))
//! ```
//!
//! The field is bidirectional: it depends only on `|x - center|`, so a cell
//! fires the same whichever way the agent runs through it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{
    ensure_finite, ensure_len, ensure_non_negative, ensure_positive, Result, SimError, MAX_ELEMENTS,
};

/// Expected firing rate (Hz) of one place cell at `position`.
///
/// A zero `field_width` degenerates to a spike of height `peak_rate` at the
/// center and `baseline_rate` everywhere else.
#[inline]
pub fn expected_rate(
    position: f64,
    center: f64,
    field_width: f64,
    peak_rate: f64,
    baseline_rate: f64,
) -> f64 {
    let distance = position - center;
    let gain = if field_width > 0.0 {
        let z = distance / field_width;
        // z * z may overflow to inf; exp(-inf) is exactly 0
        (-0.5 * z * z).exp()
    } else if distance == 0.0 {
        1.0
    } else {
        0.0
    };
    (baseline_rate + (peak_rate - baseline_rate) * gain).max(0.0)
}

/// One place cell's tuning parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceCellParams {
    /// Field center (m)
    pub center: f64,
    /// Gaussian sigma (m)
    pub field_width: f64,
    /// Rate at the center (Hz)
    pub peak_rate: f64,
    /// Rate far from the field (Hz)
    pub baseline_rate: f64,
}

impl PlaceCellParams {
    /// Validated constructor. `peak_rate > baseline_rate` is not required.
    pub fn new(center: f64, field_width: f64, peak_rate: f64, baseline_rate: f64) -> Result<Self> {
        let params = Self {
            center,
            field_width,
            peak_rate,
            baseline_rate,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("center", self.center)?;
        ensure_non_negative("field_width", self.field_width)?;
        ensure_non_negative("peak_rate", self.peak_rate)?;
        ensure_non_negative("baseline_rate", self.baseline_rate)
    }

    /// Expected rate at one position
    #[inline]
    pub fn rate_at(&self, position: f64) -> f64 {
        expected_rate(
            position,
            self.center,
            self.field_width,
            self.peak_rate,
            self.baseline_rate,
        )
    }

    /// Expected rate at every position of a sequence
    pub fn rates(&self, positions: &[f64]) -> Vec<f64> {
        positions.iter().map(|&x| self.rate_at(x)).collect()
    }
}

/// Ordered set of place cells; index is cell identity.
///
/// Deserialized populations are validated like [`PlaceCellPopulation::new`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PopulationParts")]
pub struct PlaceCellPopulation {
    cells: Vec<PlaceCellParams>,
}

#[derive(Deserialize)]
struct PopulationParts {
    cells: Vec<PlaceCellParams>,
}

impl TryFrom<PopulationParts> for PlaceCellPopulation {
    type Error = SimError;

    fn try_from(parts: PopulationParts) -> Result<Self> {
        Self::new(parts.cells)
    }
}

impl PlaceCellPopulation {
    /// Population from a list of cells, each checked with
    /// [`PlaceCellParams::validate`]
    pub fn new(cells: Vec<PlaceCellParams>) -> Result<Self> {
        for cell in &cells {
            cell.validate()?;
        }
        Ok(Self { cells })
    }

    /// Population from parallel arrays with one shared baseline
    pub fn from_arrays(
        centers: &[f64],
        sigmas: &[f64],
        peak_rates: &[f64],
        baseline_rate: f64,
    ) -> Result<Self> {
        let baselines = vec![baseline_rate; centers.len()];
        Self::from_arrays_per_cell(centers, sigmas, peak_rates, &baselines)
    }

    /// Population from parallel arrays with a baseline per cell
    pub fn from_arrays_per_cell(
        centers: &[f64],
        sigmas: &[f64],
        peak_rates: &[f64],
        baseline_rates: &[f64],
    ) -> Result<Self> {
        let n = centers.len();
        ensure_len("sigmas", n, sigmas.len())?;
        ensure_len("peak_rates", n, peak_rates.len())?;
        ensure_len("baseline_rates", n, baseline_rates.len())?;

        let cells = (0..n)
            .map(|i| PlaceCellParams::new(centers[i], sigmas[i], peak_rates[i], baseline_rates[i]))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { cells })
    }

    /// `n` cells with centers evenly spaced over `[start, end]` (inclusive)
    pub fn evenly_spaced(
        n: usize,
        start: f64,
        end: f64,
        field_width: f64,
        peak_rate: f64,
        baseline_rate: f64,
    ) -> Result<Self> {
        let centers = linspace(start, end, n);
        let sigmas = vec![field_width; n];
        let peaks = vec![peak_rate; n];
        Self::from_arrays(&centers, &sigmas, &peaks, baseline_rate)
    }

    pub fn cells(&self) -> &[PlaceCellParams] {
        &self.cells
    }

    /// Re-check every cell
    pub fn validate(&self) -> Result<()> {
        self.cells.iter().try_for_each(PlaceCellParams::validate)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn centers(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.center).collect()
    }

    pub fn peak_rates(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.peak_rate).collect()
    }
}

/// Recipe for an evenly spaced population with random peak rates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceCellConfig {
    /// Number of place cells
    pub n_cells: usize,
    /// First field center (m)
    pub first_center: f64,
    /// Last field center (m)
    pub last_center: f64,
    /// Field width shared by all cells (m)
    pub field_width: f64,
    /// Lower bound for peak rates (Hz)
    pub min_peak_rate: f64,
    /// Upper bound for peak rates (Hz)
    pub max_peak_rate: f64,
    /// Shared baseline (Hz)
    pub baseline_rate: f64,
}

impl Default for PlaceCellConfig {
    fn default() -> Self {
        Self {
            n_cells: 20,
            first_center: 0.1,
            last_center: 0.9,
            field_width: 0.1,
            min_peak_rate: 5.0,
            max_peak_rate: 20.0,
            baseline_rate: 0.5,
        }
    }
}

impl PlaceCellConfig {
    /// Draw peak rates uniformly from `[min_peak_rate, max_peak_rate]`
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PlaceCellPopulation> {
        ensure_positive("field_width", self.field_width)?;
        ensure_non_negative("min_peak_rate", self.min_peak_rate)?;
        ensure_non_negative("max_peak_rate", self.max_peak_rate)?;
        if self.max_peak_rate < self.min_peak_rate {
            return Err(SimError::InvalidParameter {
                name: "max_peak_rate",
                value: self.max_peak_rate,
                reason: "must be >= min_peak_rate",
            });
        }

        let centers = linspace(self.first_center, self.last_center, self.n_cells);
        let sigmas = vec![self.field_width; self.n_cells];
        let peaks: Vec<f64> = (0..self.n_cells)
            .map(|_| rng.gen_range(self.min_peak_rate..=self.max_peak_rate))
            .collect();
        PlaceCellPopulation::from_arrays(&centers, &sigmas, &peaks, self.baseline_rate)
    }
}

/// Tuning curves sampled on a regular grid
#[derive(Clone, Debug, PartialEq)]
pub struct TheoreticalRateMaps {
    /// Grid positions over `[0, track_length]`
    pub x: Vec<f64>,
    /// `rates[cell][i]` is the expected rate of `cell` at `x[i]`
    pub rates: Vec<Vec<f64>>,
}

/// Evaluate every cell's tuning curve on `n_points` positions spanning the
/// track, for comparison against empirical rate maps.
pub fn theoretical_rate_maps(
    population: &PlaceCellPopulation,
    track_length: f64,
    n_points: usize,
) -> Result<TheoreticalRateMaps> {
    ensure_positive("track_length", track_length)?;
    if n_points < 2 {
        return Err(SimError::InvalidParameter {
            name: "n_points",
            value: n_points as f64,
            reason: "must be >= 2",
        });
    }
    if n_points > MAX_ELEMENTS {
        return Err(SimError::InvalidParameter {
            name: "n_points",
            value: n_points as f64,
            reason: "too many points to allocate",
        });
    }

    let x = linspace(0.0, track_length, n_points);
    let rates = population.cells().iter().map(|cell| cell.rates(&x)).collect();
    Ok(TheoreticalRateMaps { x, rates })
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
