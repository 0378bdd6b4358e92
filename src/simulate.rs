//! Simulation Pipeline - one dataset per run
//!
//! Runs the stages in order with a single generator owned by the run:
//!
//! 1. trajectory
//! 2. place-cell population (random peak rates)
//! 3. place-cell spikes
//! 4. noise-cell population (random rates)
//! 5. noise-cell spikes
//!
//! The same `SimulationConfig` with the same seed always yields the same
//! `Dataset`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rng::seeded_rng;
use crate::spikes::{
    generate_noise_cell_spikes, generate_place_cell_spikes, NoiseCellConfig, NoiseCellParams,
    SpikeConfig, SpikeMatrix,
};
use crate::trajectory::{generate_trajectory, Trajectory, TrajectoryConfig};
use crate::tuning::{PlaceCellConfig, PlaceCellPopulation};

/// Everything needed to produce one dataset
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Generator seed; `None` draws from OS entropy
    pub seed: Option<u64>,
    pub trajectory: TrajectoryConfig,
    pub place_cells: PlaceCellConfig,
    pub noise_cells: NoiseCellConfig,
    pub spikes: SpikeConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: Some(42),
            trajectory: TrajectoryConfig::default(),
            place_cells: PlaceCellConfig::default(),
            noise_cells: NoiseCellConfig::default(),
            spikes: SpikeConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_trajectory(mut self, trajectory: TrajectoryConfig) -> Self {
        self.trajectory = trajectory;
        self
    }
}

/// Parameters and sizes of a generated dataset, for export alongside the
/// arrays
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub seed: Option<u64>,
    pub trajectory: TrajectoryConfig,
    pub spikes: SpikeConfig,
    pub n_samples: usize,
    pub n_place_cells: usize,
    pub n_noise_cells: usize,
}

impl DatasetMeta {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Output of one simulation run
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    trajectory: Trajectory,
    place_cells: PlaceCellPopulation,
    noise_cells: Vec<NoiseCellParams>,
    place_spikes: SpikeMatrix,
    noise_spikes: SpikeMatrix,
    meta: DatasetMeta,
}

impl Dataset {
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn place_cells(&self) -> &PlaceCellPopulation {
        &self.place_cells
    }

    pub fn noise_cells(&self) -> &[NoiseCellParams] {
        &self.noise_cells
    }

    pub fn place_spikes(&self) -> &SpikeMatrix {
        &self.place_spikes
    }

    pub fn noise_spikes(&self) -> &SpikeMatrix {
        &self.noise_spikes
    }

    /// Place-cell rows followed by noise-cell rows
    pub fn all_spikes(&self) -> Result<SpikeMatrix> {
        self.place_spikes.vstack(&self.noise_spikes)
    }

    pub fn meta(&self) -> &DatasetMeta {
        &self.meta
    }
}

/// Run the full pipeline for `config`.
pub fn simulate(config: &SimulationConfig) -> Result<Dataset> {
    let mut rng = seeded_rng(config.seed);

    let trajectory = generate_trajectory(&config.trajectory, &mut rng)?;
    let place_cells = config.place_cells.build(&mut rng)?;
    let place_spikes = generate_place_cell_spikes(&place_cells, &trajectory, &config.spikes, &mut rng)?;
    let noise_cells = config.noise_cells.build(&mut rng)?;
    let noise_spikes = generate_noise_cell_spikes(&noise_cells, &trajectory, &config.spikes, &mut rng)?;

    let meta = DatasetMeta {
        seed: config.seed,
        trajectory: config.trajectory.clone(),
        spikes: config.spikes,
        n_samples: trajectory.len(),
        n_place_cells: place_cells.len(),
        n_noise_cells: noise_cells.len(),
    };

    log::debug!(
        "dataset: {} samples, {} place cells ({} spikes), {} noise cells ({} spikes)",
        meta.n_samples,
        meta.n_place_cells,
        place_spikes.total_spikes(),
        meta.n_noise_cells,
        noise_spikes.total_spikes()
    );

    Ok(Dataset {
        trajectory,
        place_cells,
        noise_cells,
        place_spikes,
        noise_spikes,
        meta,
    })
}
