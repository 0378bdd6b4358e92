//! # Placesim - Synthetic Place-Cell Datasets
//!
//! Toy hippocampal recordings for testing decoders and analysis code: an
//! agent running on a 1-D track, place cells with Gaussian fields, and
//! constant-rate noise cells.
//!
//! ## Pipeline
//!
//! 1. **Trajectory**: OU velocity, Euler-Maruyama, reflecting walls
//! 2. **Tuning**: position → expected rate per place cell
//! 3. **Spikes**: per-bin Bernoulli/Poisson draws from the expected rate
//! 4. **Rate maps**: spikes / occupancy per spatial bin, for validation
//!
//! Stages run in order; nothing flows backwards. Every stochastic stage
//! takes an explicit generator, so a seed pins down the whole dataset.
//!
//! ## Example
//!
//! ```ignore
//! use placesim::{simulate, compute_rate_maps, RateMapConfig, SimulationConfig};
//!
//! let dataset = simulate(&SimulationConfig::default())?;
//! let maps = compute_rate_maps(
//!     dataset.place_spikes(),
//!     dataset.trajectory(),
//!     &RateMapConfig::default().with_bins(100),
//! )?;
//! let (center, peak_hz) = maps.peak(0).unwrap();
//! ```

// Error types
mod error;
pub use error::{Result, SimError};

// Seeded generators and per-bin draws
pub mod rng;
pub use rng::seeded_rng;

// Agent movement
pub mod trajectory;
pub use trajectory::{
    generate_trajectory, reflect_into_track,
    TrackEnd, Trajectory, TrajectoryConfig, Undersampling,
};

// Place fields
pub mod tuning;
pub use tuning::{
    expected_rate, theoretical_rate_maps,
    PlaceCellConfig, PlaceCellParams, PlaceCellPopulation, TheoreticalRateMaps,
};

// Spike trains
pub mod spikes;
pub use spikes::{
    generate_noise_cell_spikes, generate_place_cell_spikes, place_cell_spikes_from_arrays,
    NoiseCellConfig, NoiseCellParams, Sampling, SpikeConfig, SpikeMatrix,
};

// Empirical rate maps
pub mod ratemap;
pub use ratemap::{
    compute_empirical_rate_maps, compute_rate_maps, gaussian_smooth, occupancy_fraction,
    BinRange, EmptyBins, RateMapConfig, RateMaps,
};

// End-to-end dataset generation
pub mod simulate;
pub use simulate::{simulate, Dataset, DatasetMeta, SimulationConfig};
