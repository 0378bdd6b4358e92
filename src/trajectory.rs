//! Trajectory Simulator - OU velocity on a bounded linear track
//!
//! Velocity follows an Ornstein-Uhlenbeck process integrated with
//! Euler-Maruyama; position integrates velocity and bounces off both ends
//! of the track.
//!
//! ## Integration
//!
//! ```text
//! v[t+1] = v[t] + theta * (mu - v[t]) * dt + sigma * sqrt(dt) * N(0, 1)
//! x[t+1] = x[t] + v[t+1] * dt
//! ```
//!
//! Accuracy degrades once `theta * dt` stops being small; this is reported
//! with a warning. From `theta * dt >= 2` on the explicit step amplifies
//! velocity every step, so such configs are rejected. A run whose velocity
//! still overflows (huge `sigma`) fails instead of producing NaN positions.
//!
//! ## Sample Count
//!
//! `n = max(1, round(duration_s / dt))` samples, the first at `t = 0`, so the
//! last sample sits at `(n - 1) * dt`. Spike matrices use the same width.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{
    ensure_finite, ensure_len, ensure_non_negative, ensure_positive, ensure_unit_interval,
    Result, SimError, MAX_ELEMENTS,
};
use crate::rng::standard_normal;

/// `theta * dt` above this triggers the accuracy warning
const STIFFNESS_WARN: f64 = 0.1;

/// `theta * dt` at or above this makes the Euler step diverge
const STIFFNESS_LIMIT: f64 = 2.0;

/// Allowed deviation of recorded sample spacing from `dt`, relative to `dt`
const SPACING_TOLERANCE: f64 = 1e-6;

/// Which end of the track the undersampling bias avoids
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackEnd {
    /// Position 0
    #[default]
    Start,
    /// Position `track_length`
    End,
}

/// Position-dependent drift that makes the agent visit one end less often.
///
/// Inside the zone `extent * track_length` from `end`, with chance
/// `probability` per step, velocity gains `strength * (1 - d / zone) * dt`
/// pointing away from that end (`d` = distance to the end). The push is
/// strongest at the wall and fades to zero at the zone edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Undersampling {
    /// End of the track to undersample
    pub end: TrackEnd,
    /// Zone size as a fraction of the track, in (0, 1]
    pub extent: f64,
    /// Peak drift acceleration (m/s^2)
    pub strength: f64,
    /// Chance per step that the drift applies, in [0, 1]
    pub probability: f64,
}

impl Default for Undersampling {
    fn default() -> Self {
        Self {
            end: TrackEnd::Start,
            extent: 0.25,
            strength: 1.0,
            probability: 1.0,
        }
    }
}

impl Undersampling {
    fn validate(&self) -> Result<()> {
        ensure_unit_interval("undersample.extent", self.extent)?;
        if self.extent == 0.0 {
            return Err(SimError::InvalidParameter {
                name: "undersample.extent",
                value: self.extent,
                reason: "must be > 0",
            });
        }
        ensure_non_negative("undersample.strength", self.strength)?;
        ensure_unit_interval("undersample.probability", self.probability)
    }

    /// Velocity increment for one step at `position`, before the coin flip
    fn drift(&self, position: f64, track_length: f64, dt: f64) -> f64 {
        let zone = self.extent * track_length;
        let (distance, direction) = match self.end {
            TrackEnd::Start => (position, 1.0),
            TrackEnd::End => (track_length - position, -1.0),
        };
        if distance >= zone {
            return 0.0;
        }
        direction * self.strength * (1.0 - distance / zone) * dt
    }
}

/// Trajectory generation parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Track length (m)
    pub track_length: f64,
    /// Integration step (s)
    pub dt: f64,
    /// Total simulated time (s)
    pub duration_s: f64,
    /// Velocity mean-reversion rate (1/s)
    pub theta: f64,
    /// Target mean velocity (m/s)
    pub mu: f64,
    /// Velocity diffusion coefficient
    pub sigma: f64,
    /// Initial velocity (m/s)
    pub v0: f64,
    /// Initial position (m); track midpoint when `None`
    pub start_position: Option<f64>,
    /// Optional bias away from one end of the track
    pub undersample: Option<Undersampling>,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            track_length: 1.0,
            dt: 0.005,
            duration_s: 300.0,
            theta: 1.0,
            mu: 0.0,
            sigma: 0.4,
            v0: 0.0,
            start_position: None,
            undersample: None,
        }
    }
}

impl TrajectoryConfig {
    /// Config with the core OU parameters set explicitly
    pub fn new(
        track_length: f64,
        dt: f64,
        duration_s: f64,
        theta: f64,
        mu: f64,
        sigma: f64,
        v0: f64,
    ) -> Self {
        Self {
            track_length,
            dt,
            duration_s,
            theta,
            mu,
            sigma,
            v0,
            ..Default::default()
        }
    }

    /// Enable the undersampling bias
    pub fn with_undersampling(mut self, undersample: Undersampling) -> Self {
        self.undersample = Some(undersample);
        self
    }

    /// Set the initial position
    pub fn with_start_position(mut self, position: f64) -> Self {
        self.start_position = Some(position);
        self
    }

    /// Number of samples this config produces
    pub fn n_steps(&self) -> Result<usize> {
        ensure_positive("dt", self.dt)?;
        ensure_positive("duration_s", self.duration_s)?;
        let steps = (self.duration_s / self.dt).round();
        if !(steps <= MAX_ELEMENTS as f64) {
            return Err(SimError::InvalidParameter {
                name: "duration_s / dt",
                value: steps,
                reason: "too many samples to allocate",
            });
        }
        Ok((steps as usize).max(1))
    }

    /// Reject parameters that would produce meaningless data
    pub fn validate(&self) -> Result<()> {
        ensure_positive("track_length", self.track_length)?;
        ensure_positive("dt", self.dt)?;
        ensure_positive("duration_s", self.duration_s)?;
        ensure_non_negative("theta", self.theta)?;
        if self.theta * self.dt >= STIFFNESS_LIMIT {
            return Err(SimError::InvalidParameter {
                name: "theta * dt",
                value: self.theta * self.dt,
                reason: "must be < 2 for a stable Euler step",
            });
        }
        self.n_steps()?;
        ensure_finite("mu", self.mu)?;
        ensure_non_negative("sigma", self.sigma)?;
        ensure_finite("v0", self.v0)?;
        if let Some(start) = self.start_position {
            ensure_finite("start_position", start)?;
            if !(0.0..=self.track_length).contains(&start) {
                return Err(SimError::InvalidParameter {
                    name: "start_position",
                    value: start,
                    reason: "must lie on the track",
                });
            }
        }
        if let Some(undersample) = &self.undersample {
            undersample.validate()?;
        }
        Ok(())
    }
}

/// Simulated positions over time. Immutable once built.
///
/// Deserializing runs the same checks as [`Trajectory::from_parts`], with
/// the stored velocities kept as they are.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrajectoryParts")]
pub struct Trajectory {
    position: Vec<f64>,
    velocity: Vec<f64>,
    time: Vec<f64>,
    dt: f64,
    track_length: f64,
}

/// Serialized form of [`Trajectory`], checked before use
#[derive(Deserialize)]
struct TrajectoryParts {
    position: Vec<f64>,
    velocity: Vec<f64>,
    time: Vec<f64>,
    dt: f64,
    track_length: f64,
}

impl TryFrom<TrajectoryParts> for Trajectory {
    type Error = SimError;

    fn try_from(parts: TrajectoryParts) -> Result<Self> {
        Self::checked(parts.position, parts.velocity, parts.time, parts.dt, parts.track_length)
    }
}

impl Trajectory {
    /// Wrap externally recorded positions.
    ///
    /// Velocity is estimated by forward differences (last sample repeats the
    /// previous one). Samples must be spaced by `dt` and every position must
    /// lie in `[0, track_length]`.
    pub fn from_parts(
        position: Vec<f64>,
        time: Vec<f64>,
        dt: f64,
        track_length: f64,
    ) -> Result<Self> {
        ensure_positive("dt", dt)?;

        let mut velocity = Vec::with_capacity(position.len());
        for pair in position.windows(2) {
            velocity.push((pair[1] - pair[0]) / dt);
        }
        if !position.is_empty() {
            velocity.push(velocity.last().copied().unwrap_or(0.0));
        }

        Self::checked(position, velocity, time, dt, track_length)
    }

    fn checked(
        position: Vec<f64>,
        velocity: Vec<f64>,
        time: Vec<f64>,
        dt: f64,
        track_length: f64,
    ) -> Result<Self> {
        ensure_positive("dt", dt)?;
        ensure_positive("track_length", track_length)?;
        ensure_len("time", position.len(), time.len())?;
        ensure_len("velocity", position.len(), velocity.len())?;

        for &x in &position {
            ensure_finite("position", x)?;
            if !(0.0..=track_length).contains(&x) {
                return Err(SimError::InvalidParameter {
                    name: "position",
                    value: x,
                    reason: "must lie in [0, track_length]",
                });
            }
        }
        for &v in &velocity {
            ensure_finite("velocity", v)?;
        }
        for &t in &time {
            ensure_finite("time", t)?;
        }
        for pair in time.windows(2) {
            let step = pair[1] - pair[0];
            if !((step - dt).abs() <= SPACING_TOLERANCE * dt) {
                return Err(SimError::InvalidParameter {
                    name: "time",
                    value: step,
                    reason: "sample spacing must equal dt",
                });
            }
        }

        Ok(Self {
            position,
            velocity,
            time,
            dt,
            track_length,
        })
    }

    /// Positions (m), one per sample
    pub fn positions(&self) -> &[f64] {
        &self.position
    }

    /// Velocities (m/s) after reflection, one per sample
    pub fn velocities(&self) -> &[f64] {
        &self.velocity
    }

    /// Sample times (s)
    pub fn times(&self) -> &[f64] {
        &self.time
    }

    /// Sample spacing (s)
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Track length (m)
    pub fn track_length(&self) -> f64 {
        self.track_length
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Time covered by the samples (`len * dt`)
    pub fn duration(&self) -> f64 {
        self.len() as f64 * self.dt
    }
}

/// Fold a position back onto `[0, track_length]`, flipping velocity once
/// per wall hit.
///
/// Uses folding with period `2 * track_length`, so an overshoot of several
/// track lengths lands where repeated reflection would put it. Positions
/// already on the track are returned unchanged. A non-finite position has no
/// fold; it is pinned to the wall it ran into (`0` for NaN) with velocity
/// reversed.
pub fn reflect_into_track(position: f64, velocity: f64, track_length: f64) -> (f64, f64) {
    if (0.0..=track_length).contains(&position) {
        return (position, velocity);
    }
    if !position.is_finite() {
        let wall = if position > 0.0 { track_length } else { 0.0 };
        return (wall, -velocity);
    }

    let period = 2.0 * track_length;
    let folded = position.rem_euclid(period);
    if folded <= track_length {
        (folded, velocity)
    } else {
        (period - folded, -velocity)
    }
}

/// Simulate one trajectory.
///
/// Draws one standard normal per step from `rng` (plus one uniform per
/// step inside an undersampling zone).
pub fn generate_trajectory<R: Rng + ?Sized>(
    config: &TrajectoryConfig,
    rng: &mut R,
) -> Result<Trajectory> {
    config.validate()?;

    let n = config.n_steps()?;
    let dt = config.dt;
    let track_length = config.track_length;

    if config.theta * dt > STIFFNESS_WARN {
        log::warn!(
            "theta * dt = {:.3} is not small; OU integration accuracy degrades",
            config.theta * dt
        );
    }

    let time: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
    let mut position = vec![0.0; n];
    let mut velocity = vec![0.0; n];
    position[0] = config.start_position.unwrap_or(0.5 * track_length);
    velocity[0] = config.v0;

    let noise_scale = config.sigma * dt.sqrt();
    let mut reflections = 0usize;

    for t in 0..n - 1 {
        let v = velocity[t];
        let mut v_next =
            v + config.theta * (config.mu - v) * dt + noise_scale * standard_normal(rng);

        if let Some(undersample) = &config.undersample {
            let push = undersample.drift(position[t], track_length, dt);
            if push != 0.0 && rng.gen_bool(undersample.probability) {
                v_next += push;
            }
        }

        let raw = position[t] + v_next * dt;
        if !raw.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "sigma",
                value: config.sigma,
                reason: "velocity overflowed during integration",
            });
        }
        let (x, v_out) = reflect_into_track(raw, v_next, track_length);
        if x != raw {
            reflections += 1;
        }
        position[t + 1] = x;
        velocity[t + 1] = v_out;
    }

    log::debug!(
        "trajectory: {} samples, dt={}, {} boundary reflections",
        n,
        dt,
        reflections
    );

    Ok(Trajectory {
        position,
        velocity,
        time,
        dt,
        track_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    fn scenario() -> TrajectoryConfig {
        TrajectoryConfig::new(1.0, 0.01, 10.0, 1.0, 0.0, 0.4, 0.0)
    }

    #[test]
    fn test_scenario_length_and_bounds() {
        let mut rng = seeded_rng(Some(42));
        let traj = generate_trajectory(&scenario(), &mut rng).unwrap();

        assert_eq!(traj.len(), 1000);
        assert_eq!(traj.times().len(), 1000);
        assert_eq!(traj.velocities().len(), 1000);
        assert!(traj.positions().iter().all(|&x| (0.0..=1.0).contains(&x)));
        assert_eq!(traj.positions()[0], 0.5);
    }

    #[test]
    fn test_time_uniform_spacing() {
        let mut rng = seeded_rng(Some(5));
        let traj = generate_trajectory(&scenario(), &mut rng).unwrap();

        assert_eq!(traj.times()[0], 0.0);
        for pair in traj.times().windows(2) {
            assert!(pair[1] > pair[0]);
            assert!((pair[1] - pair[0] - 0.01).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reflect_above_track() {
        let eps = 0.05;
        let (x, v) = reflect_into_track(1.0 + eps, 0.3, 1.0);
        assert!((x - (1.0 - eps)).abs() < 1e-12);
        assert_eq!(v, -0.3);
    }

    #[test]
    fn test_reflect_below_track() {
        let (x, v) = reflect_into_track(-0.2, -1.5, 1.0);
        assert!((x - 0.2).abs() < 1e-12);
        assert_eq!(v, 1.5);
    }

    #[test]
    fn test_reflect_multiple_track_lengths() {
        // Up past 1.0, back down past 0.0, ends at 0.3 moving up again
        let (x, v) = reflect_into_track(2.3, 4.0, 1.0);
        assert!((x - 0.3).abs() < 1e-12);
        assert_eq!(v, 4.0);

        // Three wall hits: 3.4 -> 0.6 moving down
        let (x, v) = reflect_into_track(3.4, 4.0, 1.0);
        assert!((x - 0.6).abs() < 1e-12);
        assert_eq!(v, -4.0);

        let (x, _) = reflect_into_track(-7.25, -1.0, 2.0);
        assert!((0.0..=2.0).contains(&x));
        assert!((x - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_in_range_untouched() {
        assert_eq!(reflect_into_track(0.0, 1.0, 1.0), (0.0, 1.0));
        assert_eq!(reflect_into_track(1.0, 1.0, 1.0), (1.0, 1.0));
        assert_eq!(reflect_into_track(0.37, -2.0, 1.0), (0.37, -2.0));
    }

    #[test]
    fn test_reflect_non_finite_pins_to_wall() {
        assert_eq!(reflect_into_track(f64::INFINITY, 2.0, 1.0), (1.0, -2.0));
        assert_eq!(reflect_into_track(f64::NEG_INFINITY, -2.0, 1.0), (0.0, 2.0));
        let (x, _) = reflect_into_track(f64::NAN, 1.0, 1.0);
        assert_eq!(x, 0.0);
    }

    #[test]
    fn test_unstable_integration_rejected() {
        // theta * dt = 10: every Euler step multiplies velocity by -9
        let stiff = TrajectoryConfig::new(1.0, 0.01, 10.0, 1000.0, 0.0, 0.4, 0.0);
        let err = generate_trajectory(&stiff, &mut seeded_rng(Some(0))).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "theta * dt", .. }));

        // Just below the limit still runs and stays on the track
        let edgy = TrajectoryConfig::new(1.0, 0.01, 10.0, 190.0, 0.0, 0.4, 0.0);
        let traj = generate_trajectory(&edgy, &mut seeded_rng(Some(0))).unwrap();
        assert!(traj.positions().iter().all(|&x| (0.0..=1.0).contains(&x)));

        // Diffusion so large the velocity overflows
        let wild = TrajectoryConfig::new(1.0, 1.0, 1000.0, 0.0, 0.0, 1e308, 0.0);
        let err = generate_trajectory(&wild, &mut seeded_rng(Some(0))).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "sigma", .. }));
    }

    #[test]
    fn test_unallocatable_sample_count_rejected() {
        let config = TrajectoryConfig { dt: 1e-300, ..scenario() };
        assert!(config.n_steps().is_err());
        assert!(generate_trajectory(&config, &mut seeded_rng(Some(0))).is_err());
        assert_eq!(scenario().n_steps().unwrap(), 1000);
    }

    #[test]
    fn test_violent_process_stays_in_bounds() {
        // Huge diffusion with coarse steps overshoots by several track lengths
        let config = TrajectoryConfig::new(0.5, 0.1, 200.0, 0.5, 0.0, 50.0, 10.0);
        let mut rng = seeded_rng(Some(9));
        let traj = generate_trajectory(&config, &mut rng).unwrap();

        assert_eq!(traj.len(), 2000);
        assert!(traj.positions().iter().all(|&x| (0.0..=0.5).contains(&x)));
    }

    #[test]
    fn test_reproducible_with_seed() {
        let a = generate_trajectory(&scenario(), &mut seeded_rng(Some(1))).unwrap();
        let b = generate_trajectory(&scenario(), &mut seeded_rng(Some(1))).unwrap();
        let c = generate_trajectory(&scenario(), &mut seeded_rng(Some(2))).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.positions(), c.positions());
    }

    #[test]
    fn test_zero_noise_is_deterministic_drift() {
        // No diffusion, no reversion: constant velocity bouncing between walls
        let config = TrajectoryConfig::new(1.0, 0.01, 3.0, 0.0, 0.0, 0.0, 1.0);
        let traj = generate_trajectory(&config, &mut seeded_rng(Some(0))).unwrap();

        // 0.5 -> hits 1.0 after 0.5 s, back at 0.5 by t = 1.0 s moving down
        let i = 100;
        assert!((traj.positions()[i] - 0.5).abs() < 1e-9);
        assert!(traj.velocities()[i] < 0.0);
        assert!(traj.positions().iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut rng = seeded_rng(Some(0));
        let bad = [
            TrajectoryConfig { track_length: 0.0, ..scenario() },
            TrajectoryConfig { dt: -0.01, ..scenario() },
            TrajectoryConfig { duration_s: 0.0, ..scenario() },
            TrajectoryConfig { sigma: -1.0, ..scenario() },
            TrajectoryConfig { theta: f64::NAN, ..scenario() },
            scenario().with_start_position(1.5),
        ];
        for config in &bad {
            assert!(generate_trajectory(config, &mut rng).is_err(), "{config:?}");
        }
    }

    #[test]
    fn test_short_duration_keeps_one_sample() {
        let config = TrajectoryConfig { duration_s: 0.001, ..scenario() };
        let traj = generate_trajectory(&config, &mut seeded_rng(Some(0))).unwrap();
        assert_eq!(traj.len(), 1);
        assert_eq!(traj.times(), &[0.0]);
    }

    #[test]
    fn test_undersampling_reduces_occupancy_near_start() {
        let base = TrajectoryConfig { duration_s: 600.0, ..TrajectoryConfig::default() };
        let biased = base.clone().with_undersampling(Undersampling {
            end: TrackEnd::Start,
            extent: 0.3,
            strength: 5.0,
            probability: 1.0,
        });

        let near_start = |traj: &Trajectory| {
            let n = traj.positions().iter().filter(|&&x| x < 0.2).count();
            n as f64 / traj.len() as f64
        };

        let plain = generate_trajectory(&base, &mut seeded_rng(Some(3))).unwrap();
        let pushed = generate_trajectory(&biased, &mut seeded_rng(Some(3))).unwrap();

        assert!(pushed.positions().iter().all(|&x| (0.0..=1.0).contains(&x)));
        assert!(
            near_start(&pushed) < 0.5 * near_start(&plain),
            "plain {} vs biased {}",
            near_start(&plain),
            near_start(&pushed)
        );
    }

    #[test]
    fn test_undersampling_far_end_with_partial_probability() {
        let base = TrajectoryConfig { duration_s: 600.0, ..TrajectoryConfig::default() };
        let biased = base.clone().with_undersampling(Undersampling {
            end: TrackEnd::End,
            extent: 0.3,
            strength: 10.0,
            probability: 0.5,
        });

        let near_end = |traj: &Trajectory| {
            let n = traj.positions().iter().filter(|&&x| x > 0.8).count();
            n as f64 / traj.len() as f64
        };
        let near_start = |traj: &Trajectory| {
            let n = traj.positions().iter().filter(|&&x| x < 0.2).count();
            n as f64 / traj.len() as f64
        };

        let plain = generate_trajectory(&base, &mut seeded_rng(Some(4))).unwrap();
        let pushed = generate_trajectory(&biased, &mut seeded_rng(Some(4))).unwrap();

        assert!(pushed.positions().iter().all(|&x| (0.0..=1.0).contains(&x)));
        assert!(
            near_end(&pushed) < 0.5 * near_end(&plain),
            "plain {} vs biased {}",
            near_end(&plain),
            near_end(&pushed)
        );
        // The opposite end is not avoided
        assert!(near_start(&pushed) > near_end(&pushed));
    }

    #[test]
    fn test_undersampling_validation() {
        let config = scenario().with_undersampling(Undersampling {
            probability: 1.2,
            ..Default::default()
        });
        assert!(config.validate().is_err());

        let config = scenario().with_undersampling(Undersampling {
            extent: 0.0,
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_parts_validation() {
        let ok = Trajectory::from_parts(vec![0.1, 0.2, 0.4], vec![0.0, 0.1, 0.2], 0.1, 1.0).unwrap();
        assert_eq!(ok.len(), 3);
        assert!((ok.velocities()[0] - 1.0).abs() < 1e-9);
        assert!((ok.velocities()[2] - 2.0).abs() < 1e-9);

        assert!(Trajectory::from_parts(vec![0.1, 1.2], vec![0.0, 0.1], 0.1, 1.0).is_err());
        assert!(Trajectory::from_parts(vec![0.1, 0.2], vec![0.0], 0.1, 1.0).is_err());
        assert!(Trajectory::from_parts(vec![0.1, 0.2], vec![0.1, 0.1], 0.1, 1.0).is_err());
    }

    #[test]
    fn test_from_parts_requires_dt_spacing() {
        // Increasing but spaced 0.1 s with dt = 0.01
        let err = Trajectory::from_parts(vec![0.0, 0.5, 0.7], vec![0.1, 0.2, 0.3], 0.01, 1.0)
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "time", .. }));

        // Uneven spacing
        assert!(Trajectory::from_parts(vec![0.0; 3], vec![0.0, 0.01, 0.03], 0.01, 1.0).is_err());

        // Recorded times need not start at zero
        let shifted: Vec<f64> = (0..50).map(|i| 12.0 + i as f64 * 0.01).collect();
        assert!(Trajectory::from_parts(vec![0.5; 50], shifted, 0.01, 1.0).is_ok());
    }

    #[test]
    fn test_trajectory_json_is_validated() {
        let traj = generate_trajectory(&scenario(), &mut seeded_rng(Some(6))).unwrap();
        let json = serde_json::to_string(&traj).unwrap();
        let restored: Trajectory = serde_json::from_str(&json).unwrap();
        assert_eq!(traj, restored);

        let broken = r#"{"position":[5.0,-3.0],"velocity":[],"time":[1.0],"dt":-1.0,"track_length":1.0}"#;
        assert!(serde_json::from_str::<Trajectory>(broken).is_err());

        let off_track = r#"{"position":[0.5,1.5],"velocity":[0.0,0.0],"time":[0.0,0.1],"dt":0.1,"track_length":1.0}"#;
        assert!(serde_json::from_str::<Trajectory>(off_track).is_err());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = scenario().with_undersampling(Undersampling::default());
        let json = serde_json::to_string(&config).unwrap();
        let restored: TrajectoryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);

        // Missing keys fall back to defaults
        let partial: TrajectoryConfig = serde_json::from_str(r#"{"dt": 0.01}"#).unwrap();
        assert_eq!(partial.dt, 0.01);
        assert_eq!(partial.track_length, 1.0);
    }
}
