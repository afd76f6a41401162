use std::collections::HashMap;

use rayon::prelude::*;
use tinyjson::JsonValue;

use crate::{
    Error,
    json::{json_to_f64, json_to_u32, json_to_vec4},
    quaternion::{embed_slice, from_wxyz, norm2, powi},
    sdf::sdf_object::{DistanceField, check_arguments},
    vec::{Point3, Quat},
};

/// Largest accepted exponent. Past it `|z|^power` overflows after one step
/// for any point outside the unit ball anyway.
pub const MAX_POWER: u32 = 64;

/// Parameters of the quaternion Julia set `z → z^power + c`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalParameters {
    /// Julia constant, `[w, x, y, z]`
    pub c: [f64; 4],
    /// Integer exponent, at least 2
    pub power: u32,
    /// Fourth coordinate given to every sampled point
    pub slice: f64,
    pub iterations: u32,
    /// Squared escape radius
    pub bailout: f64,
    /// Subtracted from the raw estimate, thickens (`> 0`) or thins the set
    pub offset: f64,
    /// Multiplies the shifted estimate, `< 1` compensates overestimation
    pub correction: f64,
}

impl Default for FractalParameters {
    fn default() -> Self {
        Self {
            c: [0.0; 4],
            power: 2,
            slice: 0.0,
            iterations: 50,
            bailout: 1.0e8,
            offset: 0.0,
            correction: 0.9,
        }
    }
}

impl FractalParameters {
    pub fn validate(&self) -> crate::Result<()> {
        if !(2..=MAX_POWER).contains(&self.power) {
            return Err(Error::InvalidParameter(
                "power".to_string(),
                format!("must be an integer in 2..={MAX_POWER}, got {}", self.power),
            ));
        }
        if self.correction <= 0.0 || !self.correction.is_finite() {
            return Err(Error::InvalidParameter(
                "correction".to_string(),
                format!("must be a finite positive factor, got {}", self.correction),
            ));
        }
        if self.bailout.is_nan() || self.bailout <= 0.0 {
            return Err(Error::InvalidParameter(
                "bailout".to_string(),
                format!("must be positive, got {}", self.bailout),
            ));
        }
        Ok(())
    }
}

/// Iteration state of one sampled point.
#[derive(Clone, Copy, Debug)]
pub struct EscapeState {
    pub z: Quat,
    /// `|z|²`
    pub z2: f64,
    /// `|z'|²`, squared magnitude of the derivative
    pub zp2: f64,
    pub escaped: bool,
    /// Steps applied before the point froze
    pub iterations: u32,
}

impl EscapeState {
    #[must_use]
    pub fn new(z: Quat) -> Self {
        Self {
            z,
            z2: norm2(z),
            zp2: 1.0,
            escaped: false,
            iterations: 0,
        }
    }

    /// One step of the recurrence, the derivative is updated from the old `z`.
    fn step(&mut self, c: Quat, params: &FractalParameters) {
        let n = f64::from(params.power);
        self.zp2 = n * n * self.z2.powi(params.power as i32 - 1) * self.zp2;
        self.z = powi(self.z, params.power) + c;
        self.z2 = norm2(self.z);
        self.iterations += 1;
        // NaN never compares greater, so it keeps iterating and stays NaN
        if self.z2 > params.bailout {
            self.escaped = true;
        }
    }

    /// Distance estimate `sqrt(|z|²/|z'|²) · ½ ln |z|²`, shifted then scaled.
    #[must_use]
    pub fn distance(&self, params: &FractalParameters) -> f64 {
        let raw = (self.z2 / self.zp2).sqrt() * 0.5 * self.z2.ln();
        (raw - params.offset) * params.correction
    }
}

/// Escape-time distance estimator for a quaternion Julia set.
///
/// The estimate is not a strict lower bound on the distance to the set: it
/// can overshoot near thin features. `correction` scales it down to make the
/// voxelizer's block pruning safe in practice, but artifacts remain possible.
pub struct FractalDistanceEstimator {
    params: FractalParameters,
    c: Quat,
    name: &'static str,
}

impl FractalDistanceEstimator {
    pub fn new(params: FractalParameters) -> crate::Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            c: from_wxyz(params.c),
            name: "quaternion_julia",
        })
    }

    /// Parameters named `cx`, `cy`, `cz`, `cw`, `slice`, `power`, `iterations`,
    /// `bailout`, `offset` and `fudge_factor`.
    pub fn from_json(json: &HashMap<String, JsonValue>) -> crate::Result<Self> {
        check_arguments(
            "quaternion_julia",
            json,
            &[
                "cx",
                "cy",
                "cz",
                "cw",
                "slice",
                "power",
                "iterations",
                "bailout",
                "offset",
                "fudge_factor",
            ],
        )?;
        let d = FractalParameters::default();
        Self::new(FractalParameters {
            c: [
                json_to_f64(json, "cx", d.c[0])?,
                json_to_f64(json, "cy", d.c[1])?,
                json_to_f64(json, "cz", d.c[2])?,
                json_to_f64(json, "cw", d.c[3])?,
            ],
            power: json_to_u32(json, "power", d.power)?,
            slice: json_to_f64(json, "slice", d.slice)?,
            iterations: json_to_u32(json, "iterations", d.iterations)?,
            bailout: json_to_f64(json, "bailout", d.bailout)?,
            offset: json_to_f64(json, "offset", d.offset)?,
            correction: json_to_f64(json, "fudge_factor", d.correction)?,
        })
    }

    /// Older parameter names: `c` as a 4-array (required), `w`, `n`,
    /// `iterations`, `bailout_level` and `offset`. No correction is applied.
    pub fn from_legacy_json(json: &HashMap<String, JsonValue>) -> crate::Result<Self> {
        check_arguments(
            "julia",
            json,
            &["c", "w", "n", "iterations", "bailout_level", "offset"],
        )?;
        let c = json_to_vec4(json, "c")?
            .ok_or_else(|| Error::MissingParameter("julia".to_string(), "c"))?;
        let d = FractalParameters::default();
        let mut estimator = Self::new(FractalParameters {
            c,
            power: json_to_u32(json, "n", d.power)?,
            slice: json_to_f64(json, "w", d.slice)?,
            iterations: json_to_u32(json, "iterations", d.iterations)?,
            bailout: json_to_f64(json, "bailout_level", d.bailout)?,
            offset: json_to_f64(json, "offset", d.offset)?,
            correction: 1.0,
        })?;
        estimator.name = "julia";
        Ok(estimator)
    }

    #[must_use]
    pub const fn params(&self) -> &FractalParameters {
        &self.params
    }

    /// Run the recurrence on every point with a shared iteration budget.
    ///
    /// All points advance together; a point that escaped is masked out of the
    /// following steps instead of leaving the loop on its own.
    #[must_use]
    pub fn escape_states(&self, points: &[Point3]) -> Vec<EscapeState> {
        let mut states: Vec<EscapeState> = points
            .par_iter()
            .map(|p| EscapeState::new(embed_slice(*p, self.params.slice)))
            .collect();

        for _ in 0..self.params.iterations {
            states
                .par_iter_mut()
                .filter(|s| !s.escaped)
                .for_each(|s| s.step(self.c, &self.params));
        }
        states
    }

    /// Single point, same arithmetic as one lane of [`Self::escape_states`]
    #[must_use]
    pub fn escape_state(&self, p: Point3) -> EscapeState {
        let mut state = EscapeState::new(embed_slice(p, self.params.slice));
        for _ in 0..self.params.iterations {
            if state.escaped {
                break;
            }
            state.step(self.c, &self.params);
        }
        state
    }
}

impl DistanceField for FractalDistanceEstimator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn signed_distance(&self, p: Point3) -> f64 {
        self.escape_state(p).distance(&self.params)
    }

    fn signed_distance_batch(&self, points: &[Point3], out: &mut [f64]) {
        assert_eq!(points.len(), out.len(), "batch output has the wrong length");
        let states = self.escape_states(points);
        out.par_iter_mut()
            .zip(states.par_iter())
            .for_each(|(d, s)| *d = s.distance(&self.params));
    }

    fn is_lower_bound(&self) -> bool {
        false
    }
}
