//! Residual phase tracking
//!
//! Extended Kalman filter over the state `[re, im, theta]`: the combined pilot
//! phasor and its per-symbol rotation. Each symbol the phasor is rotated by
//! `theta`, then corrected against the measured pilot sum. The conjugate of
//! the normalised phasor is the correction applied to that symbol.

use tracing::trace;

use crate::linalg::{abs_eigenvalues, add3, diag3, mul3, scale3, solve2, transpose3, Matrix2, Matrix3};
use crate::qam::Complex64;

/// Tuning for the phase tracker
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Expected magnitude of the combined pilot sum
    pub pilot_gain: f64,
    /// Process noise as a fraction of the initial covariance
    pub process_noise_scale: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            pilot_gain: 4.0,
            process_noise_scale: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PhaseTracker {
    p: Matrix3,
    x: [f64; 3],
    q: Matrix3,
    r: Matrix2,
}

impl PhaseTracker {
    /// Start tracking with `phase_uncertainty` (rad/symbol) and the
    /// per-subcarrier `noise_variance`
    pub fn new(phase_uncertainty: f64, noise_variance: f64, config: &TrackerConfig) -> Self {
        let gain = config.pilot_gain;
        // half the noise per real dimension, summed over the pilots
        let sigma_noise = gain * noise_variance * 0.5;
        let sigma_phasor = sigma_noise + gain * phase_uncertainty.sin().powi(2);
        let p = diag3([sigma_phasor, sigma_phasor, phase_uncertainty.powi(2)]);

        Self {
            p,
            x: [gain, 0.0, 0.0],
            q: scale3(&p, config.process_noise_scale),
            r: [[sigma_noise, 0.0], [0.0, sigma_noise]],
        }
    }

    /// Current drift estimate in radians per symbol
    pub fn drift(&self) -> f64 {
        self.x[2]
    }

    /// Fold in the pilot sum of one symbol and return the unit correction
    pub fn update(&mut self, pilot_sum: Complex64) -> Complex64 {
        let [re, im, theta] = self.x;
        let (s, c) = theta.sin_cos();

        // predict
        let f = [
            [c, -s, -s * re - c * im],
            [s, c, c * re - s * im],
            [0.0, 0.0, 1.0],
        ];
        self.x = [c * re - s * im, c * im + s * re, theta];
        self.p = add3(&mul3(&mul3(&f, &self.p), &transpose3(&f)), &self.q);

        // correct
        let y = [pilot_sum.re - self.x[0], pilot_sum.im - self.x[1]];
        let s_matrix = [
            [self.p[0][0] + self.r[0][0], self.p[0][1] + self.r[0][1]],
            [self.p[1][0] + self.r[1][0], self.p[1][1] + self.r[1][1]],
        ];

        // S K^T = P[0..2, :], one column of P at a time
        let gain: Option<Vec<[f64; 2]>> = (0..3)
            .map(|col| solve2(&s_matrix, [self.p[0][col], self.p[1][col]]))
            .collect();

        match gain {
            Some(k) => {
                let observed = [self.p[0], self.p[1]];
                for row in 0..3 {
                    self.x[row] += k[row][0] * y[0] + k[row][1] * y[1];
                }
                for row in 0..3 {
                    for col in 0..3 {
                        self.p[row][col] -= k[row][0] * observed[0][col] + k[row][1] * observed[1][col];
                    }
                }
            }
            None => {
                trace!("singular innovation covariance, repairing");
                self.p = abs_eigenvalues(&self.p);
            }
        }

        let phasor = Complex64::new(self.x[0], -self.x[1]);
        let norm = phasor.norm();
        if norm > 0.0 && norm.is_finite() {
            phasor / norm
        } else {
            Complex64::new(1.0, 0.0)
        }
    }
}
