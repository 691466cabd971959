//! The manufactured solution `u = sin(πx / L) sin(πy / L)` on `[0, L]^2`.
//!
//! `u` vanishes on the boundary and satisfies `-Δu = f` with
//! `f = 2 (π / L)² sin(πx / L) sin(πy / L)`. For the unit square this is the classic pair
//! `u = sin(πx) sin(πy)`, `f = 2π² sin(πx) sin(πy)`.
use crate::assembly::local::SourceFunction;
use crate::estimate::ExactSolution;
use crate::mesh::SquareDomain;
use nalgebra::{Point2, Vector2};
use std::f64::consts::PI;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SinusoidalSource {
    frequency: f64,
}

impl SinusoidalSource {
    pub fn on(domain: &SquareDomain) -> Self {
        Self {
            frequency: PI / domain.size(),
        }
    }
}

impl Default for SinusoidalSource {
    fn default() -> Self {
        Self::on(&SquareDomain::unit())
    }
}

impl SourceFunction for SinusoidalSource {
    fn evaluate(&self, x: &Point2<f64>) -> f64 {
        let k = self.frequency;
        2.0 * k * k * (k * x.x).sin() * (k * x.y).sin()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SinusoidalSolution {
    frequency: f64,
}

impl SinusoidalSolution {
    pub fn on(domain: &SquareDomain) -> Self {
        Self {
            frequency: PI / domain.size(),
        }
    }
}

impl Default for SinusoidalSolution {
    fn default() -> Self {
        Self::on(&SquareDomain::unit())
    }
}

impl ExactSolution for SinusoidalSolution {
    fn value(&self, x: &Point2<f64>) -> f64 {
        let k = self.frequency;
        (k * x.x).sin() * (k * x.y).sin()
    }

    fn gradient(&self, x: &Point2<f64>) -> Vector2<f64> {
        let k = self.frequency;
        let (sx, cx) = (k * x.x).sin_cos();
        let (sy, cy) = (k * x.y).sin_cos();
        Vector2::new(k * cx * sy, k * sx * cy)
    }
}
