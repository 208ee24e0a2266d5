//! Decorative particle field: glowing dots drifting on a torus, joined by
//! faint lines when they come close to each other.
//!
//! The engine here is plain data plus a random source so it can be driven
//! from tests; `canvas` owns the browser side (2d context, animation frame
//! loop, resize handling).
//!
//! The connection pass is O(n²) over all particle pairs. That is fine for
//! the few dozen particles the background uses; a uniform grid keyed by
//! `connect_distance` would be the next step if counts grew.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

pub mod canvas;

/// Upper bound on `ParticleOptions::count`.
pub const MAX_COUNT: usize = 2000;
/// Maximum alpha of a connecting line (at distance 0).
pub const MAX_LINE_ALPHA: f64 = 0.2;
/// Added to every particle's `life` per tick.
const LIFE_STEP: f64 = 0.5;
/// Angular rate of the opacity pulse per unit of `life`.
const PULSE_RATE: f64 = 0.02;
/// Opacity is `|sin| * PULSE_DEPTH + PULSE_FLOOR`.
const PULSE_DEPTH: f64 = 0.5;
const PULSE_FLOOR: f64 = 0.1;

/// Canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Tunables for a particle system. Every field has a default so a partial
/// JSON object is enough.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticleOptions {
    pub count: usize,
    pub speed: f64,
    pub min_size: f64,
    pub max_size: f64,
    pub color: String,
    pub connect_distance: f64,
}

impl Default for ParticleOptions {
    fn default() -> Self {
        Self {
            count: 50,
            speed: 0.3,
            min_size: 1.0,
            max_size: 3.0,
            color: "#9cd3ff".to_string(),
            connect_distance: 100.0,
        }
    }
}

impl ParticleOptions {
    /// Settings for the full-window background behind every route.
    pub fn background(color: &str) -> Self {
        Self {
            count: 30,
            speed: 0.2,
            min_size: 1.0,
            max_size: 2.0,
            color: color.to_string(),
            connect_distance: 80.0,
        }
    }
}

/// One dot of the field.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub opacity: f64,
    /// Phase accumulator driving the opacity pulse.
    pub life: f64,
}

impl Particle {
    fn spawn(rng: &mut StdRng, bounds: Size, options: &ParticleOptions) -> Self {
        let (lo, hi) = if options.min_size <= options.max_size {
            (options.min_size, options.max_size)
        } else {
            (options.max_size, options.min_size)
        };
        Self {
            x: rng.r#gen::<f64>() * bounds.width.max(0.0),
            y: rng.r#gen::<f64>() * bounds.height.max(0.0),
            vx: (rng.r#gen::<f64>() - 0.5) * options.speed,
            vy: (rng.r#gen::<f64>() - 0.5) * options.speed,
            radius: lo + rng.r#gen::<f64>() * (hi - lo),
            opacity: rng.r#gen::<f64>() * 0.5 + 0.1,
            life: rng.r#gen::<f64>() * 100.0,
        }
    }

    fn advance(&mut self, bounds: Size) {
        self.x = wrap(self.x + self.vx, bounds.width);
        self.y = wrap(self.y + self.vy, bounds.height);
        self.life += LIFE_STEP;
        self.opacity = pulse_opacity(self.life);
    }
}

/// Toroidal wrap into `[0, extent)`. A non-positive extent leaves the
/// coordinate alone since there is nothing to wrap into.
pub fn wrap(value: f64, extent: f64) -> f64 {
    if !(extent > 0.0) {
        return value;
    }
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs.
    if wrapped >= extent { 0.0 } else { wrapped }
}

/// Opacity of a particle at a given point of its life.
pub fn pulse_opacity(life: f64) -> f64 {
    (life * PULSE_RATE).sin().abs() * PULSE_DEPTH + PULSE_FLOOR
}

/// Alpha of the line joining two particles `distance` apart. Falls linearly
/// from `MAX_LINE_ALPHA` at 0 to exactly 0 at `connect_distance` and stays 0
/// beyond it. Always 0 when connections are disabled.
pub fn line_alpha(distance: f64, connect_distance: f64) -> f64 {
    if !(connect_distance > 0.0) || distance >= connect_distance {
        return 0.0;
    }
    (1.0 - distance / connect_distance) * MAX_LINE_ALPHA
}

/// Line between two particles, by index into `ParticleSystem::particles`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub alpha: f64,
}

/// Something the field can be drawn onto. The browser implementation wraps
/// a `CanvasRenderingContext2d`; tests record the calls.
pub trait Surface {
    fn clear(&mut self, size: Size);
    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: &str, alpha: f64);
    fn dot(&mut self, center: (f64, f64), radius: f64, color: &str, alpha: f64);
}

/// The particle collection plus its settings and bounds.
pub struct ParticleSystem {
    particles: VecDeque<Particle>,
    options: ParticleOptions,
    bounds: Size,
    rng: StdRng,
}

impl ParticleSystem {
    /// Creates a populated system seeded from the platform entropy source.
    pub fn new(bounds: Size, options: ParticleOptions) -> Self {
        Self::with_rng(bounds, options, StdRng::from_entropy())
    }

    /// Deterministic variant for tests and reproducible layouts.
    pub fn with_seed(bounds: Size, options: ParticleOptions, seed: u64) -> Self {
        Self::with_rng(bounds, options, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bounds: Size, options: ParticleOptions, rng: StdRng) -> Self {
        let mut system = Self {
            particles: VecDeque::with_capacity(options.count.min(MAX_COUNT) * 2),
            options,
            bounds,
            rng,
        };
        system.initialize(bounds, None);
        system
    }

    /// (Re)populates the field with exactly `count` fresh particles. New
    /// options, when given, replace the current ones.
    pub fn initialize(&mut self, bounds: Size, options: Option<ParticleOptions>) {
        if let Some(options) = options {
            self.options = options;
        }
        self.options.count = self.options.count.min(MAX_COUNT);
        self.bounds = bounds;
        self.particles.clear();
        for _ in 0..self.options.count {
            let p = Particle::spawn(&mut self.rng, self.bounds, &self.options);
            self.particles.push_back(p);
        }
    }

    /// Advances every particle by one frame.
    pub fn tick(&mut self) {
        let bounds = self.bounds;
        for p in self.particles.iter_mut() {
            p.advance(bounds);
        }
    }

    /// Pairs of particles close enough to be joined, with their line alpha.
    pub fn links(&self) -> Vec<Link> {
        let connect = self.options.connect_distance;
        let mut out = Vec::new();
        if !(connect > 0.0) {
            return out;
        }
        for (i, p1) in self.particles.iter().enumerate() {
            for (j, p2) in self.particles.iter().enumerate().skip(i + 1) {
                let dx = p1.x - p2.x;
                let dy = p1.y - p2.y;
                let distance = (dx * dx + dy * dy).sqrt();
                let alpha = line_alpha(distance, connect);
                if alpha > 0.0 {
                    out.push(Link { a: i, b: j, alpha });
                }
            }
        }
        out
    }

    /// Clears the surface, draws connections, then the dots on top.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.clear(self.bounds);
        let color = self.options.color.as_str();
        for link in self.links() {
            let a = &self.particles[link.a];
            let b = &self.particles[link.b];
            surface.line((a.x, a.y), (b.x, b.y), color, link.alpha);
        }
        for p in self.particles.iter() {
            surface.dot((p.x, p.y), p.radius, color, p.opacity);
        }
    }

    /// Updates the wrap bounds. Existing particles stay where they are.
    pub fn resize(&mut self, bounds: Size) {
        self.bounds = bounds;
    }

    /// Recolors every dot and line.
    pub fn set_color(&mut self, color: &str) {
        self.options.color = color.to_string();
    }

    /// Drops one particle at `(x, y)`. The oldest particle is evicted once the
    /// field holds more than twice the target count.
    pub fn add_burst(&mut self, x: f64, y: f64) {
        let mut p = Particle::spawn(&mut self.rng, self.bounds, &self.options);
        p.x = wrap(x, self.bounds.width);
        p.y = wrap(y, self.bounds.height);
        self.particles.push_back(p);
        while self.particles.len() > self.cap() {
            self.particles.pop_front();
        }
    }

    /// Releases every particle.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    fn cap(&self) -> usize {
        self.options.count.saturating_mul(2)
    }

    pub fn particles(&self) -> impl ExactSizeIterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn options(&self) -> &ParticleOptions {
        &self.options
    }

    pub fn color(&self) -> &str {
        &self.options.color
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }
}
