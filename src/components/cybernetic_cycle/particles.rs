//! Flow particles riding the edges of the diagram.
//!
//! Each tick every edge may emit a particle at its source. Particles advance
//! along the same [`EdgePath`] the renderer draws, recomputed from the current
//! node positions, and are dropped the moment their progress reaches 1.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::geometry::{EdgePath, Point};
use super::physics::{Link, Node};
use super::theme::{Color, Palette};
use super::types::EdgeKind;

/// Spawn rate, speeds, and placement of flow particles.
#[derive(Clone, Debug)]
pub struct ParticleConfig {
	/// Chance per edge per tick of emitting a particle.
	pub spawn_probability: f64,
	/// Progress per tick along feedback edges.
	pub feedback_speed: f64,
	/// Progress per tick along flow edges is drawn from `flow_speed_min..flow_speed_max`.
	pub flow_speed_min: f64,
	/// When not above `flow_speed_min`, every flow particle moves at the minimum.
	pub flow_speed_max: f64,
	/// Sideways distance between a feedback particle and its curve.
	pub feedback_offset: f64,
	/// Draw radius.
	pub radius: f64,
}

impl Default for ParticleConfig {
	fn default() -> Self {
		Self {
			spawn_probability: 0.03,
			feedback_speed: 0.005,
			flow_speed_min: 0.01,
			flow_speed_max: 0.015,
			feedback_offset: 10.0,
			radius: 3.0,
		}
	}
}

/// A single particle in flight.
#[derive(Clone, Debug)]
pub struct Particle {
	/// Unique within one system, assigned in spawn order.
	pub id: u64,
	/// Arena index of the edge's source node.
	pub source: usize,
	/// Arena index of the edge's target node.
	pub target: usize,
	/// Kind of the edge being travelled.
	pub kind: EdgeKind,
	/// Progress along the edge, always in `[0, 1)` while alive.
	pub t: f64,
	/// Progress per tick.
	pub speed: f64,
	/// Source group color at spawn time.
	pub color: Color,
	/// `color` as a CSS string, resolved once at spawn.
	pub css: String,
	/// Where to draw this frame. `None` when the edge has no direction.
	pub position: Option<Point>,
}

/// Owns every live particle and the random source that spawns them.
pub struct ParticleSystem<R = StdRng> {
	/// Spawn and motion settings. Changes apply from the next update.
	pub config: ParticleConfig,
	particles: Vec<Particle>,
	next_id: u64,
	rng: R,
}

impl ParticleSystem<StdRng> {
	/// System driven by a [`StdRng`] seeded with `seed`.
	pub fn with_seed(config: ParticleConfig, seed: u64) -> Self {
		Self::new(config, StdRng::seed_from_u64(seed))
	}
}

impl<R> ParticleSystem<R> {
	/// Live particles in spawn order.
	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	/// Number of live particles.
	pub fn len(&self) -> usize {
		self.particles.len()
	}

	/// Whether nothing is in flight.
	pub fn is_empty(&self) -> bool {
		self.particles.is_empty()
	}

	/// Drop every live particle.
	pub fn clear(&mut self) {
		self.particles.clear();
	}
}

impl<R: Rng> ParticleSystem<R> {
	/// System driven by the given random source.
	pub fn new(config: ParticleConfig, rng: R) -> Self {
		Self {
			config,
			particles: Vec::new(),
			next_id: 0,
			rng,
		}
	}

	/// One tick: spawn, advance, reap, then place survivors on their edges.
	pub fn update(&mut self, nodes: &[Node], links: &[Link], palette: &Palette) {
		for link in links {
			if self.rng.random::<f64>() < self.config.spawn_probability {
				self.spawn(link, nodes, palette);
			}
		}

		let offset = self.config.feedback_offset;
		self.particles.retain_mut(|p| {
			p.t += p.speed;
			if p.t >= 1.0 {
				return false;
			}
			p.position = match (nodes.get(p.source), nodes.get(p.target)) {
				(Some(src), Some(tgt)) => {
					EdgePath::new(p.kind, src.pos, tgt.pos).particle_position(p.t, offset)
				}
				_ => None,
			};
			true
		});
	}

	fn spawn(&mut self, link: &Link, nodes: &[Node], palette: &Palette) {
		let Some(source) = nodes.get(link.source) else {
			return;
		};
		let speed = match link.kind {
			EdgeKind::Feedback => self.config.feedback_speed,
			EdgeKind::Flow => {
				let (min, max) = (self.config.flow_speed_min, self.config.flow_speed_max);
				if max > min {
					self.rng.random_range(min..max)
				} else {
					min
				}
			}
		};
		let color = palette.group_color(source.group);

		self.particles.push(Particle {
			id: self.next_id,
			source: link.source,
			target: link.target,
			kind: link.kind,
			t: 0.0,
			speed,
			color,
			css: color.to_css(),
			position: None,
		});
		self.next_id += 1;
	}
}
