//! Per-instance diagram state and hover tracking.
//!
//! One [`CycleState`] exists per mounted surface. It owns the simulation,
//! the particles, and the gesture state, and is thrown away wholesale on
//! resize or theme change.

use rand::Rng;
use rand::rngs::StdRng;

use super::geometry::Point;
use super::interaction::{HoverChange, InteractionController, Navigator};
use super::particles::{ParticleConfig, ParticleSystem};
use super::physics::{Simulation, SimulationParameters};
use super::theme::Palette;
use super::types::Topology;

/// Smoothed per-node hover overlay intensity.
///
/// Each node fades toward 1.0 while hovered and back to 0.0 otherwise, using
/// exponential smoothing so transitions ease out.
#[derive(Clone, Debug, Default)]
pub struct HoverFade {
	target: Option<usize>,
	intensity: Vec<f64>,
}

/// Smoothing rate; reaches ~95% of the target in about 200ms.
const FADE_SPEED: f64 = 15.0;

impl HoverFade {
	/// All nodes at zero intensity, none targeted.
	pub fn new(node_count: usize) -> Self {
		Self {
			target: None,
			intensity: vec![0.0; node_count],
		}
	}

	/// Node to fade in. Every other node fades out.
	pub fn set_target(&mut self, node: Option<usize>) {
		self.target = node;
	}

	/// Node currently fading in.
	pub fn target(&self) -> Option<usize> {
		self.target
	}

	/// Advance every fade by `dt` seconds.
	pub fn tick(&mut self, dt: f64) {
		let factor = 1.0 - (-FADE_SPEED * dt).exp();
		for (idx, intensity) in self.intensity.iter_mut().enumerate() {
			let goal = if self.target == Some(idx) { 1.0 } else { 0.0 };
			*intensity += (goal - *intensity) * factor;
			if goal == 0.0 && *intensity < 0.005 {
				*intensity = 0.0;
			}
		}
	}

	/// Overlay intensity of `idx` in `[0, 1]`; zero for unknown nodes.
	pub fn intensity(&self, idx: usize) -> f64 {
		self.intensity.get(idx).copied().unwrap_or(0.0)
	}
}

/// Everything one mounted diagram needs between frames.
pub struct CycleState<R = StdRng> {
	/// Node positions and forces.
	pub simulation: Simulation,
	/// Particles riding the edges.
	pub particles: ParticleSystem<R>,
	/// Palette new particles take their color from.
	pub palette: Palette,
	/// Hover overlay fades.
	pub hover: HoverFade,
	/// Gesture in progress.
	pub interaction: InteractionController,
	/// Canvas width.
	pub width: f64,
	/// Canvas height.
	pub height: f64,
	/// Frames ticked so far.
	pub frame: u64,
}

impl CycleState<StdRng> {
	/// Build a fresh scene, or `None` if the container has not been measured.
	pub fn new(
		topology: &Topology,
		palette: Palette,
		width: f64,
		height: f64,
		seed: u64,
	) -> Option<Self> {
		Self::with_parts(
			topology,
			palette,
			width,
			height,
			SimulationParameters::default(),
			ParticleSystem::with_seed(ParticleConfig::default(), seed),
		)
	}
}

impl<R: Rng> CycleState<R> {
	/// Build a scene from explicit physics settings and particle system.
	///
	/// `None` for an unmeasured container.
	pub fn with_parts(
		topology: &Topology,
		palette: Palette,
		width: f64,
		height: f64,
		params: SimulationParameters,
		particles: ParticleSystem<R>,
	) -> Option<Self> {
		if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
			return None;
		}
		let simulation = Simulation::new(topology, params);
		let hover = HoverFade::new(simulation.nodes().len());
		Some(Self {
			simulation,
			particles,
			palette,
			hover,
			interaction: InteractionController::default(),
			width,
			height,
			frame: 0,
		})
	}

	/// One frame: physics, then particles against the new positions, then
	/// hover fades.
	pub fn tick(&mut self, dt: f64) {
		if !self.simulation.tick() {
			return;
		}
		self.particles.update(
			self.simulation.nodes(),
			self.simulation.links(),
			&self.palette,
		);
		self.hover.tick(dt);
		self.frame += 1;
	}

	/// Stop the engine and drop in-flight particles. The state is dead after this.
	pub fn shutdown(&mut self) {
		self.simulation.stop();
		self.particles.clear();
		self.hover.set_target(None);
	}

	/// Press at `p`, in canvas coordinates.
	pub fn pointer_down(&mut self, p: Point) -> bool {
		self.interaction.pointer_down(&mut self.simulation, p)
	}

	/// Pointer moved to `p`. Returns the hover transition, if any.
	pub fn pointer_move(&mut self, p: Point) -> Option<HoverChange> {
		let change = self.interaction.pointer_move(&mut self.simulation, p);
		self.sync_hover(change)
	}

	/// Release at `p`. Returns `true` for a click.
	pub fn pointer_up(&mut self, p: Point, nav: &dyn Navigator) -> bool {
		self.interaction.pointer_up(&mut self.simulation, p, nav)
	}

	/// Pointer left the canvas.
	pub fn pointer_leave(&mut self) -> Option<HoverChange> {
		let change = self.interaction.pointer_leave(&mut self.simulation);
		self.sync_hover(change)
	}

	/// Put the layout back on its anchors.
	pub fn reset(&mut self) {
		self.interaction.reset(&mut self.simulation);
	}

	fn sync_hover(&mut self, change: Option<HoverChange>) -> Option<HoverChange> {
		if let Some(c) = change {
			self.hover.set_target(c.current);
		}
		change
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct NoLandmarks;

	impl Navigator for NoLandmarks {
		fn navigate(&self, _: &str) -> bool {
			false
		}
	}

	fn state() -> CycleState {
		CycleState::new(&Topology::default(), Palette::dark(), 700.0, 500.0, 9).unwrap()
	}

	#[test]
	fn unmeasured_container_builds_nothing() {
		let topology = Topology::default();
		assert!(CycleState::new(&topology, Palette::dark(), 0.0, 500.0, 1).is_none());
		assert!(CycleState::new(&topology, Palette::dark(), 700.0, 0.0, 1).is_none());
		assert!(CycleState::new(&topology, Palette::dark(), f64::NAN, 10.0, 1).is_none());
	}

	#[test]
	fn tick_runs_physics_then_particles() {
		let mut state = state();
		for _ in 0..400 {
			state.tick(0.016);
		}
		assert_eq!(state.frame, 400);
		assert!(!state.particles.is_empty());
		let nodes = state.simulation.nodes();
		for p in state.particles.particles() {
			if p.kind == crate::components::cybernetic_cycle::types::EdgeKind::Flow {
				let expected = nodes[p.source].pos.lerp(nodes[p.target].pos, p.t);
				assert!(p.position.unwrap().distance(expected) < 1e-9);
			}
		}
	}

	#[test]
	fn shutdown_freezes_everything() {
		let mut state = state();
		for _ in 0..50 {
			state.tick(0.016);
		}
		state.shutdown();
		assert!(state.particles.is_empty());
		let before: Vec<Point> = state.simulation.nodes().iter().map(|n| n.pos).collect();
		state.tick(0.016);
		let after: Vec<Point> = state.simulation.nodes().iter().map(|n| n.pos).collect();
		assert_eq!(before, after);
		assert!(state.particles.is_empty());
		assert_eq!(state.frame, 50);
	}

	#[test]
	fn hover_fades_in_and_out() {
		let mut state = state();
		state.pointer_move(Point::new(300.0, 350.0));
		assert_eq!(state.hover.target(), Some(0));
		for _ in 0..30 {
			state.tick(0.016);
		}
		assert!(state.hover.intensity(0) > 0.95);
		assert_eq!(state.hover.intensity(1), 0.0);

		state.pointer_leave();
		for _ in 0..60 {
			state.tick(0.016);
		}
		assert_eq!(state.hover.intensity(0), 0.0);
	}

	#[test]
	fn click_through_state_is_harmless_without_landmarks() {
		let mut state = state();
		assert!(state.pointer_down(Point::new(300.0, 350.0)));
		assert!(state.pointer_up(Point::new(300.0, 350.0), &NoLandmarks));
		state.reset();
		for node in state.simulation.nodes() {
			assert_eq!(node.pos, node.anchor);
		}
	}
}
