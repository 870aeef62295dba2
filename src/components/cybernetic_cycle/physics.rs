//! Force simulation driving node positions.
//!
//! Forces accumulate into velocities each tick, then positions integrate with
//! velocity decay. The force model matches d3-force: spring links, many-body charge, a
//! positional pull toward each node's anchor, and a radius-based collision
//! constraint. The energy (alpha) scalar scales every force but collision and
//! decays toward a non-zero floor, so the layout keeps breathing instead of
//! freezing once settled.
//!
//! Nodes live in a flat arena indexed by `usize`; the simulation is the only
//! writer of positions and velocities. Everything else reads through
//! [`Simulation::nodes`].

use log::warn;

use super::geometry::Point;
use super::types::{EdgeKind, Group, Topology};

/// Tunable force weights and energy schedule.
#[derive(Clone, Debug)]
pub struct SimulationParameters {
	/// Target separation of flow edge endpoints.
	pub flow_distance: f64,
	/// Target separation of feedback edge endpoints.
	pub feedback_distance: f64,
	/// Many-body strength. Negative values repel.
	pub charge_strength: f64,
	/// Squared distance below which charge stops growing.
	pub charge_distance_min2: f64,
	/// Pull toward the anchor coordinate, per unit of displacement.
	pub anchor_strength: f64,
	/// Extra clearance added to the summed radii of a colliding pair.
	pub collision_padding: f64,
	/// Fraction of an overlap resolved per tick.
	pub collision_strength: f64,
	/// Fraction of velocity lost each tick.
	pub velocity_decay: f64,
	/// Energy the simulation settles to when nothing is being dragged.
	pub energy_floor: f64,
	/// Energy target while a node is being dragged.
	pub drag_energy: f64,
	/// The engine stops itself if energy drops below this.
	pub energy_min: f64,
	/// Rate at which energy approaches its target each tick.
	pub energy_decay: f64,
}

impl Default for SimulationParameters {
	fn default() -> Self {
		let energy_min = 0.001_f64;
		Self {
			flow_distance: 120.0,
			feedback_distance: 200.0,
			charge_strength: -400.0,
			charge_distance_min2: 1.0,
			anchor_strength: 0.5,
			collision_padding: 30.0,
			collision_strength: 1.0,
			velocity_decay: 0.4,
			energy_floor: 0.02,
			drag_energy: 0.3,
			energy_min,
			energy_decay: 1.0 - energy_min.powf(1.0 / 300.0),
		}
	}
}

/// A node in the simulation arena.
#[derive(Clone, Debug)]
pub struct Node {
	/// Id from the topology.
	pub id: String,
	/// Group, for coloring.
	pub group: Group,
	/// Display label.
	pub label: String,
	/// Landmark id navigated to on click.
	pub section: String,
	/// Display and hit-test radius.
	pub radius: f64,
	/// Fixed rest position. Never changes for the lifetime of the node.
	pub anchor: Point,
	/// Current position.
	pub pos: Point,
	/// Current velocity, in canvas units per tick.
	pub vel: Point,
	/// Position override while dragged.
	pub pin: Option<Point>,
}

/// A resolved edge with its precomputed spring constants.
#[derive(Clone, Debug)]
pub struct Link {
	/// Arena index of the source node.
	pub source: usize,
	/// Arena index of the target node.
	pub target: usize,
	/// Selects rest length and drawing style.
	pub kind: EdgeKind,
	distance: f64,
	strength: f64,
	bias: f64,
}

/// The physics engine for one mounted diagram.
pub struct Simulation {
	params: SimulationParameters,
	nodes: Vec<Node>,
	links: Vec<Link>,
	energy: f64,
	energy_target: f64,
	running: bool,
}

/// Tiny deterministic nudge to separate coincident points.
fn jiggle(seed: usize) -> f64 {
	(((seed as f64) * 0.618_034).fract() - 0.5) * 1e-6
}

impl Simulation {
	/// Build a simulation over a private copy of `topology`.
	///
	/// Nodes start at rest on their anchors with full energy. Invalid nodes
	/// and edges are logged and left out.
	pub fn new(topology: &Topology, params: SimulationParameters) -> Self {
		let resolved = topology.resolve();
		for err in &resolved.errors {
			warn!("cybernetic-loop: skipping topology entry: {}", err);
		}

		let nodes: Vec<Node> = resolved
			.nodes
			.iter()
			.map(|spec| {
				let anchor = Point::new(spec.anchor_x, spec.anchor_y);
				Node {
					id: spec.id.clone(),
					group: spec.group,
					label: spec.label.clone(),
					section: spec.section_id(),
					radius: spec.radius,
					anchor,
					pos: anchor,
					vel: Point::ZERO,
					pin: None,
				}
			})
			.collect();

		let mut degree = vec![0usize; nodes.len()];
		for edge in &resolved.edges {
			degree[edge.source] += 1;
			degree[edge.target] += 1;
		}

		let links = resolved
			.edges
			.iter()
			.map(|edge| {
				let (ds, dt) = (degree[edge.source] as f64, degree[edge.target] as f64);
				Link {
					source: edge.source,
					target: edge.target,
					kind: edge.kind,
					distance: match edge.kind {
						EdgeKind::Flow => params.flow_distance,
						EdgeKind::Feedback => params.feedback_distance,
					},
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();

		let energy_target = params.energy_floor;
		Self {
			params,
			nodes,
			links,
			energy: 1.0,
			energy_target,
			running: true,
		}
	}

	/// Every node, in topology order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Node at `idx`, if any.
	pub fn node(&self, idx: usize) -> Option<&Node> {
		self.nodes.get(idx)
	}

	/// Every resolved edge.
	pub fn links(&self) -> &[Link] {
		&self.links
	}

	/// Parameters in effect.
	pub fn params(&self) -> &SimulationParameters {
		&self.params
	}

	/// Current energy (alpha).
	pub fn energy(&self) -> f64 {
		self.energy
	}

	/// Value the energy is decaying toward.
	pub fn energy_target(&self) -> f64 {
		self.energy_target
	}

	/// Whether [`Simulation::tick`] still advances the layout.
	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Halt the engine. [`Simulation::tick`] becomes a no-op.
	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Resume ticking from the current energy.
	pub fn restart(&mut self) {
		self.running = true;
	}

	/// Change the resting energy. Takes effect immediately unless a drag is
	/// holding the target up.
	pub fn set_energy_floor(&mut self, floor: f64) {
		let dragging = self.nodes.iter().any(|n| n.pin.is_some());
		self.params.energy_floor = floor.max(0.0);
		if !dragging {
			self.energy_target = self.params.energy_floor;
		}
	}

	/// Topmost node whose disc contains `p`.
	pub fn node_at(&self, p: Point) -> Option<usize> {
		self.nodes
			.iter()
			.enumerate()
			.rev()
			.find(|(_, node)| node.pos.distance(p) <= node.radius)
			.map(|(idx, _)| idx)
	}

	/// Advance one step. Returns `false` without touching anything when stopped.
	pub fn tick(&mut self) -> bool {
		if !self.running {
			return false;
		}

		self.energy += (self.energy_target - self.energy) * self.params.energy_decay;
		let alpha = self.energy;

		self.apply_links(alpha);
		self.apply_charge(alpha);
		self.apply_anchor(alpha);
		self.apply_collision();

		let retain = 1.0 - self.params.velocity_decay;
		for node in &mut self.nodes {
			match node.pin {
				Some(pin) => {
					node.pos = pin;
					node.vel = Point::ZERO;
				}
				None => {
					node.vel = node.vel * retain;
					node.pos = node.pos + node.vel;
				}
			}
		}

		if self.energy < self.params.energy_min {
			self.running = false;
		}
		true
	}

	fn apply_links(&mut self, alpha: f64) {
		for (i, link) in self.links.iter().enumerate() {
			let (src, tgt) = (&self.nodes[link.source], &self.nodes[link.target]);
			let mut d = (tgt.pos + tgt.vel) - (src.pos + src.vel);
			if d.x == 0.0 {
				d.x = jiggle(i);
			}
			if d.y == 0.0 {
				d.y = jiggle(i + 1);
			}
			let len = d.length();
			let d = d * ((len - link.distance) / len * alpha * link.strength);

			self.nodes[link.target].vel = self.nodes[link.target].vel - d * link.bias;
			self.nodes[link.source].vel = self.nodes[link.source].vel + d * (1.0 - link.bias);
		}
	}

	fn apply_charge(&mut self, alpha: f64) {
		let strength = self.params.charge_strength;
		let min2 = self.params.charge_distance_min2;
		let n = self.nodes.len();

		for i in 0..n {
			let mut push = Point::ZERO;
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut d = self.nodes[j].pos - self.nodes[i].pos;
				let mut l = d.x * d.x + d.y * d.y;
				if d.x == 0.0 {
					d.x = jiggle(i * n + j);
					l += d.x * d.x;
				}
				if d.y == 0.0 {
					d.y = jiggle(j * n + i);
					l += d.y * d.y;
				}
				if l < min2 {
					l = (min2 * l).sqrt();
				}
				push = push + d * (strength * alpha / l);
			}
			self.nodes[i].vel = self.nodes[i].vel + push;
		}
	}

	fn apply_anchor(&mut self, alpha: f64) {
		let k = self.params.anchor_strength * alpha;
		for node in &mut self.nodes {
			node.vel = node.vel + (node.anchor - node.pos) * k;
		}
	}

	/// Pushes overlapping pairs apart so that, once resolved, their centers are
	/// at least `r_i + r_j + padding` apart. Not scaled by energy.
	fn apply_collision(&mut self) {
		let pad = self.params.collision_padding;
		let strength = self.params.collision_strength;
		let n = self.nodes.len();

		for i in 0..n {
			let predicted = self.nodes[i].pos + self.nodes[i].vel;
			let ri = self.nodes[i].radius + pad / 2.0;
			for j in (i + 1)..n {
				let rj = self.nodes[j].radius + pad / 2.0;
				let r = ri + rj;
				let mut d = predicted - (self.nodes[j].pos + self.nodes[j].vel);
				let mut l = d.x * d.x + d.y * d.y;
				if l >= r * r {
					continue;
				}
				if d.x == 0.0 {
					d.x = jiggle(i * n + j);
					l += d.x * d.x;
				}
				if d.y == 0.0 {
					d.y = jiggle(j * n + i);
					l += d.y * d.y;
				}
				let len = l.sqrt();
				let d = d * ((r - len) / len * strength);
				let share = (rj * rj) / (ri * ri + rj * rj);

				self.nodes[i].vel = self.nodes[i].vel + d * share;
				self.nodes[j].vel = self.nodes[j].vel - d * (1.0 - share);
			}
		}
	}

	/// Pin `idx` where it currently is and raise the energy target so the
	/// rest of the graph visibly reacts.
	pub fn begin_drag(&mut self, idx: usize) {
		let Some(node) = self.nodes.get_mut(idx) else {
			return;
		};
		node.pin = Some(node.pos);
		self.energy_target = self.params.drag_energy;
		self.restart();
	}

	/// Move the pin of `idx` to `p`. No-op unless the node is being dragged.
	pub fn drag_to(&mut self, idx: usize, p: Point) {
		if let Some(node) = self.nodes.get_mut(idx) {
			if node.pin.is_some() {
				node.pin = Some(p);
			}
		}
	}

	/// Release the pin of `idx` and let the energy fall back to its floor.
	pub fn end_drag(&mut self, idx: usize) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.pin = None;
		}
		if self.nodes.iter().all(|n| n.pin.is_none()) {
			self.energy_target = self.params.energy_floor;
		}
	}

	/// Put every node back on its anchor at rest and re-settle from full energy.
	pub fn reset(&mut self) {
		self.stop();
		for node in &mut self.nodes {
			node.pos = node.anchor;
			node.vel = Point::ZERO;
			node.pin = None;
		}
		self.energy_target = self.params.energy_floor;
		self.energy = 1.0;
		self.restart();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::cybernetic_cycle::types::{EdgeSpec, NodeSpec};

	fn pair(edges: Vec<EdgeSpec>, b_anchor_x: f64) -> Topology {
		Topology {
			nodes: vec![
				NodeSpec::new("a", Group::Input, "A", 10.0, 0.0, 0.0),
				NodeSpec::new("b", Group::Output, "B", 10.0, b_anchor_x, 0.0),
			],
			edges,
		}
	}

	fn separation(sim: &Simulation) -> f64 {
		sim.nodes()[0].pos.distance(sim.nodes()[1].pos)
	}

	#[test]
	fn starts_on_anchors_with_full_energy() {
		let sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		assert_eq!(sim.nodes().len(), 7);
		assert_eq!(sim.links().len(), 9);
		assert_eq!(sim.energy(), 1.0);
		assert!(sim.is_running());
		for node in sim.nodes() {
			assert_eq!(node.pos, node.anchor);
			assert_eq!(node.vel, Point::ZERO);
		}
	}

	#[test]
	fn link_constants_follow_degree() {
		let sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		// input -> process: input has 4 links, process has 3
		let link = &sim.links()[0];
		assert_eq!(link.distance, 120.0);
		assert!((link.strength - 1.0 / 3.0).abs() < 1e-12);
		assert!((link.bias - 4.0 / 7.0).abs() < 1e-12);
		assert!(sim.links()[6].distance == 200.0);
	}

	#[test]
	fn energy_decays_to_floor_and_never_stops() {
		let mut sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		for _ in 0..3000 {
			assert!(sim.tick());
		}
		assert!(sim.is_running());
		assert!((sim.energy() - 0.02).abs() < 1e-6);
	}

	#[test]
	fn zero_floor_lets_the_engine_stop() {
		let mut sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		sim.set_energy_floor(0.0);
		let mut ticks = 0;
		while sim.tick() {
			ticks += 1;
			assert!(ticks < 10_000, "simulation never stopped");
		}
		assert!(!sim.is_running());
		assert!(sim.energy() < 0.001);
	}

	#[test]
	fn linked_pair_settles_between_anchor_and_link_distance() {
		let topology = pair(vec![EdgeSpec::new("a", "b", EdgeKind::Flow)], 100.0);
		let mut sim = Simulation::new(&topology, SimulationParameters::default());
		for _ in 0..2000 {
			sim.tick();
		}
		let settled = separation(&sim);
		assert!(settled > 100.0 && settled < 120.0, "settled at {settled}");

		let mut samples = Vec::new();
		for _ in 0..200 {
			sim.tick();
			samples.push(separation(&sim));
		}
		let mean = samples.iter().sum::<f64>() / samples.len() as f64;
		let variance =
			samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64;
		assert!(variance < 1e-6, "variance {variance}");
	}

	#[test]
	fn collision_holds_overlapping_anchors_apart() {
		let topology = pair(vec![], 20.0);
		let params = SimulationParameters {
			charge_strength: 0.0,
			..SimulationParameters::default()
		};
		let mut sim = Simulation::new(&topology, params);
		for _ in 0..1500 {
			sim.tick();
		}
		let min = 10.0 + 10.0 + 30.0;
		assert!(separation(&sim) >= min - 0.5, "separation {}", separation(&sim));
	}

	#[test]
	fn default_layout_respects_clearance() {
		let mut sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		for _ in 0..1500 {
			sim.tick();
		}
		let nodes = sim.nodes();
		for i in 0..nodes.len() {
			for j in (i + 1)..nodes.len() {
				let min = nodes[i].radius + nodes[j].radius + 30.0;
				let d = nodes[i].pos.distance(nodes[j].pos);
				assert!(d >= min - 1.0, "{} / {}: {d} < {min}", nodes[i].id, nodes[j].id);
			}
		}
	}

	#[test]
	fn dragged_node_tracks_pointer_then_is_released() {
		let mut sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		for _ in 0..100 {
			sim.tick();
		}
		let anchors: Vec<Point> = sim.nodes().iter().map(|n| n.anchor).collect();

		sim.begin_drag(2);
		assert_eq!(sim.energy_target(), 0.3);
		for step in 0..30 {
			let pointer = Point::new(520.0 + step as f64 * 3.0, 300.0 - step as f64);
			sim.drag_to(2, pointer);
			sim.tick();
			assert_eq!(sim.nodes()[2].pos, pointer);
		}
		let last = sim.nodes()[2].pos;

		sim.end_drag(2);
		assert_eq!(sim.energy_target(), 0.02);
		sim.tick();
		assert_ne!(sim.nodes()[2].pos, last);
		assert!(sim.nodes()[2].pin.is_none());

		let after: Vec<Point> = sim.nodes().iter().map(|n| n.anchor).collect();
		assert_eq!(anchors, after);
	}

	#[test]
	fn drag_to_without_begin_is_ignored() {
		let mut sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		sim.drag_to(0, Point::new(1.0, 1.0));
		assert!(sim.nodes()[0].pin.is_none());
		sim.begin_drag(99);
		assert_eq!(sim.energy_target(), 0.02);
	}

	#[test]
	fn reset_restores_anchors_immediately() {
		let mut sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		sim.begin_drag(0);
		sim.drag_to(0, Point::new(10.0, 10.0));
		for _ in 0..200 {
			sim.tick();
		}

		sim.reset();
		assert!(sim.is_running());
		assert_eq!(sim.energy(), 1.0);
		assert_eq!(sim.energy_target(), 0.02);
		for node in sim.nodes() {
			assert_eq!(node.pos, node.anchor);
			assert_eq!(node.vel, Point::ZERO);
			assert!(node.pin.is_none());
		}
	}

	#[test]
	fn stopped_engine_does_not_move() {
		let mut sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		sim.tick();
		sim.stop();
		let before: Vec<Point> = sim.nodes().iter().map(|n| n.pos).collect();
		assert!(!sim.tick());
		let after: Vec<Point> = sim.nodes().iter().map(|n| n.pos).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn hit_test_uses_current_positions() {
		let sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		assert_eq!(sim.node_at(Point::new(305.0, 352.0)), Some(0));
		assert_eq!(sim.node_at(Point::new(0.0, 0.0)), None);
	}

	#[test]
	fn unknown_edges_do_not_break_the_simulation() {
		let mut topology = Topology::default();
		topology
			.edges
			.push(EdgeSpec::new("control", "nowhere", EdgeKind::Feedback));
		let mut sim = Simulation::new(&topology, SimulationParameters::default());
		assert_eq!(sim.links().len(), 9);
		for _ in 0..50 {
			sim.tick();
		}
		assert!(sim.nodes().iter().all(|n| n.pos.x.is_finite() && n.pos.y.is_finite()));
	}
}
