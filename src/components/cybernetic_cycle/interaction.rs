//! Pointer gesture handling: drag pinning, hover tracking, click navigation.
//!
//! The controller turns raw pointer positions into simulation calls and
//! navigation requests. It owns no positions itself; node state stays in the
//! [`Simulation`].

use log::debug;

use super::geometry::Point;
use super::physics::Simulation;

/// Page service that scrolls a section into view and highlights it.
pub trait Navigator {
	/// Returns `false` when no landmark with that id exists. Callers treat
	/// that as a no-op.
	fn navigate(&self, section_id: &str) -> bool;
}

/// Hover moved from one node (or none) to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HoverChange {
	/// Node hovered before the change.
	pub previous: Option<usize>,
	/// Node hovered now.
	pub current: Option<usize>,
}

#[derive(Clone, Copy, Debug)]
struct Press {
	node: usize,
	origin: Point,
	travelled: f64,
}

/// Tracks the gesture in progress and the hovered node.
#[derive(Clone, Debug)]
pub struct InteractionController {
	press: Option<Press>,
	hovered: Option<usize>,
	/// Farthest a press may travel and still count as a click.
	pub click_distance: f64,
}

impl Default for InteractionController {
	fn default() -> Self {
		Self {
			press: None,
			hovered: None,
			click_distance: 3.0,
		}
	}
}

impl InteractionController {
	/// Node currently under the pointer.
	pub fn hovered(&self) -> Option<usize> {
		self.hovered
	}

	/// Node currently being dragged, if any.
	pub fn dragging(&self) -> Option<usize> {
		self.press.map(|p| p.node)
	}

	/// Press at `p`. Starts a drag when it lands on a node.
	pub fn pointer_down(&mut self, sim: &mut Simulation, p: Point) -> bool {
		let Some(node) = sim.node_at(p) else {
			return false;
		};
		sim.begin_drag(node);
		self.press = Some(Press {
			node,
			origin: p,
			travelled: 0.0,
		});
		true
	}

	/// Pointer moved to `p`. Drags the pressed node, otherwise updates hover.
	pub fn pointer_move(&mut self, sim: &mut Simulation, p: Point) -> Option<HoverChange> {
		if let Some(press) = self.press.as_mut() {
			press.travelled = press.travelled.max(press.origin.distance(p));
			sim.drag_to(press.node, p);
			return None;
		}
		self.set_hover(sim.node_at(p))
	}

	/// Release at `p`. Ends the drag; a release close to where the press
	/// started is a click and navigates to the node's section.
	pub fn pointer_up(&mut self, sim: &mut Simulation, p: Point, nav: &dyn Navigator) -> bool {
		let Some(press) = self.press.take() else {
			return false;
		};
		sim.end_drag(press.node);

		let travelled = press.travelled.max(press.origin.distance(p));
		if travelled > self.click_distance {
			return false;
		}
		let Some(node) = sim.node(press.node) else {
			return false;
		};
		if !nav.navigate(&node.section) {
			debug!("cybernetic-loop: no landmark for section `{}`", node.section);
		}
		true
	}

	/// Pointer left the surface: drop any drag and clear hover.
	pub fn pointer_leave(&mut self, sim: &mut Simulation) -> Option<HoverChange> {
		if let Some(press) = self.press.take() {
			sim.end_drag(press.node);
		}
		self.set_hover(None)
	}

	/// Abandon any gesture and put the layout back on its anchors.
	pub fn reset(&mut self, sim: &mut Simulation) {
		self.press = None;
		sim.reset();
	}

	fn set_hover(&mut self, node: Option<usize>) -> Option<HoverChange> {
		if self.hovered == node {
			return None;
		}
		let change = HoverChange {
			previous: self.hovered,
			current: node,
		};
		self.hovered = node;
		Some(change)
	}
}
