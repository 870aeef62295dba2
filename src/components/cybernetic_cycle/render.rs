//! Canvas rendering for the diagram.
//!
//! All theme-dependent styling is baked into a [`Surface`] when it is built.
//! A theme or size change builds a new surface; nothing is recolored in place.
//! Drawing uses multiple passes for correct z-ordering:
//! 1. Edges, then their arrowheads
//! 2. Particles
//! 3. Nodes with glow, hover overlays, then labels

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::geometry::{EdgePath, Point};
use super::physics::Node;
use super::state::CycleState;
use super::theme::Palette;
use super::types::{EdgeKind, Group};

/// Gap between an arrow tip and the target node's outline.
const ARROW_GAP: f64 = 4.0;

/// Stroke width and dash pattern for one kind of edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStroke {
	/// Line width in pixels.
	pub width: f64,
	/// `(dash, gap)`; `None` draws a solid line.
	pub dash: Option<(f64, f64)>,
}

/// Drawing styles resolved against one palette and one canvas size.
#[derive(Clone, Debug)]
pub struct Surface {
	/// Canvas width in pixels.
	pub width: f64,
	/// Canvas height in pixels.
	pub height: f64,
	group_css: [String; 7],
	node_fill: String,
	hover_stroke: String,
	text: String,
	text_glow: Option<String>,
	overlay_fill: String,
	arrow_fill: String,
	/// Alpha applied to edge strokes.
	pub edge_opacity: f64,
	/// Node outline width.
	pub node_stroke_width: f64,
	/// Blur radius of the soft glow behind nodes and particles.
	pub glow_blur: f64,
	/// CSS font for labels.
	pub label_font: String,
	/// Distance from node center to label baseline, beyond the radius.
	pub label_offset: f64,
	/// Arrowhead length along the edge.
	pub arrow_length: f64,
	/// Half the arrowhead base width.
	pub arrow_half_width: f64,
	/// Scale of the "go" marker drawn on hovered nodes.
	pub overlay_arrow_scale: f64,
}

impl Surface {
	/// Resolve `palette` into drawing styles for a `width` by `height` canvas.
	pub fn new(palette: &Palette, width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			group_css: Group::ALL.map(|g| palette.group_color(g).to_css()),
			node_fill: palette.node_fill.to_css(),
			hover_stroke: palette.node_stroke.to_css(),
			text: palette.text.to_css(),
			text_glow: palette.glow.map(|c| c.to_css()),
			overlay_fill: palette.overlay_fill.to_css(),
			arrow_fill: palette.arrow_fill.to_css(),
			edge_opacity: 0.4,
			node_stroke_width: 2.0,
			glow_blur: 5.0,
			label_font: "12px monospace".to_string(),
			label_offset: 15.0,
			arrow_length: 8.0,
			arrow_half_width: 4.0,
			overlay_arrow_scale: 1.5,
		}
	}

	/// CSS color of `group`.
	pub fn group_css(&self, group: Group) -> &str {
		&self.group_css[group.index()]
	}

	/// Stroke style for edges of `kind`.
	pub fn edge_stroke(kind: EdgeKind) -> EdgeStroke {
		match kind {
			EdgeKind::Flow => EdgeStroke {
				width: 2.0,
				dash: None,
			},
			EdgeKind::Feedback => EdgeStroke {
				width: 1.5,
				dash: Some((5.0, 5.0)),
			},
		}
	}

	/// Triangle `[tip, left, right]` for the arrowhead at the end of `path`,
	/// stopping short of a target node of `target_radius`.
	pub fn arrowhead(&self, path: &EdgePath, target_radius: f64) -> Option<[Point; 3]> {
		let dir = path.end_direction()?;
		let tip = path.to() - dir * (target_radius + ARROW_GAP);
		let back = tip - dir * self.arrow_length;
		let side = dir.perp() * self.arrow_half_width;
		Some([tip, back + side, back - side])
	}
}

/// Renders the complete diagram to the canvas.
pub fn render<R>(state: &CycleState<R>, ctx: &CanvasRenderingContext2d, surface: &Surface) {
	ctx.clear_rect(0.0, 0.0, surface.width, surface.height);

	draw_edges(state, ctx, surface);
	draw_particles(state, ctx, surface);
	draw_nodes(state, ctx, surface);
}

fn draw_edges<R>(state: &CycleState<R>, ctx: &CanvasRenderingContext2d, surface: &Surface) {
	let nodes = state.simulation.nodes();

	for link in state.simulation.links() {
		let (src, tgt) = (&nodes[link.source], &nodes[link.target]);
		if src.pos.distance(tgt.pos) < 0.001 {
			continue;
		}
		let path = EdgePath::new(link.kind, src.pos, tgt.pos);
		let stroke = Surface::edge_stroke(link.kind);
		let color = surface.group_css(src.group);

		ctx.set_global_alpha(surface.edge_opacity);
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(stroke.width);
		match stroke.dash {
			Some((dash, gap)) => {
				let _ = ctx.set_line_dash(&js_sys::Array::of2(
					&JsValue::from_f64(dash),
					&JsValue::from_f64(gap),
				));
			}
			None => {
				let _ = ctx.set_line_dash(&js_sys::Array::new());
			}
		}
		trace_path(ctx, &path);
		ctx.stroke();
		ctx.set_global_alpha(1.0);

		if let Some([tip, left, right]) = surface.arrowhead(&path, tgt.radius) {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
			ctx.set_fill_style_str(color);
			ctx.begin_path();
			ctx.move_to(tip.x, tip.y);
			ctx.line_to(left.x, left.y);
			ctx.line_to(right.x, right.y);
			ctx.close_path();
			ctx.fill();
		}
	}

	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn trace_path(ctx: &CanvasRenderingContext2d, path: &EdgePath) {
	ctx.begin_path();
	match *path {
		EdgePath::Line { from, to } => {
			ctx.move_to(from.x, from.y);
			ctx.line_to(to.x, to.y);
		}
		EdgePath::Quad { from, ctrl, to } => {
			ctx.move_to(from.x, from.y);
			ctx.quadratic_curve_to(ctrl.x, ctrl.y, to.x, to.y);
		}
	}
}

fn draw_particles<R>(state: &CycleState<R>, ctx: &CanvasRenderingContext2d, surface: &Surface) {
	let radius = state.particles.config.radius;

	ctx.save();
	ctx.set_shadow_blur(surface.glow_blur);
	for p in state.particles.particles() {
		let Some(pos) = p.position else {
			continue;
		};
		// Color was captured at spawn; never re-resolved from the palette.
		ctx.set_shadow_color(&p.css);
		ctx.set_fill_style_str(&p.css);
		ctx.begin_path();
		let _ = ctx.arc(pos.x, pos.y, radius, 0.0, 2.0 * PI);
		ctx.fill();
	}
	ctx.restore();
}

fn draw_nodes<R>(state: &CycleState<R>, ctx: &CanvasRenderingContext2d, surface: &Surface) {
	let hovered = state.interaction.hovered();

	for (idx, node) in state.simulation.nodes().iter().enumerate() {
		draw_node(ctx, surface, node, hovered == Some(idx));

		let overlay = state.hover.intensity(idx);
		if overlay > 0.01 {
			draw_overlay(ctx, surface, node, overlay);
		}
	}

	// Labels last so neighbouring discs never cover them.
	ctx.save();
	ctx.set_font(&surface.label_font);
	ctx.set_text_align("center");
	ctx.set_fill_style_str(&surface.text);
	if let Some(glow) = &surface.text_glow {
		ctx.set_shadow_blur(surface.glow_blur);
		ctx.set_shadow_color(glow);
	}
	for node in state.simulation.nodes() {
		let _ = ctx.fill_text(
			&node.label,
			node.pos.x,
			node.pos.y + node.radius + surface.label_offset,
		);
	}
	ctx.restore();
}

fn draw_node(ctx: &CanvasRenderingContext2d, surface: &Surface, node: &Node, hovered: bool) {
	let (x, y) = (node.pos.x, node.pos.y);
	let group_color = surface.group_css(node.group);

	ctx.save();
	ctx.set_shadow_blur(surface.glow_blur);
	ctx.set_shadow_color(group_color);

	ctx.begin_path();
	let _ = ctx.arc(x, y, node.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&surface.node_fill);
	ctx.fill();

	ctx.set_stroke_style_str(if hovered {
		&surface.hover_stroke
	} else {
		group_color
	});
	ctx.set_line_width(surface.node_stroke_width);
	ctx.stroke();
	ctx.restore();
}

fn draw_overlay(ctx: &CanvasRenderingContext2d, surface: &Surface, node: &Node, intensity: f64) {
	let (x, y) = (node.pos.x, node.pos.y);
	let s = surface.overlay_arrow_scale;

	ctx.save();
	ctx.set_global_alpha(intensity);

	ctx.begin_path();
	let _ = ctx.arc(x, y, node.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&surface.overlay_fill);
	ctx.fill();

	ctx.begin_path();
	ctx.move_to(x - 3.0 * s, y - 5.0 * s);
	ctx.line_to(x + 5.0 * s, y);
	ctx.line_to(x - 3.0 * s, y + 5.0 * s);
	ctx.close_path();
	ctx.set_fill_style_str(&surface.arrow_fill);
	ctx.fill();

	ctx.restore();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn surface_bakes_the_palette() {
		let dark = Surface::new(&Palette::dark(), 700.0, 500.0);
		let light = Surface::new(&Palette::light(), 700.0, 500.0);
		assert_eq!(dark.group_css(Group::Input), "#38bdf8");
		assert_eq!(light.group_css(Group::Input), "#0ea5e9");
		assert_eq!(dark.node_fill, "#0f172a");
		assert_eq!(dark.text_glow.as_deref(), Some("rgba(0, 0, 0, 0.8)"));
		assert_eq!(light.text_glow, None);
		assert_eq!(dark.overlay_fill, "rgba(0, 0, 0, 0.5)");
	}

	#[test]
	fn feedback_edges_are_thinner_and_dashed() {
		let flow = Surface::edge_stroke(EdgeKind::Flow);
		let feedback = Surface::edge_stroke(EdgeKind::Feedback);
		assert_eq!(flow.dash, None);
		assert_eq!(feedback.dash, Some((5.0, 5.0)));
		assert!(feedback.width < flow.width);
	}

	#[test]
	fn arrowhead_stops_short_of_target() {
		let surface = Surface::new(&Palette::dark(), 700.0, 500.0);
		let path = EdgePath::new(EdgeKind::Flow, Point::new(0.0, 0.0), Point::new(100.0, 0.0));
		let [tip, left, right] = surface.arrowhead(&path, 20.0).unwrap();
		assert!(tip.distance(Point::new(76.0, 0.0)) < 1e-9);
		assert!((left.x - 68.0).abs() < 1e-9 && (right.x - 68.0).abs() < 1e-9);
		assert!(((left.y - right.y).abs() - 8.0).abs() < 1e-9);
	}

	#[test]
	fn feedback_arrowhead_follows_the_curve() {
		let surface = Surface::new(&Palette::dark(), 700.0, 500.0);
		let to = Point::new(100.0, 0.0);
		let path = EdgePath::new(EdgeKind::Feedback, Point::new(0.0, 0.0), to);
		let [tip, ..] = surface.arrowhead(&path, 10.0).unwrap();
		// Arrives from the bowed side, not along the chord.
		assert!(tip.y > 0.0);
		assert!((tip.distance(to) - 14.0).abs() < 1e-9);
	}

	#[test]
	fn degenerate_edges_have_no_arrowhead() {
		let surface = Surface::new(&Palette::dark(), 700.0, 500.0);
		let p = Point::new(3.0, 3.0);
		assert!(surface.arrowhead(&EdgePath::new(EdgeKind::Flow, p, p), 10.0).is_none());
	}
}
