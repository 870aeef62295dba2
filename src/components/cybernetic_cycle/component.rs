//! Leptos component hosting the diagram canvas.
//!
//! The container is watched with a `ResizeObserver`; any change of size, theme
//! mode, or topology tears the running scene down and builds a new one. A
//! single `requestAnimationFrame` loop ticks and draws whichever scene is
//! current.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, ResizeObserver, ResizeObserverEntry,
};

use super::geometry::Point;
use super::navigation::PageNavigator;
use super::physics::Node;
use super::render::{self, Surface};
use super::state::CycleState;
use super::theme::{Palette, ThemeMode};
use super::types::Topology;

/// Simulated time per animation frame, in seconds.
const FRAME_DT: f64 = 0.016;

/// The container's size is what gets observed, so nothing inside it may be in
/// flow: a canvas sized from the last measurement would otherwise feed back
/// into the next one.
const CONTAINER_STYLE: &str =
	"position: relative; width: 100%; height: 100%; min-height: 500px; overflow: hidden;";
const CANVAS_STYLE: &str = "position: absolute; inset: 0; display: block;";
const RESET_STYLE: &str = "position: absolute; top: 8px; right: 8px;";
const TOOLTIP_STYLE: &str =
	"position: absolute; pointer-events: none; transform: translate(-50%, -100%);";

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// One built diagram bound to its drawing context.
struct Scene {
	state: CycleState,
	surface: Surface,
	ctx: CanvasRenderingContext2d,
}

/// Browser-side resources owned by one mounted component.
#[derive(Default)]
struct Runtime {
	scene: Option<Scene>,
	frame_handle: Option<i32>,
	observer: Option<ResizeObserver>,
	observer_cb: Option<Closure<dyn FnMut(js_sys::Array)>>,
}

/// Tooltip content for the hovered node.
#[derive(Clone, Debug, PartialEq)]
struct HoverLabel {
	title: String,
	x: f64,
	y: f64,
}

impl HoverLabel {
	fn new(node: &Node) -> Self {
		Self {
			title: node.label.replace('_', " "),
			x: node.pos.x,
			y: node.pos.y - node.radius - 10.0,
		}
	}
}

/// Releases everything the component holds when it unmounts.
#[derive(Clone)]
struct Teardown {
	runtime: Rc<RefCell<Runtime>>,
	frame: FrameCallback,
}

impl Teardown {
	fn run(&self) {
		stop_loop(&self.runtime);
		let mut rt = self.runtime.borrow_mut();
		if let Some(observer) = rt.observer.take() {
			observer.disconnect();
		}
		rt.observer_cb = None;
		if let Some(mut scene) = rt.scene.take() {
			scene.state.shutdown();
		}
		drop(rt);
		// Frame closure holds a clone of its own cell; break the cycle.
		self.frame.borrow_mut().take();
		info!("cybernetic-loop: unmounted");
	}
}

/// Renders the animated cybernetic-loop diagram.
///
/// Fills its parent container. `topology` and `mode` are reactive: changing
/// either rebuilds the scene from scratch, as does a container resize. Pass
/// `seed` for a reproducible particle stream.
#[component]
pub fn CyberneticCycle(
	/// Nodes and edges to draw.
	#[prop(into)]
	topology: Signal<Topology>,
	/// Active theme mode.
	#[prop(into)]
	mode: Signal<ThemeMode>,
	/// Particle seed. Random per build when unset.
	#[prop(optional)]
	seed: Option<u64>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let dimensions = RwSignal::new((0.0_f64, 0.0_f64));
	let hovered = RwSignal::new(None::<HoverLabel>);

	let runtime: Rc<RefCell<Runtime>> = Rc::new(RefCell::new(Runtime::default()));
	let frame: FrameCallback = Rc::new(RefCell::new(None));

	let rt_observe = runtime.clone();
	Effect::new(move |_| {
		let Some(container) = container_ref.get() else {
			return;
		};
		if rt_observe.borrow().observer.is_some() {
			return;
		}

		let cb = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
			let Ok(entry) = entries.get(0).dyn_into::<ResizeObserverEntry>() else {
				return;
			};
			let rect = entry.content_rect();
			let next = (rect.width().floor(), rect.height().floor());
			if dimensions.try_get_untracked() != Some(next) {
				dimensions.try_set(next);
			}
		});
		let observer = match ResizeObserver::new(cb.as_ref().unchecked_ref()) {
			Ok(observer) => observer,
			Err(e) => {
				warn!("cybernetic-loop: ResizeObserver unavailable: {e:?}");
				return;
			}
		};
		observer.observe(&container);

		let mut rt = rt_observe.borrow_mut();
		rt.observer = Some(observer);
		rt.observer_cb = Some(cb);
	});

	let (rt_build, frame_build) = (runtime.clone(), frame.clone());
	Effect::new(move |_| {
		let (width, height) = dimensions.get();
		let mode = mode.get();
		let topology = topology.get();
		let canvas = canvas_ref.get();

		stop_loop(&rt_build);
		let old = rt_build.borrow_mut().scene.take();
		if let Some(mut old) = old {
			old.state.shutdown();
		}
		hovered.set(None);

		let Some(canvas) = canvas else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let seed = seed.unwrap_or_else(|| (js_sys::Math::random() * u64::MAX as f64) as u64);
		let Some(scene) = build_scene(&canvas, &topology, mode, width, height, seed) else {
			return;
		};

		info!(
			"cybernetic-loop: built {}x{} {} scene, {} nodes, {} edges",
			width,
			height,
			mode.as_str(),
			scene.state.simulation.nodes().len(),
			scene.state.simulation.links().len()
		);
		rt_build.borrow_mut().scene = Some(scene);
		start_loop(&rt_build, &frame_build);
	});

	let teardown = StoredValue::new_local(Teardown {
		runtime: runtime.clone(),
		frame,
	});
	on_cleanup(move || {
		if let Some(teardown) = teardown.try_get_value() {
			teardown.run();
		}
	});

	let rt_md = runtime.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(scene) = rt_md.borrow_mut().scene.as_mut() {
			scene.state.pointer_down(p);
		}
	};

	let rt_mm = runtime.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		let label = {
			let mut rt = rt_mm.borrow_mut();
			let Some(scene) = rt.scene.as_mut() else {
				return;
			};
			let Some(change) = scene.state.pointer_move(p) else {
				return;
			};
			change
				.current
				.and_then(|idx| scene.state.simulation.node(idx))
				.map(HoverLabel::new)
		};
		hovered.set(label);
	};

	let rt_mu = runtime.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(scene) = rt_mu.borrow_mut().scene.as_mut() {
			scene.state.pointer_up(p, &PageNavigator);
		}
	};

	let rt_ml = runtime.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(scene) = rt_ml.borrow_mut().scene.as_mut() {
			scene.state.pointer_leave();
		}
		hovered.set(None);
	};

	let rt_reset = runtime;
	let on_reset = move |_: MouseEvent| {
		if let Some(scene) = rt_reset.borrow_mut().scene.as_mut() {
			scene.state.reset();
			info!("cybernetic-loop: layout reset");
		}
	};

	view! {
		<div
			node_ref=container_ref
			class="cybernetic-cycle"
			style=CONTAINER_STYLE
		>
			<canvas
				node_ref=canvas_ref
				class="cybernetic-cycle-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				style=CANVAS_STYLE
				style:cursor=move || { if hovered.get().is_some() { "pointer" } else { "grab" } }
			/>
			<button class="cybernetic-cycle-reset" style=RESET_STYLE on:click=on_reset>
				"Reset Layout"
			</button>
			{move || {
				hovered
					.get()
					.map(|label| {
						view! {
							<div
								class="cybernetic-cycle-tooltip"
								style=TOOLTIP_STYLE
								style:left=format!("{}px", label.x)
								style:top=format!("{}px", label.y)
							>
								<div class="cybernetic-cycle-tooltip-title">{label.title}</div>
								<div class="cybernetic-cycle-tooltip-hint">"[ Click to Navigate ]"</div>
							</div>
						}
					})
			}}
		</div>
	}
}

fn build_scene(
	canvas: &HtmlCanvasElement,
	topology: &Topology,
	mode: ThemeMode,
	width: f64,
	height: f64,
	seed: u64,
) -> Option<Scene> {
	let palette = Palette::for_mode(mode);
	let surface = Surface::new(&palette, width, height);
	let state = CycleState::new(topology, palette, width, height, seed)?;

	canvas.set_width(width as u32);
	canvas.set_height(height as u32);
	let ctx = canvas
		.get_context("2d")
		.ok()
		.flatten()?
		.dyn_into::<CanvasRenderingContext2d>()
		.ok()?;

	Some(Scene {
		state,
		surface,
		ctx,
	})
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn request_frame(frame: &FrameCallback) -> Option<i32> {
	let window = web_sys::window()?;
	let cb = frame.borrow();
	window
		.request_animation_frame(cb.as_ref()?.as_ref().unchecked_ref())
		.ok()
}

fn start_loop(runtime: &Rc<RefCell<Runtime>>, frame: &FrameCallback) {
	if frame.borrow().is_none() {
		let (rt, inner) = (runtime.clone(), frame.clone());
		*frame.borrow_mut() = Some(Closure::new(move || on_frame(&rt, &inner)));
	}
	let handle = request_frame(frame);
	runtime.borrow_mut().frame_handle = handle;
}

fn stop_loop(runtime: &Rc<RefCell<Runtime>>) {
	let Some(handle) = runtime.borrow_mut().frame_handle.take() else {
		return;
	};
	if let Some(window) = web_sys::window() {
		let _ = window.cancel_animation_frame(handle);
	}
}

fn on_frame(runtime: &Rc<RefCell<Runtime>>, frame: &FrameCallback) {
	let rt = &mut *runtime.borrow_mut();
	rt.frame_handle = None;
	let Some(scene) = rt.scene.as_mut() else {
		return;
	};
	scene.state.tick(FRAME_DT);
	render::render(&scene.state, &scene.ctx, &scene.surface);
	rt.frame_handle = request_frame(frame);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::cybernetic_cycle::physics::{Simulation, SimulationParameters};

	#[test]
	fn container_size_does_not_depend_on_its_children() {
		assert!(CONTAINER_STYLE.contains("position: relative"));
		assert!(CONTAINER_STYLE.contains("min-height: 500px"));
		for child in [CANVAS_STYLE, RESET_STYLE, TOOLTIP_STYLE] {
			assert!(child.contains("position: absolute"), "{child}");
		}
		assert!(CANVAS_STYLE.contains("inset: 0"));
	}

	#[test]
	fn tooltip_title_spaces_out_labels() {
		let sim = Simulation::new(&Topology::default(), SimulationParameters::default());
		let node = sim.node(0).unwrap();
		let label = HoverLabel::new(node);
		assert_eq!(label.title, "SYSTEM INPUT");
		assert_eq!(label.x, node.pos.x);
		assert!(label.y < node.pos.y - node.radius);
	}
}
