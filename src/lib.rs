//! cybernetic-loop: animated systems diagram for a portfolio page.
//!
//! This crate provides a WASM canvas component that draws a small cybernetic
//! loop (input, process, control, output, reach, with feedback paths) as an
//! anchored force layout with flowing particles, dragging, and click-through
//! navigation to the page sections each node stands for.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::cybernetic_cycle::{
	CyberneticCycle, EdgeKind, EdgeSpec, Group, NodeSpec, Palette, ThemeMode, Topology,
	TopologyError,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("cybernetic-loop: logging initialized");
}

/// Parse a topology override. Parse failures are logged and yield `None`.
pub fn parse_topology(json: &str) -> Option<Topology> {
	match serde_json::from_str::<Topology>(json) {
		Ok(topology) => {
			info!(
				"cybernetic-loop: loaded {} nodes, {} edges",
				topology.nodes.len(),
				topology.edges.len()
			);
			Some(topology)
		}
		Err(e) => {
			warn!("cybernetic-loop: failed to parse topology: {}", e);
			None
		}
	}
}

/// Load a topology override from a script element with id="cycle-topology".
/// Expected format: JSON with { nodes: [...], edges: [...] }
fn load_topology() -> Option<Topology> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("cycle-topology")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;
	parse_topology(&json_text)
}

/// Initial mode from the visitor's color scheme preference.
fn preferred_mode() -> ThemeMode {
	let prefers_light = web_sys::window()
		.and_then(|w| w.match_media("(prefers-color-scheme: light)").ok().flatten())
		.is_some_and(|q| q.matches());
	if prefers_light {
		ThemeMode::Light
	} else {
		ThemeMode::Dark
	}
}

/// Main application component.
/// Renders the diagram with a theme toggle and the sections its nodes link to.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let topology = load_topology().unwrap_or_default();
	let sections: Vec<(String, String)> = topology
		.nodes
		.iter()
		.map(|n| (n.section_id(), n.label.replace('_', " ")))
		.collect();
	let topology_signal = Signal::derive(move || topology.clone());

	let mode = RwSignal::new(preferred_mode());
	let toggle = move |_| mode.update(|m| *m = m.toggled());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=move || mode.get().as_str() />
		<Title text="Cybernetic Loop" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<header class="cycle-header">
			<h1>"System Architecture"</h1>
			<button class="theme-toggle" on:click=toggle>
				{move || match mode.get() {
					ThemeMode::Dark => "Light mode",
					ThemeMode::Light => "Dark mode",
				}}
			</button>
		</header>

		<div class="cycle-stage" style="position: relative; height: 500px;">
			<CyberneticCycle topology=topology_signal mode=mode />
		</div>

		<main class="cycle-sections">
			{sections
				.into_iter()
				.map(|(id, title)| {
					view! {
						<section id=id class="cycle-section">
							<h2>{title}</h2>
						</section>
					}
				})
				.collect_view()}
		</main>
	}
}
