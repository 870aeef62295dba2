//! Browser scroll-and-highlight service for node clicks.

use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition};

use super::interaction::Navigator;

/// Classes applied to a landmark while it is highlighted.
const HIGHLIGHT_CLASSES: [&str; 3] = [
	"ring-2",
	"ring-emerald-500",
	"shadow-[0_0_50px_rgba(16,185,129,0.3)]",
];

const HIGHLIGHT_MS: i32 = 2000;

/// Scrolls the landmark with the section's id to the viewport center and
/// briefly highlights it.
#[derive(Clone, Copy, Debug, Default)]
pub struct PageNavigator;

impl Navigator for PageNavigator {
	fn navigate(&self, section_id: &str) -> bool {
		let Some(window) = web_sys::window() else {
			return false;
		};
		let Some(element) = window
			.document()
			.and_then(|d| d.get_element_by_id(section_id))
		else {
			return false;
		};

		let options = ScrollIntoViewOptions::new();
		options.set_behavior(ScrollBehavior::Smooth);
		options.set_block(ScrollLogicalPosition::Center);
		element.scroll_into_view_with_scroll_into_view_options(&options);

		let [a, b, c] = HIGHLIGHT_CLASSES;
		if element.class_list().add_3(a, b, c).is_err() {
			return true;
		}

		let target = element.clone();
		let clear = Closure::once_into_js(move || {
			let _ = target.class_list().remove_3(a, b, c);
		});
		if window
			.set_timeout_with_callback_and_timeout_and_arguments_0(clear.unchecked_ref(), HIGHLIGHT_MS)
			.is_err()
		{
			debug!("cybernetic-loop: could not schedule highlight removal for `{section_id}`");
		}
		true
	}
}
