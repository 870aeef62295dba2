//! Visual theming for the diagram.
//!
//! A theme is one of two modes, each resolving to a fixed [`Palette`]. The
//! renderer bakes palette colors into its surface at construction, so a mode
//! change means building a new surface rather than patching the old one.

use super::types::Group;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Opacity in `[0, 1]`.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with opacity `a`.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color with opacity `a`.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// CSS color string: `#rrggbb` when opaque, `rgba(..)` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// The two theme modes exposed by the page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ThemeMode {
	/// Light content on a dark background.
	#[default]
	Dark,
	/// Dark content on a light background.
	Light,
}

impl ThemeMode {
	/// Value written to the page's `data-theme` attribute.
	pub fn as_str(self) -> &'static str {
		match self {
			ThemeMode::Dark => "dark",
			ThemeMode::Light => "light",
		}
	}

	/// The other mode.
	pub fn toggled(self) -> Self {
		match self {
			ThemeMode::Dark => ThemeMode::Light,
			ThemeMode::Light => ThemeMode::Dark,
		}
	}
}

/// One color per node group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupColors {
	colors: [Color; 7],
}

impl GroupColors {
	/// Colors in [`Group::ALL`] order.
	pub const fn new(colors: [Color; 7]) -> Self {
		Self { colors }
	}

	/// Color of `group`.
	pub fn get(&self, group: Group) -> Color {
		self.colors[group.index()]
	}
}

/// Resolved colors for one theme mode.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
	/// Mode this palette belongs to.
	pub mode: ThemeMode,
	/// Per-group colors.
	pub groups: GroupColors,
	/// Interior of every node disc.
	pub node_fill: Color,
	/// Node outline while hovered. Unhovered outlines use the group color.
	pub node_stroke: Color,
	/// Label text.
	pub text: Color,
	/// Halo behind label text, if the mode uses one.
	pub glow: Option<Color>,
	/// Dimming disc drawn over a hovered node.
	pub overlay_fill: Color,
	/// "Go" arrow drawn on top of the hover overlay.
	pub arrow_fill: Color,
}

impl Palette {
	/// Palette for dark backgrounds.
	pub fn dark() -> Self {
		Self {
			mode: ThemeMode::Dark,
			groups: GroupColors::new([
				Color::rgb(0x38, 0xbd, 0xf8), // input: sky
				Color::rgb(0x10, 0xb9, 0x81), // process: emerald
				Color::rgb(0xf5, 0x9e, 0x0b), // control: amber
				Color::rgb(0x8b, 0x5c, 0xf6), // output: violet
				Color::rgb(0xec, 0x48, 0x99), // reach: pink
				Color::rgb(0x63, 0x66, 0xf1), // enrichment: indigo
				Color::rgb(0x94, 0xa3, 0xb8), // background: slate
			]),
			node_fill: Color::rgb(0x0f, 0x17, 0x2a),
			node_stroke: Color::rgb(0xff, 0xff, 0xff),
			text: Color::rgb(0xcb, 0xd5, 0xe1),
			glow: Some(Color::rgba(0, 0, 0, 0.8)),
			overlay_fill: Color::rgba(0, 0, 0, 0.5),
			arrow_fill: Color::rgb(0xff, 0xff, 0xff),
		}
	}

	/// Palette for light backgrounds.
	pub fn light() -> Self {
		Self {
			mode: ThemeMode::Light,
			groups: GroupColors::new([
				Color::rgb(0x0e, 0xa5, 0xe9),
				Color::rgb(0x05, 0x96, 0x69),
				Color::rgb(0xd9, 0x77, 0x06),
				Color::rgb(0x7c, 0x3a, 0xed),
				Color::rgb(0xdb, 0x27, 0x77),
				Color::rgb(0x4f, 0x46, 0xe5),
				Color::rgb(0x78, 0x71, 0x6c),
			]),
			node_fill: Color::rgb(0xfa, 0xfa, 0xf9),
			node_stroke: Color::rgb(0, 0, 0),
			text: Color::rgb(0x44, 0x40, 0x3c),
			glow: None,
			overlay_fill: Color::rgba(0, 0, 0, 0.5),
			arrow_fill: Color::rgb(0xff, 0xff, 0xff),
		}
	}

	/// Palette for `mode`.
	pub fn for_mode(mode: ThemeMode) -> Self {
		match mode {
			ThemeMode::Dark => Self::dark(),
			ThemeMode::Light => Self::light(),
		}
	}

	/// Color of nodes, edges, and particles of `group`.
	pub fn group_color(&self, group: Group) -> Color {
		self.groups.get(group)
	}
}

impl Default for Palette {
	fn default() -> Self {
		Self::for_mode(ThemeMode::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn css_output() {
		assert_eq!(Color::rgb(0x38, 0xbd, 0xf8).to_css(), "#38bdf8");
		assert_eq!(Color::rgba(0, 0, 0, 0.5).to_css(), "rgba(0, 0, 0, 0.5)");
		assert_eq!(Color::rgb(1, 2, 3).with_alpha(0.4).to_css(), "rgba(1, 2, 3, 0.4)");
	}

	#[test]
	fn modes_resolve_to_distinct_palettes() {
		let dark = Palette::for_mode(ThemeMode::Dark);
		let light = Palette::for_mode(ThemeMode::Light);
		assert_eq!(dark.mode, ThemeMode::Dark);
		assert_eq!(light.mode, ThemeMode::Light);
		assert_ne!(dark.node_fill, light.node_fill);
		for group in Group::ALL {
			assert_ne!(dark.group_color(group), light.group_color(group), "{group:?}");
		}
		assert_eq!(dark.group_color(Group::Reach).to_css(), "#ec4899");
		assert_eq!(light.group_color(Group::Background).to_css(), "#78716c");
	}

	#[test]
	fn toggling_flips_between_the_two_modes() {
		assert_eq!(ThemeMode::Dark.toggled(), ThemeMode::Light);
		assert_eq!(ThemeMode::Light.toggled().toggled(), ThemeMode::Light);
		assert_eq!(ThemeMode::default().as_str(), "dark");
	}
}
