//! Animated cybernetic-loop diagram.
//!
//! Draws a small fixed graph of system stages on an HTML canvas with:
//! - Anchored force layout that settles near a designed arrangement
//! - Straight flow edges and curved, dashed feedback edges
//! - Particles streaming along every edge
//! - Node dragging, hover tooltips, and click-to-scroll navigation
//! - Dark and light palettes
//!
//! # Example
//!
//! ```ignore
//! use cybernetic_loop::{CyberneticCycle, ThemeMode, Topology};
//!
//! let mode = RwSignal::new(ThemeMode::Dark);
//! view! { <CyberneticCycle topology=Topology::default() mode=mode /> }
//! ```

mod component;
pub mod geometry;
pub mod interaction;
mod navigation;
pub mod particles;
pub mod physics;
mod render;
pub mod state;
pub mod theme;
pub mod types;

pub use component::CyberneticCycle;
pub use interaction::Navigator;
pub use navigation::PageNavigator;
pub use render::Surface;
pub use state::CycleState;
pub use theme::{Palette, ThemeMode};
pub use types::{EdgeKind, EdgeSpec, Group, NodeSpec, Topology, TopologyError};
