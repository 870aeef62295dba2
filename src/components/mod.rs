//! Leptos components.

pub mod cybernetic_cycle;
