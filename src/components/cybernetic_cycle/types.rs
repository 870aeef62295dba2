//! Topology data structures: the static node and edge lists fed to the diagram.

use std::collections::HashMap;

use serde::Deserialize;

/// Role a node plays in the loop. Drives its color in every palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
	/// Where signals enter the system.
	Input,
	/// Active work on incoming signals.
	Process,
	/// Monitoring and correction.
	Control,
	/// Results leaving the system.
	Output,
	/// Effect of output on the outside world.
	Reach,
	/// Augmentation of signals before processing.
	Enrichment,
	/// Long-running work feeding enrichment.
	Background,
}

impl Group {
	/// Every group, in palette order.
	pub const ALL: [Group; 7] = [
		Group::Input,
		Group::Process,
		Group::Control,
		Group::Output,
		Group::Reach,
		Group::Enrichment,
		Group::Background,
	];

	/// Lowercase name, as used in topology JSON.
	pub fn as_str(self) -> &'static str {
		match self {
			Group::Input => "input",
			Group::Process => "process",
			Group::Control => "control",
			Group::Output => "output",
			Group::Reach => "reach",
			Group::Enrichment => "enrichment",
			Group::Background => "background",
		}
	}

	/// Position in [`Group::ALL`], used to index per-group tables.
	pub fn index(self) -> usize {
		self as usize
	}
}

/// Relationship between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
	/// Forward edge, drawn as a straight solid arrow.
	Flow,
	/// Loop-back edge, drawn as a curved dashed arrow.
	Feedback,
}

/// A node as declared in the topology.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NodeSpec {
	/// Unique identifier. Edges reference nodes by this id.
	pub id: String,
	/// Determines the node's color.
	pub group: Group,
	/// Display label, conventionally `UPPER_SNAKE_CASE`.
	pub label: String,
	/// Page landmark to navigate to on click. Derived from the label when unset.
	#[serde(default)]
	pub section: Option<String>,
	/// Display radius in canvas units.
	pub radius: f64,
	/// Rest position, x.
	pub anchor_x: f64,
	/// Rest position, y.
	pub anchor_y: f64,
}

impl NodeSpec {
	/// Node with no explicit section.
	pub fn new(
		id: impl Into<String>,
		group: Group,
		label: impl Into<String>,
		radius: f64,
		anchor_x: f64,
		anchor_y: f64,
	) -> Self {
		Self {
			id: id.into(),
			group,
			label: label.into(),
			section: None,
			radius,
			anchor_x,
			anchor_y,
		}
	}

	/// Section identifier of the landmark this node links to.
	///
	/// `SYSTEM_INPUT` becomes `system-input` unless an explicit section is set.
	pub fn section_id(&self) -> String {
		match &self.section {
			Some(section) => section.clone(),
			None => self.label.to_lowercase().replace('_', "-"),
		}
	}
}

/// A directed edge between two nodes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EdgeSpec {
	/// Id of the node the edge leaves.
	pub source: String,
	/// Id of the node the edge enters.
	pub target: String,
	/// Flow or feedback.
	pub kind: EdgeKind,
}

impl EdgeSpec {
	/// Edge from `source` to `target`.
	pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			kind,
		}
	}
}

/// Static diagram definition. Never mutated by the simulation: each mounted
/// instance works on its own resolved copy.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Topology {
	/// Node declarations, in draw order.
	pub nodes: Vec<NodeSpec>,
	/// Edge declarations. JSON may call them `links`.
	#[serde(alias = "links")]
	pub edges: Vec<EdgeSpec>,
}

/// Configuration problems found while resolving a [`Topology`].
///
/// None of these are fatal; the offending node or edge is left out.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TopologyError {
	/// A node id was declared more than once. Later declarations are skipped.
	#[error("duplicate node id `{id}`")]
	DuplicateNode {
		/// The repeated id.
		id: String,
	},
	/// A node radius is zero, negative, or not finite.
	#[error("node `{id}` has invalid radius {radius}")]
	InvalidRadius {
		/// Offending node.
		id: String,
		/// Declared radius.
		radius: f64,
	},
	/// An edge names a node that does not exist.
	#[error("edge {from} -> {to} references unknown node `{missing}`")]
	UnknownEndpoint {
		/// Declared source id.
		from: String,
		/// Declared target id.
		to: String,
		/// The id that could not be found.
		missing: String,
	},
}

/// An edge whose endpoints have been mapped to arena indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedEdge {
	/// Index of the source node.
	pub source: usize,
	/// Index of the target node.
	pub target: usize,
	/// Flow or feedback.
	pub kind: EdgeKind,
}

/// Owned, index-addressed copy of a topology.
#[derive(Clone, Debug, Default)]
pub struct ResolvedTopology {
	/// Nodes that passed validation, in declaration order.
	pub nodes: Vec<NodeSpec>,
	/// Edges with both endpoints resolved.
	pub edges: Vec<ResolvedEdge>,
	/// Everything that was skipped, and why.
	pub errors: Vec<TopologyError>,
}

impl Topology {
	/// The seven-node feedback loop shown on the page.
	pub fn cybernetic_loop() -> Self {
		use EdgeKind::{Feedback, Flow};

		let node = |group: Group, label: &str, radius, x, y| {
			NodeSpec::new(group.as_str(), group, label, radius, x, y)
		};

		Self {
			nodes: vec![
				node(Group::Input, "SYSTEM_INPUT", 20.0, 300.0, 350.0),
				node(Group::Background, "BACKGROUND_PROCESSES", 18.0, 600.0, 150.0),
				node(Group::Enrichment, "SIGNAL_ENRICHMENT", 15.0, 500.0, 250.0),
				node(Group::Process, "ACTIVE_MODULES", 25.0, 450.0, 100.0),
				node(Group::Control, "RUNTIME_DIAGNOSTICS", 20.0, 300.0, 150.0),
				node(Group::Output, "OUTPUT_BUFFER", 18.0, 100.0, 150.0),
				node(Group::Reach, "SYSTEM_REACH", 30.0, 200.0, 350.0),
			],
			edges: vec![
				EdgeSpec::new("input", "process", Flow),
				EdgeSpec::new("process", "control", Flow),
				EdgeSpec::new("control", "output", Flow),
				EdgeSpec::new("output", "reach", Flow),
				EdgeSpec::new("background", "enrichment", Flow),
				EdgeSpec::new("enrichment", "process", Flow),
				EdgeSpec::new("control", "input", Feedback),
				EdgeSpec::new("reach", "input", Feedback),
				EdgeSpec::new("input", "enrichment", Feedback),
			],
		}
	}

	/// Deep-copy the topology into index-addressed form.
	///
	/// Duplicate ids and invalid radii drop the node; edges with an unknown
	/// endpoint are dropped. Every drop is reported in `errors`.
	pub fn resolve(&self) -> ResolvedTopology {
		let mut resolved = ResolvedTopology::default();
		let mut id_to_idx: HashMap<&str, usize> = HashMap::new();

		for spec in &self.nodes {
			if id_to_idx.contains_key(spec.id.as_str()) {
				resolved.errors.push(TopologyError::DuplicateNode {
					id: spec.id.clone(),
				});
				continue;
			}
			if !(spec.radius.is_finite() && spec.radius > 0.0) {
				resolved.errors.push(TopologyError::InvalidRadius {
					id: spec.id.clone(),
					radius: spec.radius,
				});
				continue;
			}
			id_to_idx.insert(&spec.id, resolved.nodes.len());
			resolved.nodes.push(spec.clone());
		}

		for edge in &self.edges {
			match (
				id_to_idx.get(edge.source.as_str()),
				id_to_idx.get(edge.target.as_str()),
			) {
				(Some(&source), Some(&target)) => resolved.edges.push(ResolvedEdge {
					source,
					target,
					kind: edge.kind,
				}),
				(src, _) => {
					let missing = if src.is_none() {
						&edge.source
					} else {
						&edge.target
					};
					resolved.errors.push(TopologyError::UnknownEndpoint {
						from: edge.source.clone(),
						to: edge.target.clone(),
						missing: missing.clone(),
					});
				}
			}
		}

		resolved
	}
}

impl Default for Topology {
	fn default() -> Self {
		Self::cybernetic_loop()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_topology_is_consistent() {
		let topology = Topology::default();
		assert_eq!(topology.nodes.len(), 7);
		assert_eq!(topology.edges.len(), 9);

		let resolved = topology.resolve();
		assert!(resolved.errors.is_empty(), "{:?}", resolved.errors);
		assert_eq!(resolved.nodes.len(), 7);
		assert_eq!(resolved.edges.len(), 9);
		assert_eq!(
			resolved
				.edges
				.iter()
				.filter(|e| e.kind == EdgeKind::Feedback)
				.count(),
			3
		);
	}

	#[test]
	fn section_ids_follow_labels() {
		let topology = Topology::default();
		let sections: Vec<String> = topology.nodes.iter().map(NodeSpec::section_id).collect();
		assert!(sections.contains(&"system-input".to_string()));
		assert!(sections.contains(&"runtime-diagnostics".to_string()));
		assert!(sections.contains(&"background-processes".to_string()));

		let mut spec = NodeSpec::new("x", Group::Output, "SOME_LABEL", 10.0, 0.0, 0.0);
		spec.section = Some("custom".into());
		assert_eq!(spec.section_id(), "custom");
	}

	#[test]
	fn unknown_endpoints_are_skipped() {
		let mut topology = Topology::default();
		topology
			.edges
			.push(EdgeSpec::new("input", "ghost", EdgeKind::Flow));
		topology
			.edges
			.push(EdgeSpec::new("phantom", "input", EdgeKind::Feedback));

		let resolved = topology.resolve();
		assert_eq!(resolved.edges.len(), 9);
		assert_eq!(resolved.errors.len(), 2);
		assert_eq!(
			resolved.errors[0],
			TopologyError::UnknownEndpoint {
				from: "input".into(),
				to: "ghost".into(),
				missing: "ghost".into(),
			}
		);
		match &resolved.errors[1] {
			TopologyError::UnknownEndpoint { missing, .. } => assert_eq!(missing, "phantom"),
			other => panic!("unexpected error {other:?}"),
		}
	}

	#[test]
	fn duplicates_and_bad_radii_are_dropped() {
		let topology = Topology {
			nodes: vec![
				NodeSpec::new("a", Group::Input, "A", 10.0, 0.0, 0.0),
				NodeSpec::new("a", Group::Output, "A_AGAIN", 10.0, 5.0, 5.0),
				NodeSpec::new("b", Group::Reach, "B", 0.0, 5.0, 5.0),
			],
			edges: vec![EdgeSpec::new("a", "b", EdgeKind::Flow)],
		};

		let resolved = topology.resolve();
		assert_eq!(resolved.nodes.len(), 1);
		assert_eq!(resolved.nodes[0].group, Group::Input);
		assert!(resolved.edges.is_empty());
		assert_eq!(resolved.errors.len(), 3);
	}

	#[test]
	fn resolve_does_not_alias_the_template() {
		let topology = Topology::default();
		let mut first = topology.resolve();
		first.nodes[0].anchor_x = -1.0;
		let second = topology.resolve();
		assert_eq!(second.nodes[0].anchor_x, 300.0);
		assert_eq!(topology.nodes[0].anchor_x, 300.0);
	}

	#[test]
	fn parses_json_topology() {
		let json = r#"{
			"nodes": [
				{ "id": "in", "group": "input", "label": "SYSTEM_INPUT", "radius": 20, "anchor_x": 1, "anchor_y": 2 },
				{ "id": "out", "group": "output", "label": "OUT", "section": "publications", "radius": 18, "anchor_x": 3, "anchor_y": 4 }
			],
			"links": [ { "source": "in", "target": "out", "kind": "feedback" } ]
		}"#;
		let topology: Topology = serde_json::from_str(json).unwrap();
		assert_eq!(topology.nodes[1].section_id(), "publications");
		assert_eq!(topology.edges[0].kind, EdgeKind::Feedback);
		assert!(topology.resolve().errors.is_empty());
	}
}
