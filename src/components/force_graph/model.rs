//! Canonical node and link collections. Links refer to nodes by key into
//! the single owning `Vec<Node>`.

use std::collections::{BTreeMap, HashMap};

use log::warn;
use serde_json::Value;

use super::types::{GraphData, Group, NodeSnapshot, Properties};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey(pub usize);

/// Fixed position the layout engine must hold a node at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pin {
	pub fx: f64,
	pub fy: f64,
}

/// Size of the card drawn for a node in the last frame, centered on the node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
	pub width: f64,
	pub height: f64,
}

#[derive(Clone, Debug)]
pub struct Node {
	pub key: NodeKey,
	pub id: String,
	pub name: String,
	pub group: Group,
	/// Group name as served, shown in the details panel.
	pub group_label: String,
	pub properties: Properties,
	pub pin: Option<Pin>,
	/// `None` means the default circular hit area.
	pub footprint: Option<Footprint>,
}

impl Node {
	/// String value of a property; non-string scalars are not paths.
	pub fn property_str(&self, key: &str) -> Option<&str> {
		match self.properties.get(key) {
			Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
			_ => None,
		}
	}

	pub fn snapshot(&self) -> NodeSnapshot {
		NodeSnapshot {
			id: self.id.clone(),
			group: self.group_label.clone(),
			name: self.name.clone(),
			properties: self.properties.clone(),
		}
	}

	/// Merge edited values into the node; `name` also renames the label.
	pub fn apply_properties(&mut self, values: &BTreeMap<String, String>) {
		for (key, value) in values {
			if key == "name" {
				self.name = value.clone();
			}
			self.properties.insert(key.clone(), Value::String(value.clone()));
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	pub key: LinkKey,
	pub source: NodeKey,
	pub target: NodeKey,
	pub kind: String,
}

impl Link {
	pub fn touches(&self, node: NodeKey) -> bool {
		self.source == node || self.target == node
	}
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<Node>,
	links: Vec<Link>,
	by_id: HashMap<String, NodeKey>,
}

impl Graph {
	pub fn from_data(data: &GraphData) -> Self {
		let mut graph = Graph::default();

		for node in &data.nodes {
			if graph.by_id.contains_key(&node.id) {
				warn!("duplicate node id {:?}, keeping the first", node.id);
				continue;
			}
			let key = NodeKey(graph.nodes.len());
			let group_label = node.group.clone().unwrap_or_else(|| "Unknown".into());
			let group = Group::parse(&group_label);
			let group_label = if group == Group::Site { "Site".into() } else { group_label };
			graph.nodes.push(Node {
				key,
				id: node.id.clone(),
				name: node.name.clone().unwrap_or_else(|| node.id.clone()),
				group,
				group_label,
				properties: node.properties.clone().unwrap_or_default(),
				pin: None,
				footprint: None,
			});
			graph.by_id.insert(node.id.clone(), key);
		}

		for link in &data.links {
			match (graph.key_of(&link.source), graph.key_of(&link.target)) {
				(Some(source), Some(target)) => {
					let key = LinkKey(graph.links.len());
					graph.links.push(Link {
						key,
						source,
						target,
						kind: link.kind.clone(),
					});
				}
				_ => warn!(
					"dropping link {} -> {}: unknown endpoint",
					link.source, link.target
				),
			}
		}

		graph
	}

	pub fn key_of(&self, id: &str) -> Option<NodeKey> {
		self.by_id.get(id).copied()
	}

	pub fn node(&self, key: NodeKey) -> Option<&Node> {
		self.nodes.get(key.0)
	}

	pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
		self.nodes.get_mut(key.0)
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}

	pub fn link(&self, key: LinkKey) -> Option<&Link> {
		self.links.get(key.0)
	}

	pub fn links(&self) -> &[Link] {
		&self.links
	}
}
