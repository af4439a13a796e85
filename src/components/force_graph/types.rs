use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GraphError;

/// Free-form node attributes as served by the backend.
pub type Properties = BTreeMap<String, Value>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GraphNode {
	pub id: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub group: Option<String>,
	#[serde(default)]
	pub properties: Option<Properties>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
	#[serde(rename = "type", default)]
	pub kind: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct GraphData {
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	#[serde(default)]
	pub links: Vec<GraphLink>,
}

impl GraphData {
	pub fn from_json(text: &str) -> Result<Self, GraphError> {
		Ok(serde_json::from_str(text)?)
	}
}

/// Entity category. Drives color and card/glyph treatment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Group {
	Person,
	Organization,
	Event,
	Post,
	Profile,
	Site,
	Channel,
	Unknown,
}

impl Group {
	pub fn parse(name: &str) -> Self {
		match name {
			"Person" => Group::Person,
			"Organization" => Group::Organization,
			"Event" => Group::Event,
			"Post" => Group::Post,
			"Profile" => Group::Profile,
			// pages are shown as sites
			"Site" | "Page" => Group::Site,
			"Channel" => Group::Channel,
			_ => Group::Unknown,
		}
	}

	pub fn color(self) -> &'static str {
		match self {
			Group::Person => "#f778ba",
			Group::Organization => "#58a6ff",
			Group::Event => "#d2a8ff",
			Group::Post => "#7ee787",
			Group::Profile => "#ffa657",
			Group::Site => "#00bcd4",
			Group::Channel | Group::Unknown => "#8b949e",
		}
	}

	/// Primary groups always render as cards.
	pub fn is_primary(self) -> bool {
		matches!(
			self,
			Group::Organization
				| Group::Person
				| Group::Profile
				| Group::Site
				| Group::Event
				| Group::Channel
		)
	}
}

/// What the details panel receives when a node is activated.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSnapshot {
	pub id: String,
	pub group: String,
	pub name: String,
	pub properties: Properties,
}

impl NodeSnapshot {
	/// Merge saved edits so the panel shows what the graph now holds.
	pub fn merge(&mut self, update: &NodeUpdate) {
		if update.id != self.id {
			return;
		}
		for (key, value) in &update.properties {
			if key == "name" {
				self.name = value.clone();
			}
			self.properties.insert(key.clone(), Value::String(value.clone()));
		}
	}
}

/// Edit-save request body.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NodeUpdate {
	pub id: String,
	pub properties: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_backend_payload() {
		let data = GraphData::from_json(
			r#"{
				"nodes": [
					{"id": "org-1", "name": "Org", "group": "Organization", "properties": {"image": "logos/org.png", "founded": 1999}},
					{"id": "post-1", "group": "Post"}
				],
				"links": [{"source": "org-1", "target": "post-1", "type": "PUBLISHED"}]
			}"#,
		)
		.unwrap();
		assert_eq!(data.nodes.len(), 2);
		assert_eq!(data.nodes[1].name, None);
		assert_eq!(data.nodes[1].properties, None);
		assert_eq!(data.links[0].kind, "PUBLISHED");
	}

	#[test]
	fn missing_sections_default_to_empty() {
		let data = GraphData::from_json("{}").unwrap();
		assert!(data.nodes.is_empty() && data.links.is_empty());
	}

	#[test]
	fn page_maps_to_site_and_unknown_falls_back() {
		assert_eq!(Group::parse("Page"), Group::Site);
		assert_eq!(Group::parse("Meme"), Group::Unknown);
		assert_eq!(Group::parse("Meme").color(), "#8b949e");
		assert!(Group::Channel.is_primary());
		assert!(!Group::Post.is_primary());
		assert!(!Group::Unknown.is_primary());
	}

	#[test]
	fn snapshot_merge_ignores_other_nodes() {
		let mut snap = NodeSnapshot {
			id: "n1".into(),
			group: "Person".into(),
			name: "Old".into(),
			properties: Properties::new(),
		};
		let update = NodeUpdate {
			id: "n1".into(),
			properties: BTreeMap::from([("name".to_string(), "New".to_string())]),
		};
		snap.merge(&NodeUpdate {
			id: "n2".into(),
			..update.clone()
		});
		assert_eq!(snap.name, "Old");
		snap.merge(&update);
		assert_eq!(snap.name, "New");
		assert_eq!(snap.properties["name"], Value::from("New"));
	}

	#[test]
	fn update_serializes_as_id_and_properties() {
		let update = NodeUpdate {
			id: "n1".into(),
			properties: BTreeMap::from([("name".to_string(), "New".to_string())]),
		};
		assert_eq!(
			serde_json::to_string(&update).unwrap(),
			r#"{"id":"n1","properties":{"name":"New"}}"#
		);
	}
}
