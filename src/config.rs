//! Runtime configuration with defaults, overridable from an inline JSON block.

use force_graph::SimulationParameters;
use log::warn;
use serde::Deserialize;

/// Element id of the optional `<script type="application/json">` override.
pub const CONFIG_ELEMENT_ID: &str = "graph-config";

/// Top-level settings for the graph view.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
	/// Endpoint returning the graph payload.
	pub graph_url: String,
	/// Endpoint accepting `{id, properties}` updates.
	pub update_url: String,
	/// Force simulation tuning, applied once at startup.
	pub layout: LayoutConfig,
	/// Viewport transition played when a node is activated.
	pub focus: FocusConfig,
	/// Opacity of nodes outside the focused neighborhood.
	pub dim_opacity: f64,
	/// Where evidence images are looked up.
	pub images: ImageSources,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			graph_url: "/api/graph".into(),
			update_url: "/api/update_node".into(),
			layout: LayoutConfig::default(),
			focus: FocusConfig::default(),
			dim_opacity: 0.1,
			images: ImageSources::default(),
		}
	}
}

impl GraphConfig {
	/// Parse an override document; absent keys keep their defaults.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Read the inline override from the page, falling back to defaults.
	pub fn from_document() -> Self {
		let text = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
			.and_then(|el| el.text_content());
		match text {
			Some(text) => Self::from_json(&text).unwrap_or_else(|e| {
				warn!("ignoring malformed #{}: {}", CONFIG_ELEMENT_ID, e);
				Self::default()
			}),
			None => Self::default(),
		}
	}
}

/// Force parameters handed to the layout engine.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
	/// Node repulsion strength.
	pub charge: f32,
	/// Link spring stiffness; larger pulls linked nodes closer.
	pub spring: f32,
	pub max_force: f32,
	pub node_speed: f32,
	pub damping: f32,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			charge: 500.0,
			spring: 0.02,
			max_force: 100.0,
			node_speed: 3000.0,
			damping: 0.85,
		}
	}
}

impl LayoutConfig {
	pub fn simulation_parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.charge,
			force_spring: self.spring,
			force_max: self.max_force,
			node_speed: self.node_speed,
			damping_factor: self.damping,
		}
	}
}

/// Zoom target and durations of the focus transition.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FocusConfig {
	pub zoom: f64,
	pub center_ms: f64,
	pub zoom_ms: f64,
}

impl Default for FocusConfig {
	fn default() -> Self {
		Self {
			zoom: 6.0,
			center_ms: 1000.0,
			zoom_ms: 2000.0,
		}
	}
}

/// Image lookup rules. `mirrors` is the deployment-specific list of URL
/// prefixes tried in order for every source path.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageSources {
	/// Root that relative evidence paths are placed under.
	pub data_root: String,
	/// Relative prefix that marks a path as already inside the data root.
	pub data_prefix: String,
	/// Id prefix of nodes whose image can be derived from the id.
	pub symbol_prefix: String,
	/// Directory holding derived symbol images.
	pub symbol_dir: String,
	pub symbol_extensions: Vec<String>,
	/// Directory of Facebook post screenshots, one subdirectory per page.
	pub facebook_dir: String,
	pub mirrors: Vec<String>,
	/// Last-resort asset for derived symbol paths.
	pub placeholder: Option<String>,
}

impl Default for ImageSources {
	fn default() -> Self {
		Self {
			data_root: "/data/".into(),
			data_prefix: "data/".into(),
			symbol_prefix: "symbol-".into(),
			symbol_dir: "data/evidence/symbols".into(),
			symbol_extensions: vec!["png".into(), "jpg".into()],
			facebook_dir: "data/evidence/facebook".into(),
			mirrors: vec![String::new()],
			placeholder: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_override_is_default() {
		assert_eq!(GraphConfig::from_json("{}").unwrap(), GraphConfig::default());
	}

	#[test]
	fn partial_override_keeps_other_defaults() {
		let config = GraphConfig::from_json(
			r#"{"dim_opacity": 0.25, "focus": {"zoom": 4}, "images": {"mirrors": ["/static", ""]}}"#,
		)
		.unwrap();
		assert_eq!(config.dim_opacity, 0.25);
		assert_eq!(config.focus.zoom, 4.0);
		assert_eq!(config.focus.center_ms, 1000.0);
		assert_eq!(config.images.mirrors, vec!["/static".to_string(), String::new()]);
		assert_eq!(config.images.symbol_prefix, "symbol-");
		assert_eq!(config.graph_url, "/api/graph");
	}

	#[test]
	fn layout_maps_onto_simulation_parameters() {
		let params = LayoutConfig::default().simulation_parameters();
		assert_eq!(params.force_charge, 500.0);
		assert_eq!(params.damping_factor, 0.85);
	}
}
