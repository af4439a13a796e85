//! Selection and highlight state.
//!
//! Focus mode is signalled by the highlight sets being non-empty; there is
//! no separate flag. `SelectionController` is the only writer.

use std::collections::HashSet;
use std::rc::Rc;

use log::debug;

use super::model::{Graph, LinkKey, NodeKey};
use super::types::NodeSnapshot;
use crate::config::FocusConfig;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionState {
	pub selected: Option<NodeKey>,
	pub hovered_node: Option<NodeKey>,
	pub hovered_link: Option<LinkKey>,
	pub highlight_nodes: HashSet<NodeKey>,
	pub highlight_links: HashSet<LinkKey>,
}

impl InteractionState {
	pub fn focus_active(&self) -> bool {
		!self.highlight_nodes.is_empty()
	}

	pub fn is_node_highlighted(&self, key: NodeKey) -> bool {
		self.focus_active() && self.highlight_nodes.contains(&key)
	}

	pub fn is_link_highlighted(&self, key: LinkKey) -> bool {
		self.focus_active() && self.highlight_links.contains(&key)
	}
}

/// Receives the selection so an external panel can show it.
pub trait DetailSink {
	fn show(&self, snapshot: NodeSnapshot);
	fn clear(&self);
}

impl<T: DetailSink + ?Sized> DetailSink for Rc<T> {
	fn show(&self, snapshot: NodeSnapshot) {
		(**self).show(snapshot)
	}

	fn clear(&self) {
		(**self).clear()
	}
}

/// Viewport motion requested from the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewportCommand {
	CenterAt { x: f64, y: f64, duration_ms: f64 },
	Zoom { level: f64, duration_ms: f64 },
}

pub struct SelectionController {
	state: InteractionState,
	focus: FocusConfig,
}

impl SelectionController {
	pub fn new(focus: FocusConfig) -> Self {
		Self {
			state: InteractionState::default(),
			focus,
		}
	}

	pub fn state(&self) -> &InteractionState {
		&self.state
	}

	/// Enter (or re-enter) focus on `key`. The detail sink is updated before
	/// this returns. Unknown keys leave the state untouched.
	pub fn activate_node(
		&mut self,
		graph: &Graph,
		key: NodeKey,
		position: (f64, f64),
		details: &dyn DetailSink,
	) -> Vec<ViewportCommand> {
		let Some(node) = graph.node(key) else {
			return Vec::new();
		};

		self.state.selected = Some(key);
		self.state.highlight_nodes.clear();
		self.state.highlight_links.clear();
		self.state.highlight_nodes.insert(key);
		for link in graph.links() {
			if link.touches(key) {
				self.state.highlight_links.insert(link.key);
				self.state.highlight_nodes.insert(link.source);
				self.state.highlight_nodes.insert(link.target);
			}
		}
		debug!(
			"focused {} ({} neighbors, {} links)",
			node.id,
			self.state.highlight_nodes.len() - 1,
			self.state.highlight_links.len()
		);

		details.show(node.snapshot());

		vec![
			ViewportCommand::CenterAt {
				x: position.0,
				y: position.1,
				duration_ms: self.focus.center_ms,
			},
			ViewportCommand::Zoom {
				level: self.focus.zoom,
				duration_ms: self.focus.zoom_ms,
			},
		]
	}

	/// Click on empty canvas.
	pub fn activate_background(&mut self, details: &dyn DetailSink) {
		self.clear(details);
	}

	/// Escape input. Clears unconditionally.
	pub fn cancel(&mut self, details: &dyn DetailSink) {
		self.clear(details);
	}

	fn clear(&mut self, details: &dyn DetailSink) {
		if self.state.selected.is_some() {
			debug!("focus cleared");
		}
		self.state.selected = None;
		self.state.highlight_nodes.clear();
		self.state.highlight_links.clear();
		details.clear();
	}

	pub fn set_hovered_node(&mut self, key: Option<NodeKey>) {
		self.state.hovered_node = key;
	}

	pub fn set_hovered_link(&mut self, key: Option<LinkKey>) {
		self.state.hovered_link = key;
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use std::cell::RefCell;

	use super::*;
	use crate::components::force_graph::types::{GraphData, GraphLink, GraphNode};

	#[derive(Default)]
	pub(crate) struct RecordingSink {
		pub shown: RefCell<Vec<String>>,
		pub clears: RefCell<usize>,
	}

	impl DetailSink for RecordingSink {
		fn show(&self, snapshot: NodeSnapshot) {
			self.shown.borrow_mut().push(snapshot.id);
		}
		fn clear(&self) {
			*self.clears.borrow_mut() += 1;
		}
	}

	/// Nodes A, B, C with links A->B and B->C.
	pub(crate) fn chain() -> Graph {
		let node = |id: &str| GraphNode {
			id: id.into(),
			name: Some(id.into()),
			group: Some("Post".into()),
			properties: None,
		};
		let link = |s: &str, t: &str| GraphLink {
			source: s.into(),
			target: t.into(),
			kind: "LINKS".into(),
		};
		Graph::from_data(&GraphData {
			nodes: vec![node("A"), node("B"), node("C")],
			links: vec![link("A", "B"), link("B", "C")],
		})
	}

	const A: NodeKey = NodeKey(0);
	const B: NodeKey = NodeKey(1);
	const C: NodeKey = NodeKey(2);

	fn controller() -> SelectionController {
		SelectionController::new(FocusConfig::default())
	}

	#[test]
	fn activating_middle_node_highlights_whole_chain() {
		let graph = chain();
		let sink = RecordingSink::default();
		let mut sel = controller();
		sel.activate_node(&graph, B, (0.0, 0.0), &sink);

		let state = sel.state();
		assert_eq!(state.selected, Some(B));
		assert_eq!(state.highlight_nodes, HashSet::from([A, B, C]));
		assert_eq!(state.highlight_links, HashSet::from([LinkKey(0), LinkKey(1)]));
	}

	#[test]
	fn activating_end_node_highlights_one_hop_only() {
		let graph = chain();
		let sink = RecordingSink::default();
		let mut sel = controller();
		sel.activate_node(&graph, A, (0.0, 0.0), &sink);

		assert_eq!(sel.state().highlight_nodes, HashSet::from([A, B]));
		assert_eq!(sel.state().highlight_links, HashSet::from([LinkKey(0)]));
	}

	#[test]
	fn reactivation_replaces_sets_directly() {
		let graph = chain();
		let sink = RecordingSink::default();
		let mut sel = controller();
		sel.activate_node(&graph, B, (0.0, 0.0), &sink);
		sel.activate_node(&graph, C, (0.0, 0.0), &sink);

		assert_eq!(sel.state().selected, Some(C));
		assert_eq!(sel.state().highlight_nodes, HashSet::from([B, C]));
		assert_eq!(sel.state().highlight_links, HashSet::from([LinkKey(1)]));
		assert_eq!(*sink.clears.borrow(), 0);
	}

	#[test]
	fn activating_same_node_twice_is_idempotent() {
		let graph = chain();
		let sink = RecordingSink::default();
		let mut sel = controller();
		sel.activate_node(&graph, A, (0.0, 0.0), &sink);
		let once = sel.state().clone();
		sel.activate_node(&graph, A, (0.0, 0.0), &sink);
		assert_eq!(sel.state(), &once);
	}

	#[test]
	fn background_and_escape_clear_everything() {
		let graph = chain();
		let sink = RecordingSink::default();
		let mut sel = controller();

		sel.activate_node(&graph, B, (0.0, 0.0), &sink);
		sel.activate_background(&sink);
		assert_eq!(sel.state().selected, None);
		assert!(!sel.state().focus_active());
		assert!(sel.state().highlight_links.is_empty());

		sel.activate_node(&graph, C, (0.0, 0.0), &sink);
		sel.cancel(&sink);
		assert!(!sel.state().focus_active());

		// already idle
		sel.activate_background(&sink);
		assert!(!sel.state().focus_active());
		assert_eq!(*sink.clears.borrow(), 3);
	}

	#[test]
	fn activation_pushes_snapshot_and_requests_viewport() {
		let graph = chain();
		let sink = RecordingSink::default();
		let mut sel = controller();
		let commands = sel.activate_node(&graph, C, (12.0, -4.0), &sink);

		assert_eq!(*sink.shown.borrow(), vec!["C".to_string()]);
		assert_eq!(
			commands,
			vec![
				ViewportCommand::CenterAt {
					x: 12.0,
					y: -4.0,
					duration_ms: 1000.0
				},
				ViewportCommand::Zoom {
					level: 6.0,
					duration_ms: 2000.0
				},
			]
		);
	}

	#[test]
	fn unknown_node_is_ignored() {
		let graph = chain();
		let sink = RecordingSink::default();
		let mut sel = controller();
		assert!(sel.activate_node(&graph, NodeKey(9), (0.0, 0.0), &sink).is_empty());
		assert_eq!(sel.state(), &InteractionState::default());
	}

	#[test]
	fn hover_does_not_enter_focus() {
		let mut sel = controller();
		sel.set_hovered_node(Some(A));
		sel.set_hovered_link(Some(LinkKey(0)));
		assert!(!sel.state().focus_active());
		assert!(!sel.state().is_node_highlighted(A));
	}
}
