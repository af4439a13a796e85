use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};
use log::{debug, info};

use super::drag::DragController;
use super::hit::{
	PickSurface, PickTarget, hit_shape, link_hit_width, paint_link_area, paint_node_area,
	segment_distance,
};
use super::images::{Bitmap, ImageLoader, ImageResolver};
use super::interaction::{DetailSink, SelectionController};
use super::link_style::{LinkLabel, LinkStyle, link_label, particle_offsets, style_link};
use super::model::{Graph, LinkKey, NodeKey};
use super::node_style::{NodeDraw, TextMeasure, ViewParams, style_node};
use super::types::{GraphData, NodeUpdate};
use super::viewport::Viewport;
use crate::config::GraphConfig;

/// Presses that travel less than this many CSS pixels count as clicks.
pub const CLICK_TOLERANCE: f64 = 3.0;
const INITIAL_RADIUS: f64 = 100.0;

/// Per-node payload carried through the layout engine.
#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub key: NodeKey,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<NodeKey>,
	pub start_x: f64,
	pub start_y: f64,
	pub moved: bool,
	/// Node position minus the graph-space pointer at press time.
	grab: (f64, f64),
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	pub moved: bool,
	/// Press landed on a link; releasing it is not a background click.
	on_link: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkDraw {
	pub key: LinkKey,
	pub from: (f64, f64),
	pub to: (f64, f64),
	pub style: LinkStyle,
	pub particles: Vec<(f64, f64)>,
}

/// Everything drawn in one frame, in paint order. Hit areas are painted
/// from the same frame after it is drawn.
#[derive(Debug)]
pub struct Frame<I> {
	pub links: Vec<LinkDraw>,
	pub nodes: Vec<NodeDraw<I>>,
	pub label: Option<LinkLabel>,
}

impl<I> Frame<I> {
	/// Paint pick areas: links first so nodes cover them.
	pub fn paint_hit_areas(&self, surface: &dyn PickSurface) {
		for link in &self.links {
			paint_link_area(surface, link.key, link.from, link.to, link.style.width);
		}
		for node in &self.nodes {
			paint_node_area(surface, node.key, hit_shape(node.x, node.y, node.footprint));
		}
	}
}

pub struct ForceGraphState<L: ImageLoader> {
	pub graph: Graph,
	layout: ForceGraph<NodeInfo, ()>,
	positions: Vec<(f64, f64)>,
	pub selection: SelectionController,
	pub drag_controller: DragController,
	pub images: ImageResolver<L>,
	pub viewport: Viewport,
	pub drag: DragState,
	pub pan: PanState,
	details: Box<dyn DetailSink>,
	pub device_scale: f64,
	pub dim_opacity: f64,
	clock_ms: f64,
	frame: u64,
}

impl<L: ImageLoader> ForceGraphState<L> {
	pub fn new(
		data: &GraphData,
		config: &GraphConfig,
		loader: L,
		details: Box<dyn DetailSink>,
		width: f64,
		height: f64,
	) -> Self {
		let graph = Graph::from_data(data);
		let mut layout = ForceGraph::new(config.layout.simulation_parameters());
		let mut layout_idx: Vec<DefaultNodeIdx> = Vec::with_capacity(graph.nodes().len());
		let mut positions = Vec::with_capacity(graph.nodes().len());

		let count = graph.nodes().len().max(1) as f64;
		for (i, node) in graph.nodes().iter().enumerate() {
			let angle = (i as f64) * 2.0 * PI / count;
			let (x, y) = (INITIAL_RADIUS * angle.cos(), INITIAL_RADIUS * angle.sin());
			layout_idx.push(layout.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: NodeInfo { key: node.key },
			}));
			positions.push((x, y));
		}
		for link in graph.links() {
			layout.add_edge(
				layout_idx[link.source.0],
				layout_idx[link.target.0],
				EdgeData::default(),
			);
		}
		info!(
			"graph ready: {} nodes, {} links",
			graph.nodes().len(),
			graph.links().len()
		);

		Self {
			graph,
			layout,
			positions,
			selection: SelectionController::new(config.focus.clone()),
			drag_controller: DragController::default(),
			images: ImageResolver::new(loader, config.images.clone()),
			viewport: Viewport::new(width, height),
			drag: DragState::default(),
			pan: PanState::default(),
			details,
			device_scale: 1.0,
			dim_opacity: config.dim_opacity,
			clock_ms: 0.0,
			frame: 0,
		}
	}

	pub fn position(&self, key: NodeKey) -> (f64, f64) {
		self.positions.get(key.0).copied().unwrap_or_default()
	}

	pub fn view_params(&self) -> ViewParams {
		ViewParams {
			zoom: self.viewport.transform.k,
			device_scale: self.device_scale,
			dim_opacity: self.dim_opacity,
		}
	}

	/// Advance the simulation. Pinned nodes are held at their pins before
	/// and after the step.
	pub fn tick(&mut self, dt: f32) {
		self.apply_pins();
		self.layout.update(dt);
		self.apply_pins();
		self.sync_positions();
		self.clock_ms += dt as f64 * 1000.0;
		self.frame += 1;
		self.viewport.advance(self.clock_ms);
	}

	fn apply_pins(&mut self) {
		let nodes = self.graph.nodes();
		self.layout.visit_nodes_mut(|node| {
			let pin = nodes.get(node.data.user_data.key.0).and_then(|n| n.pin);
			match pin {
				Some(pin) => {
					node.data.x = pin.fx as f32;
					node.data.y = pin.fy as f32;
					node.data.is_anchor = true;
				}
				None => node.data.is_anchor = false,
			}
		});
	}

	fn sync_positions(&mut self) {
		let positions = &mut self.positions;
		self.layout.visit_nodes(|node| {
			if let Some(slot) = positions.get_mut(node.data.user_data.key.0) {
				*slot = (node.x() as f64, node.y() as f64);
			}
		});
	}

	/// Style every link and node for this frame and record each node's
	/// footprint.
	pub fn build_frame(&mut self, measure: &dyn TextMeasure) -> Frame<L::Image>
	where
		L::Image: Bitmap,
	{
		let view = self.view_params();
		let state = self.selection.state();

		let links = self
			.graph
			.links()
			.iter()
			.map(|link| {
				let (from, to) = (self.position(link.source), self.position(link.target));
				let style = style_link(link.key, state);
				let particles = particle_offsets(style.particles, self.frame)
					.into_iter()
					.map(|t| (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t))
					.collect();
				LinkDraw {
					key: link.key,
					from,
					to,
					style,
					particles,
				}
			})
			.collect();

		let label = state
			.hovered_link
			.and_then(|key| self.graph.link(key))
			.map(|link| {
				link_label(
					&link.kind,
					self.position(link.source),
					self.position(link.target),
					&view,
					measure,
				)
			});

		let mut nodes = Vec::with_capacity(self.graph.nodes().len());
		for node in self.graph.nodes_mut() {
			let position = self.positions.get(node.key.0).copied().unwrap_or_default();
			let draw = style_node(node, position, state, &view, measure, &mut self.images);
			node.footprint = draw.footprint;
			nodes.push(draw);
		}

		Frame {
			links,
			nodes,
			label,
		}
	}

	/// Keep a decoded pick only if the target's last painted area covers the
	/// CSS-pixel point. Edge pixels blended from two shapes can still carry
	/// a valid code.
	pub fn confirm_pick(&self, sx: f64, sy: f64, target: Option<PickTarget>) -> Option<PickTarget> {
		let target = target?;
		let point = self.viewport.transform.screen_to_graph(sx, sy);
		let covered = match target {
			PickTarget::Node(key) => {
				let node = self.graph.node(key)?;
				let (x, y) = self.position(key);
				hit_shape(x, y, node.footprint).contains(point.0, point.1)
			}
			PickTarget::Link(key) => {
				let link = self.graph.link(key)?;
				let width = link_hit_width(style_link(key, self.selection.state()).width);
				segment_distance(point, self.position(link.source), self.position(link.target))
					<= width / 2.0
			}
		};
		covered.then_some(target)
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64, target: Option<PickTarget>) {
		if let Some(PickTarget::Node(key)) = target {
			let (gx, gy) = self.viewport.transform.screen_to_graph(sx, sy);
			let (nx, ny) = self.position(key);
			self.drag = DragState {
				node: Some(key),
				start_x: sx,
				start_y: sy,
				moved: false,
				grab: (nx - gx, ny - gy),
			};
		} else {
			self.pan = PanState {
				active: true,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.viewport.transform.x,
				transform_start_y: self.viewport.transform.y,
				moved: false,
				on_link: matches!(target, Some(PickTarget::Link(_))),
			};
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64, target: Option<PickTarget>) {
		if let Some(key) = self.drag.node {
			if !self.drag.moved && !beyond_tolerance(self.drag.start_x, self.drag.start_y, sx, sy) {
				return;
			}
			self.drag.moved = true;
			let (gx, gy) = self.viewport.transform.screen_to_graph(sx, sy);
			let pointer = (gx + self.drag.grab.0, gy + self.drag.grab.1);
			let current = self.position(key);
			if let Some(node) = self.graph.node_mut(key) {
				self.drag_controller.drag(node, current, pointer);
			}
		} else if self.pan.active {
			if !self.pan.moved && !beyond_tolerance(self.pan.start_x, self.pan.start_y, sx, sy) {
				return;
			}
			self.pan.moved = true;
			self.viewport.pan_to(
				self.pan.transform_start_x + (sx - self.pan.start_x),
				self.pan.transform_start_y + (sy - self.pan.start_y),
			);
		} else {
			let (node, link) = match target {
				Some(PickTarget::Node(key)) => (Some(key), None),
				Some(PickTarget::Link(key)) => (None, Some(key)),
				None => (None, None),
			};
			self.selection.set_hovered_node(node);
			self.selection.set_hovered_link(link);
		}
	}

	pub fn pointer_up(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		let pan = std::mem::take(&mut self.pan);
		match drag.node {
			Some(key) if drag.moved => self.end_drag(key),
			Some(key) => self.click_node(key),
			None if pan.active && !pan.moved && !pan.on_link => self.click_background(),
			None => {}
		}
	}

	/// Pointer left the canvas: finish any gesture without clicking.
	pub fn pointer_leave(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		self.pan = PanState::default();
		if let Some(key) = drag.node {
			self.end_drag(key);
		}
		self.selection.set_hovered_node(None);
		self.selection.set_hovered_link(None);
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.viewport.zoom_around(sx, sy, factor);
	}

	fn end_drag(&mut self, key: NodeKey) {
		if let Some(node) = self.graph.node_mut(key) {
			self.drag_controller.end(node);
		}
	}

	pub fn click_node(&mut self, key: NodeKey) {
		let position = self.position(key);
		let commands =
			self.selection
				.activate_node(&self.graph, key, position, self.details.as_ref());
		for command in commands {
			self.viewport.apply(command, self.clock_ms);
		}
	}

	pub fn click_background(&mut self) {
		self.selection.activate_background(self.details.as_ref());
	}

	pub fn escape(&mut self) {
		self.selection.cancel(self.details.as_ref());
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
	}

	/// Merge a saved edit into the in-memory node. Returns false for unknown ids.
	pub fn apply_update(&mut self, update: &NodeUpdate) -> bool {
		let Some(node) = self
			.graph
			.key_of(&update.id)
			.and_then(|key| self.graph.node_mut(key))
		else {
			return false;
		};
		node.apply_properties(&update.properties);
		debug!("applied edit to {}", update.id);
		true
	}
}

fn beyond_tolerance(x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
	(x1 - x0).hypot(y1 - y0) >= CLICK_TOLERANCE
}

#[cfg(test)]
mod tests {
	use std::collections::{BTreeMap, HashSet};
	use std::rc::Rc;

	use super::*;
	use crate::components::force_graph::hit::tests::ShapeBuffer;
	use crate::components::force_graph::images::tests::ManualLoader;
	use crate::components::force_graph::interaction::tests::RecordingSink;
	use crate::components::force_graph::model::Pin;
	use crate::components::force_graph::node_style::NodeForm;
	use crate::components::force_graph::node_style::tests::HalfEm;
	use crate::components::force_graph::types::{GraphLink, GraphNode};

	const A: NodeKey = NodeKey(0);
	const B: NodeKey = NodeKey(1);
	const C: NodeKey = NodeKey(2);

	fn data() -> GraphData {
		let node = |id: &str, group: &str| GraphNode {
			id: id.into(),
			name: Some(id.into()),
			group: Some(group.into()),
			properties: None,
		};
		let link = |s: &str, t: &str| GraphLink {
			source: s.into(),
			target: t.into(),
			kind: "LINKS".into(),
		};
		GraphData {
			nodes: vec![node("A", "Post"), node("B", "Person"), node("C", "Post")],
			links: vec![link("A", "B"), link("B", "C")],
		}
	}

	fn state() -> (ForceGraphState<ManualLoader>, Rc<RecordingSink>) {
		let sink = Rc::new(RecordingSink::default());
		let state = ForceGraphState::new(
			&data(),
			&GraphConfig::default(),
			ManualLoader::default(),
			Box::new(sink.clone()),
			800.0,
			600.0,
		);
		(state, sink)
	}

	fn screen_of(state: &ForceGraphState<ManualLoader>, key: NodeKey) -> (f64, f64) {
		let (x, y) = state.position(key);
		let t = state.viewport.transform;
		(x * t.k + t.x, y * t.k + t.y)
	}

	#[test]
	fn click_on_node_focuses_and_animates_viewport() {
		let (mut s, sink) = state();
		let (sx, sy) = screen_of(&s, C);
		s.pointer_down(sx, sy, Some(PickTarget::Node(C)));
		s.pointer_up();

		assert_eq!(s.selection.state().selected, Some(C));
		assert_eq!(s.selection.state().highlight_nodes, HashSet::from([B, C]));
		assert_eq!(*sink.shown.borrow(), vec!["C".to_string()]);
		assert!(s.viewport.is_animating());

		for _ in 0..200 {
			s.tick(0.016);
		}
		assert!((s.viewport.transform.k - 6.0).abs() < 1e-9);
	}

	#[test]
	fn background_click_clears_but_link_click_does_not() {
		let (mut s, sink) = state();
		s.click_node(B);

		s.pointer_down(5.0, 5.0, Some(PickTarget::Link(LinkKey(0))));
		s.pointer_up();
		assert_eq!(s.selection.state().selected, Some(B));

		s.pointer_down(5.0, 5.0, None);
		s.pointer_up();
		assert_eq!(s.selection.state().selected, None);
		assert!(!s.selection.state().focus_active());
		assert_eq!(*sink.clears.borrow(), 1);
	}

	#[test]
	fn background_drag_pans_instead_of_clearing() {
		let (mut s, _) = state();
		s.click_node(B);
		let before = s.viewport.transform;
		s.pointer_down(100.0, 100.0, None);
		s.pointer_move(140.0, 120.0, None);
		s.pointer_up();
		assert_eq!(s.selection.state().selected, Some(B));
		assert_eq!(s.viewport.transform.x, before.x + 40.0);
		assert_eq!(s.viewport.transform.y, before.y + 20.0);
	}

	#[test]
	fn escape_clears_focus() {
		let (mut s, _) = state();
		s.click_node(A);
		s.escape();
		assert_eq!(s.selection.state().selected, None);
		assert!(s.selection.state().highlight_links.is_empty());
	}

	#[test]
	fn drag_pins_node_to_pointer_then_releases() {
		let (mut s, _) = state();
		let start = s.position(A);
		let (sx, sy) = screen_of(&s, A);

		s.pointer_down(sx, sy, Some(PickTarget::Node(A)));
		s.pointer_move(sx + 20.0, sy + 10.0, None);
		let first = s.graph.node(A).unwrap().pin.unwrap();
		assert!((first.fx - start.0).abs() < 1e-6 && (first.fy - start.1).abs() < 1e-6);

		s.pointer_move(sx + 30.5, sy + 12.0, None);
		let pin = s.graph.node(A).unwrap().pin.unwrap();
		assert!((pin.fx - (start.0 + 30.5)).abs() < 1e-4);
		assert!((pin.fy - (start.1 + 12.0)).abs() < 1e-4);

		s.tick(0.016);
		let held = s.position(A);
		assert!((held.0 - pin.fx).abs() < 1e-4 && (held.1 - pin.fy).abs() < 1e-4);

		s.pointer_up();
		assert_eq!(s.graph.node(A).unwrap().pin, None);
		assert_eq!(s.selection.state().selected, None, "a drag is not a click");
		assert!(s.graph.nodes().iter().all(|n| n.pin.is_none()));
	}

	#[test]
	fn small_jitter_still_counts_as_click() {
		let (mut s, _) = state();
		let (sx, sy) = screen_of(&s, B);
		s.pointer_down(sx, sy, Some(PickTarget::Node(B)));
		s.pointer_move(sx + 1.0, sy + 1.0, None);
		s.pointer_up();
		assert_eq!(s.graph.node(B).unwrap().pin, None);
		assert_eq!(s.selection.state().selected, Some(B));
	}

	#[test]
	fn leaving_mid_drag_releases_the_pin() {
		let (mut s, _) = state();
		let (sx, sy) = screen_of(&s, C);
		s.pointer_down(sx, sy, Some(PickTarget::Node(C)));
		s.pointer_move(sx + 10.0, sy, None);
		s.graph.node_mut(C).unwrap().pin = Some(Pin { fx: 1.0, fy: 1.0 });
		s.pointer_leave();
		assert_eq!(s.graph.node(C).unwrap().pin, None);
	}

	#[test]
	fn footprints_follow_the_current_frame() {
		let (mut s, _) = state();
		s.tick(0.016);

		s.pointer_move(0.0, 0.0, Some(PickTarget::Node(A)));
		let frame = s.build_frame(&HalfEm);
		assert_eq!(frame.nodes[0].form(), NodeForm::Card);
		assert!(s.graph.node(A).unwrap().footprint.is_some());
		// B is a Person: always a card
		assert!(s.graph.node(B).unwrap().footprint.is_some());
		assert!(s.graph.node(C).unwrap().footprint.is_none());

		s.pointer_move(0.0, 0.0, None);
		s.build_frame(&HalfEm);
		assert!(s.graph.node(A).unwrap().footprint.is_none());
	}

	#[test]
	fn hit_shapes_come_from_the_drawn_frame() {
		let (mut s, _) = state();
		s.tick(0.016);
		let frame = s.build_frame(&HalfEm);
		for draw in &frame.nodes {
			let shape = hit_shape(draw.x, draw.y, draw.footprint);
			assert!(shape.contains(draw.x, draw.y));
			assert_eq!(draw.footprint, s.graph.node(draw.key).unwrap().footprint);
		}
	}

	#[test]
	fn hovered_link_gets_a_label_and_particles() {
		let (mut s, _) = state();
		s.tick(0.016);
		s.pointer_move(0.0, 0.0, Some(PickTarget::Link(LinkKey(1))));
		let frame = s.build_frame(&HalfEm);
		assert_eq!(frame.label.as_ref().map(|l| l.text.as_str()), Some("LINKS"));
		assert_eq!(frame.links[1].style.width, 5.0);
		assert_eq!(frame.links[0].particles.len(), 2);
	}

	#[test]
	fn focus_frame_dims_outside_nodes_and_links() {
		let mut data = data();
		data.nodes.push(GraphNode {
			id: "D".into(),
			name: None,
			group: None,
			properties: None,
		});
		let mut s = ForceGraphState::new(
			&data,
			&GraphConfig::default(),
			ManualLoader::default(),
			Box::new(Rc::new(RecordingSink::default())),
			800.0,
			600.0,
		);
		s.click_node(A);
		let frame = s.build_frame(&HalfEm);
		let alphas: Vec<f64> = frame.nodes.iter().map(|n| n.alpha).collect();
		assert_eq!(alphas, vec![1.0, 1.0, 0.1, 0.1]);
		assert_eq!(frame.links[0].style.particles, 4);
		assert_eq!(frame.links[1].style.particles, 0);
	}

	#[test]
	fn saved_edits_update_the_node() {
		let (mut s, _) = state();
		let update = NodeUpdate {
			id: "B".into(),
			properties: BTreeMap::from([("name".to_string(), "Bee".to_string())]),
		};
		assert!(s.apply_update(&update));
		assert_eq!(s.graph.node(B).unwrap().name, "Bee");
		assert!(!s.apply_update(&NodeUpdate {
			id: "missing".into(),
			properties: BTreeMap::new(),
		}));
	}

	#[test]
	fn frame_pick_areas_put_nodes_over_links() {
		let (mut s, _) = state();
		let frame = s.build_frame(&HalfEm);
		let buffer = ShapeBuffer::default();
		frame.paint_hit_areas(&buffer);
		let (n, l) = (s.graph.nodes().len(), s.graph.links().len());

		let (a, b) = (s.position(A), s.position(B));
		assert_eq!(buffer.pick(a.0, a.1, n, l), Some(PickTarget::Node(A)));
		let mid = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
		let picked = buffer.pick(mid.0, mid.1, n, l);
		assert_eq!(picked, Some(PickTarget::Link(LinkKey(0))));

		let t = s.viewport.transform;
		let (sx, sy) = (mid.0 * t.k + t.x, mid.1 * t.k + t.y);
		assert_eq!(s.confirm_pick(sx, sy, picked), picked);
	}

	#[test]
	fn picks_outside_the_target_area_are_dropped() {
		let (mut s, _) = state();
		s.build_frame(&HalfEm);
		let (sx, sy) = screen_of(&s, C);
		assert_eq!(
			s.confirm_pick(sx, sy, Some(PickTarget::Node(C))),
			Some(PickTarget::Node(C))
		);
		// C is a glyph: its pick circle ends at the hit radius
		assert_eq!(s.confirm_pick(sx + 40.0, sy, Some(PickTarget::Node(C))), None);
		assert_eq!(s.confirm_pick(sx, sy, None), None);

		let far = screen_of(&s, A);
		assert_eq!(
			s.confirm_pick(far.0 + 500.0, far.1 + 500.0, Some(PickTarget::Link(LinkKey(1)))),
			None
		);
	}
}
