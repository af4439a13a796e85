//! Per-frame node treatment: a labelled card for primary or focused nodes,
//! a small glowing dot for everything else.

use std::rc::Rc;

use super::images::{Bitmap, ImageEntry, ImageLoader, ImageResolver};
use super::interaction::InteractionState;
use super::model::{Footprint, Node, NodeKey};

pub const BASE_FONT_PX: f64 = 10.0;
pub const GLYPH_RADIUS: f64 = 2.0;
pub const IMAGE_MAX_PX: f64 = 60.0;
const IMAGE_GAP_PX: f64 = 5.0;

pub const CARD_FILL: &str = "rgba(22, 27, 34, 0.9)";
pub const CARD_TEXT: &str = "#c9d1d9";
const SELECTED_ACCENT: &str = "#ffffff";

/// Zoom and device pixel ratio of the frame being drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewParams {
	pub zoom: f64,
	pub device_scale: f64,
	pub dim_opacity: f64,
}

impl ViewParams {
	pub fn global_scale(&self) -> f64 {
		(self.zoom * self.device_scale).max(f64::EPSILON)
	}

	/// Text grows with zoom, but only by its square root.
	pub fn font_px(&self, base: f64) -> f64 {
		base / self.global_scale().sqrt()
	}
}

pub trait TextMeasure {
	fn text_width(&self, text: &str, font_px: f64) -> f64;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeForm {
	Card,
	Glyph,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeFlags {
	pub primary: bool,
	pub selected: bool,
	pub hovered: bool,
	pub highlighted: bool,
}

impl NodeFlags {
	pub fn of(node: &Node, state: &InteractionState) -> Self {
		Self {
			primary: node.group.is_primary(),
			selected: state.selected == Some(node.key),
			hovered: state.hovered_node == Some(node.key),
			highlighted: state.is_node_highlighted(node.key),
		}
	}

	pub fn form(&self) -> NodeForm {
		if self.primary || self.selected || self.hovered || self.highlighted {
			NodeForm::Card
		} else {
			NodeForm::Glyph
		}
	}

	/// Interaction states that reveal the node's image under its card.
	fn shows_image(&self) -> bool {
		self.hovered || self.selected || self.highlighted
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glow {
	pub color: &'static str,
	pub blur: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeShape {
	Card {
		label: String,
		font_px: f64,
		width: f64,
		height: f64,
		corner_radius: f64,
		border_width: f64,
		border_color: &'static str,
		glow: Glow,
	},
	Glyph {
		radius: f64,
		color: &'static str,
		glow: Glow,
	},
}

#[derive(Debug)]
pub enum NodeImage<I> {
	Bitmap {
		entry: Rc<ImageEntry<I>>,
		x: f64,
		y: f64,
		width: f64,
		height: f64,
	},
	/// Every candidate failed; an error box stands in for the image.
	Missing { x: f64, y: f64, size: f64 },
}

#[derive(Debug)]
pub struct NodeDraw<I> {
	pub key: NodeKey,
	pub x: f64,
	pub y: f64,
	pub alpha: f64,
	pub shape: NodeShape,
	pub image: Option<NodeImage<I>>,
	pub footprint: Option<Footprint>,
}

impl<I> NodeDraw<I> {
	#[cfg(test)]
	pub fn form(&self) -> NodeForm {
		match self.shape {
			NodeShape::Card { .. } => NodeForm::Card,
			NodeShape::Glyph { .. } => NodeForm::Glyph,
		}
	}
}

pub fn node_alpha(key: NodeKey, state: &InteractionState, view: &ViewParams) -> f64 {
	if state.focus_active() && !state.highlight_nodes.contains(&key) {
		view.dim_opacity
	} else {
		1.0
	}
}

pub fn style_node<L>(
	node: &Node,
	position: (f64, f64),
	state: &InteractionState,
	view: &ViewParams,
	text: &dyn TextMeasure,
	images: &mut ImageResolver<L>,
) -> NodeDraw<L::Image>
where
	L: ImageLoader,
	L::Image: Bitmap,
{
	let (x, y) = position;
	let flags = NodeFlags::of(node, state);
	let alpha = node_alpha(node.key, state, view);
	let color = node.group.color();
	let scale = view.global_scale();

	if flags.form() == NodeForm::Glyph {
		return NodeDraw {
			key: node.key,
			x,
			y,
			alpha,
			shape: NodeShape::Glyph {
				radius: GLYPH_RADIUS,
				color,
				glow: Glow { color, blur: 6.0 },
			},
			image: None,
			footprint: None,
		};
	}

	let font_px = view.font_px(BASE_FONT_PX);
	let width = text.text_width(&node.name, font_px) + font_px;
	let height = font_px * 1.4;
	let (border_color, glow) = if flags.selected {
		(
			SELECTED_ACCENT,
			Glow {
				color: SELECTED_ACCENT,
				blur: 15.0,
			},
		)
	} else {
		(color, Glow { color, blur: 5.0 })
	};

	let image = if flags.shows_image() && images.has_source(node) {
		images.resolve(node).and_then(|entry| {
			let max = IMAGE_MAX_PX / scale;
			let top = y + height / 2.0 + IMAGE_GAP_PX / scale;
			if entry.failed() {
				let size = max / 2.0;
				return Some(NodeImage::Missing {
					x: x - size / 2.0,
					y: top,
					size,
				});
			}
			let (w, h) = entry.with_image(|img| fit_within(img.natural_size(), max))??;
			Some(NodeImage::Bitmap {
				entry,
				x: x - w / 2.0,
				y: top,
				width: w,
				height: h,
			})
		})
	} else {
		None
	};

	NodeDraw {
		key: node.key,
		x,
		y,
		alpha,
		shape: NodeShape::Card {
			label: node.name.clone(),
			font_px,
			width,
			height,
			corner_radius: 2.0 / scale,
			border_width: 1.0 / scale,
			border_color,
			glow,
		},
		image,
		footprint: Some(Footprint { width, height }),
	}
}

/// Scale `(w, h)` so its longer side is `max`, keeping the aspect ratio.
fn fit_within((w, h): (f64, f64), max: f64) -> Option<(f64, f64)> {
	if w <= 0.0 || h <= 0.0 {
		return None;
	}
	let aspect = w / h;
	Some(if aspect > 1.0 {
		(max, max / aspect)
	} else {
		(max * aspect, max)
	})
}
