//! Pointer picking. Every frame, after drawing, each node and link is
//! filled into an off-screen canvas in a color that encodes its identity;
//! the pixel under the pointer then names what was hit.

use std::f64::consts::PI;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use super::model::{Footprint, LinkKey, NodeKey};
use super::viewport::ViewTransform;
use crate::error::GraphError;

/// Pick radius for glyph nodes, well above the drawn glyph radius.
pub const HIT_RADIUS: f64 = 12.0;
/// Extra stroke width around links when picking.
pub const LINK_HIT_PADDING: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitShape {
	Rect { x: f64, y: f64, width: f64, height: f64 },
	Circle { x: f64, y: f64, radius: f64 },
}

impl HitShape {
	pub fn contains(&self, px: f64, py: f64) -> bool {
		match *self {
			HitShape::Rect {
				x,
				y,
				width,
				height,
			} => px >= x && px <= x + width && py >= y && py <= y + height,
			HitShape::Circle { x, y, radius } => {
				let (dx, dy) = (px - x, py - y);
				dx * dx + dy * dy <= radius * radius
			}
		}
	}
}

/// Card footprints pick as their rectangle; everything else as a circle.
pub fn hit_shape(x: f64, y: f64, footprint: Option<Footprint>) -> HitShape {
	match footprint {
		Some(Footprint { width, height }) => HitShape::Rect {
			x: x - width / 2.0,
			y: y - height / 2.0,
			width,
			height,
		},
		None => HitShape::Circle {
			x,
			y,
			radius: HIT_RADIUS,
		},
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickTarget {
	Node(NodeKey),
	Link(LinkKey),
}

/// Low bits of a pick color reserved for a checksum of the identity bits.
const CHECKSUM_BITS: u32 = 6;
const CHECKSUM_MASK: u32 = (1 << CHECKSUM_BITS) - 1;
/// Identity bits left in a 24-bit color.
const ID_MASK: u32 = (1 << (24 - CHECKSUM_BITS)) - 1;

fn checksum(id: u32) -> u32 {
	id.wrapping_mul(0x9E37_79B1) >> (32 - CHECKSUM_BITS)
}

impl PickTarget {
	/// Non-zero identity: odd for nodes, even for links. Zero is background.
	fn id(self) -> u32 {
		let id = match self {
			PickTarget::Node(NodeKey(k)) => 2 * k as u32 + 1,
			PickTarget::Link(LinkKey(k)) => 2 * k as u32 + 2,
		};
		id & ID_MASK
	}

	pub fn color(self) -> String {
		let id = self.id();
		format!("#{:06x}", (id << CHECKSUM_BITS) | checksum(id))
	}

	/// Inverse of [`PickTarget::color`]. Colors whose checksum does not
	/// verify (blends where shapes meet) and keys outside the current graph
	/// decode to `None`.
	pub fn from_rgb(rgb: [u8; 3], nodes: usize, links: usize) -> Option<Self> {
		let code = u32::from_be_bytes([0, rgb[0], rgb[1], rgb[2]]);
		let id = code >> CHECKSUM_BITS;
		if id == 0 || code & CHECKSUM_MASK != checksum(id) {
			return None;
		}
		let target = if id % 2 == 1 {
			PickTarget::Node(NodeKey(((id - 1) / 2) as usize))
		} else {
			PickTarget::Link(LinkKey(((id - 2) / 2) as usize))
		};
		match target {
			PickTarget::Node(NodeKey(k)) if k < nodes => Some(target),
			PickTarget::Link(LinkKey(k)) if k < links => Some(target),
			_ => None,
		}
	}
}

/// Distance from `p` to the segment `a`-`b`.
pub fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 > 0.0 {
		(((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
	} else {
		0.0
	};
	(p.0 - (a.0 + t * dx)).hypot(p.1 - (a.1 + t * dy))
}

/// Stroke width a link is painted with in the pick buffer.
pub fn link_hit_width(drawn_width: f64) -> f64 {
	drawn_width + LINK_HIT_PADDING
}

/// Where pick shapes are painted.
pub trait PickSurface {
	fn fill_rect(&self, color: &str, x: f64, y: f64, width: f64, height: f64);
	fn fill_circle(&self, color: &str, x: f64, y: f64, radius: f64);
	fn stroke_line(&self, color: &str, from: (f64, f64), to: (f64, f64), width: f64);
}

pub fn paint_node_area(surface: &dyn PickSurface, key: NodeKey, shape: HitShape) {
	let color = PickTarget::Node(key).color();
	match shape {
		HitShape::Rect {
			x,
			y,
			width,
			height,
		} => surface.fill_rect(&color, x, y, width, height),
		HitShape::Circle { x, y, radius } => surface.fill_circle(&color, x, y, radius),
	}
}

pub fn paint_link_area(
	surface: &dyn PickSurface,
	key: LinkKey,
	from: (f64, f64),
	to: (f64, f64),
	width: f64,
) {
	let color = PickTarget::Link(key).color();
	surface.stroke_line(&color, from, to, link_hit_width(width));
}

/// Hidden canvas the size of the visible one, drawn with the same transform.
pub struct ShadowCanvas {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl ShadowCanvas {
	pub fn new(document: &Document) -> Result<Self, GraphError> {
		let canvas: HtmlCanvasElement = document
			.create_element("canvas")
			.map_err(GraphError::canvas)?
			.dyn_into()
			.map_err(|_| GraphError::Canvas("not a canvas element".into()))?;
		let ctx = canvas
			.get_context("2d")
			.map_err(GraphError::canvas)?
			.ok_or_else(|| GraphError::Canvas("2d context unavailable".into()))?
			.dyn_into::<CanvasRenderingContext2d>()
			.map_err(|_| GraphError::Canvas("unexpected context type".into()))?;
		Ok(Self { canvas, ctx })
	}

	pub fn resize(&self, width: u32, height: u32) {
		self.canvas.set_width(width);
		self.canvas.set_height(height);
	}

	/// Clear and apply the frame's view transform.
	pub fn begin_frame(&self, transform: &ViewTransform, device_scale: f64) {
		let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
		self.ctx.clear_rect(
			0.0,
			0.0,
			self.canvas.width() as f64,
			self.canvas.height() as f64,
		);
		let k = transform.k * device_scale;
		let _ = self.ctx.set_transform(
			k,
			0.0,
			0.0,
			k,
			transform.x * device_scale,
			transform.y * device_scale,
		);
	}

	/// Target under the CSS-pixel point `(sx, sy)`.
	pub fn pick(
		&self,
		sx: f64,
		sy: f64,
		device_scale: f64,
		nodes: usize,
		links: usize,
	) -> Option<PickTarget> {
		let (px, py) = ((sx * device_scale).floor(), (sy * device_scale).floor());
		let data = self.ctx.get_image_data(px, py, 1.0, 1.0).ok()?.data();
		// fully transparent pixels are background
		if data.get(3).copied().unwrap_or(0) < 255 {
			return None;
		}
		PickTarget::from_rgb([data[0], data[1], data[2]], nodes, links)
	}
}

impl PickSurface for ShadowCanvas {
	fn fill_rect(&self, color: &str, x: f64, y: f64, width: f64, height: f64) {
		self.ctx.set_fill_style_str(color);
		self.ctx.fill_rect(x, y, width, height);
	}

	fn fill_circle(&self, color: &str, x: f64, y: f64, radius: f64) {
		self.ctx.set_fill_style_str(color);
		self.ctx.begin_path();
		let _ = self.ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		self.ctx.fill();
	}

	fn stroke_line(&self, color: &str, from: (f64, f64), to: (f64, f64), width: f64) {
		self.ctx.set_stroke_style_str(color);
		self.ctx.set_line_width(width);
		self.ctx.begin_path();
		self.ctx.move_to(from.0, from.1);
		self.ctx.line_to(to.0, to.1);
		self.ctx.stroke();
	}
}
