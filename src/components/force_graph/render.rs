use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::hit::ShadowCanvas;
use super::link_style::{LinkLabel, PARTICLE_COLOR, PARTICLE_RADIUS};
use super::node_style::{CARD_FILL, CARD_TEXT, NodeDraw, NodeImage, NodeShape, TextMeasure};
use super::state::{Frame, LinkDraw};
use super::viewport::Viewport;

const BACKGROUND: &str = "#0d1117";
const MISSING_IMAGE: &str = "#ff6b6b";

fn card_font(px: f64) -> String {
	format!("{}px 'Segoe UI', Sans-Serif", px)
}

/// Measures with the visible context's font engine.
pub struct CanvasText<'a>(pub &'a CanvasRenderingContext2d);

impl TextMeasure for CanvasText<'_> {
	fn text_width(&self, text: &str, font_px: f64) -> f64 {
		self.0.set_font(&card_font(font_px));
		self.0
			.measure_text(text)
			.map(|m| m.width())
			.unwrap_or(text.chars().count() as f64 * font_px * 0.6)
	}
}

pub fn render(
	frame: &Frame<HtmlImageElement>,
	viewport: &Viewport,
	device_scale: f64,
	ctx: &CanvasRenderingContext2d,
) {
	let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(
		0.0,
		0.0,
		viewport.width * device_scale,
		viewport.height * device_scale,
	);

	let t = viewport.transform;
	let k = t.k * device_scale;
	let _ = ctx.set_transform(k, 0.0, 0.0, k, t.x * device_scale, t.y * device_scale);
	for link in &frame.links {
		draw_link(link, ctx);
	}
	if let Some(label) = &frame.label {
		draw_link_label(label, ctx);
	}
	for node in &frame.nodes {
		draw_node(node, ctx);
	}
}

/// Repaint the pick buffer from the frame just drawn.
pub fn paint_hit_areas(
	frame: &Frame<HtmlImageElement>,
	viewport: &Viewport,
	device_scale: f64,
	shadow: &ShadowCanvas,
) {
	shadow.begin_frame(&viewport.transform, device_scale);
	frame.paint_hit_areas(shadow);
}

fn draw_link(link: &LinkDraw, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(link.style.color);
	ctx.set_line_width(link.style.width);
	ctx.begin_path();
	ctx.move_to(link.from.0, link.from.1);
	ctx.line_to(link.to.0, link.to.1);
	ctx.stroke();

	if link.particles.is_empty() {
		return;
	}
	ctx.set_fill_style_str(PARTICLE_COLOR);
	for &(x, y) in &link.particles {
		ctx.begin_path();
		let _ = ctx.arc(x, y, PARTICLE_RADIUS, 0.0, 2.0 * PI);
		ctx.fill();
	}
}

fn draw_link_label(label: &LinkLabel, ctx: &CanvasRenderingContext2d) {
	ctx.save();
	let _ = ctx.translate(label.x, label.y);
	let _ = ctx.rotate(label.angle);
	let (w, h) = label.backing;
	ctx.set_fill_style_str("rgba(0, 0, 0, 0.8)");
	ctx.fill_rect(-w / 2.0, -h / 2.0, w, h);
	ctx.set_font(&format!("{}px Sans-Serif", label.font_px));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str("#fff");
	let _ = ctx.fill_text(&label.text, 0.0, 0.0);
	ctx.restore();
}

fn draw_node(node: &NodeDraw<HtmlImageElement>, ctx: &CanvasRenderingContext2d) {
	ctx.set_global_alpha(node.alpha);
	let (x, y) = (node.x, node.y);

	match &node.shape {
		NodeShape::Card {
			label,
			font_px,
			width,
			height,
			corner_radius,
			border_width,
			border_color,
			glow,
		} => {
			ctx.set_fill_style_str(CARD_FILL);
			ctx.set_stroke_style_str(border_color);
			ctx.set_line_width(*border_width);
			ctx.set_shadow_color(glow.color);
			ctx.set_shadow_blur(glow.blur);
			rounded_rect(
				ctx,
				x - width / 2.0,
				y - height / 2.0,
				*width,
				*height,
				*corner_radius,
			);
			ctx.fill();
			ctx.stroke();
			ctx.set_shadow_blur(0.0);

			ctx.set_font(&card_font(*font_px));
			ctx.set_text_align("center");
			ctx.set_text_baseline("middle");
			ctx.set_fill_style_str(CARD_TEXT);
			let _ = ctx.fill_text(label, x, y);
		}
		NodeShape::Glyph {
			radius,
			color,
			glow,
		} => {
			ctx.set_shadow_color(glow.color);
			ctx.set_shadow_blur(glow.blur);
			ctx.begin_path();
			let _ = ctx.arc(x, y, *radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(color);
			ctx.fill();
			ctx.set_shadow_blur(0.0);
		}
	}

	match &node.image {
		Some(NodeImage::Bitmap {
			entry,
			x,
			y,
			width,
			height,
		}) => {
			entry.with_image(|img| {
				let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
					img, *x, *y, *width, *height,
				);
			});
		}
		Some(NodeImage::Missing { x, y, size }) => draw_missing(ctx, *x, *y, *size),
		None => {}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_missing(ctx: &CanvasRenderingContext2d, x: f64, y: f64, size: f64) {
	let dash = size / 10.0;
	ctx.set_stroke_style_str(MISSING_IMAGE);
	ctx.set_line_width(size / 30.0);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(dash),
		&JsValue::from_f64(dash),
	));
	ctx.stroke_rect(x, y, size, size);
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	let inset = size * 0.3;
	ctx.begin_path();
	ctx.move_to(x + inset, y + inset);
	ctx.line_to(x + size - inset, y + size - inset);
	ctx.move_to(x + size - inset, y + inset);
	ctx.line_to(x + inset, y + size - inset);
	ctx.stroke();
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}
