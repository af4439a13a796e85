use std::f64::consts::FRAC_PI_2;
use std::f64::consts::PI;

use super::interaction::InteractionState;
use super::model::LinkKey;
use super::node_style::{TextMeasure, ViewParams};

pub const PARTICLE_COLOR: &str = "#58a6ff";
pub const PARTICLE_RADIUS: f64 = 1.5;
/// Fraction of the link a particle advances per frame.
pub const PARTICLE_SPEED: f64 = 0.005;
const LABEL_FONT_PX: f64 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkStyle {
	pub color: &'static str,
	pub width: f64,
	pub particles: u32,
}

pub fn style_link(key: LinkKey, state: &InteractionState) -> LinkStyle {
	if state.focus_active() {
		return if state.is_link_highlighted(key) {
			LinkStyle {
				color: "#58a6ff",
				width: 3.0,
				particles: 4,
			}
		} else {
			LinkStyle {
				color: "rgba(88, 166, 255, 0.05)",
				width: 0.5,
				particles: 0,
			}
		};
	}
	if state.hovered_link == Some(key) {
		LinkStyle {
			color: "#ffffff",
			width: 5.0,
			particles: 2,
		}
	} else {
		LinkStyle {
			color: "rgba(88, 166, 255, 0.4)",
			width: 2.0,
			particles: 2,
		}
	}
}

/// Relationship label drawn over the hovered link.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkLabel {
	pub text: String,
	pub x: f64,
	pub y: f64,
	pub angle: f64,
	pub font_px: f64,
	pub backing: (f64, f64),
}

pub fn link_label(
	text: &str,
	from: (f64, f64),
	to: (f64, f64),
	view: &ViewParams,
	measure: &dyn TextMeasure,
) -> LinkLabel {
	let font_px = view.font_px(LABEL_FONT_PX);
	let pad = font_px * 0.3;
	LinkLabel {
		text: text.to_owned(),
		x: from.0 + (to.0 - from.0) / 2.0,
		y: from.1 + (to.1 - from.1) / 2.0,
		angle: upright_angle(to.0 - from.0, to.1 - from.1),
		font_px,
		backing: (measure.text_width(text, font_px) + pad, font_px + pad),
	}
}

/// Direction of `(dx, dy)` folded into [-90°, 90°] so text never reads
/// upside down.
pub fn upright_angle(dx: f64, dy: f64) -> f64 {
	let angle = dy.atan2(dx);
	if angle > FRAC_PI_2 {
		angle - PI
	} else if angle < -FRAC_PI_2 {
		angle + PI
	} else {
		angle
	}
}

/// Offsets along the link, in `[0, 1)`, of `count` evenly spaced particles.
pub fn particle_offsets(count: u32, frame: u64) -> Vec<f64> {
	let phase = (frame as f64 * PARTICLE_SPEED).fract();
	(0..count)
		.map(|i| (phase + i as f64 / count as f64).fract())
		.collect()
}
