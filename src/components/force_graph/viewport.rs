//! Pan/zoom transform and the animated `center_at` / `zoom_to` commands.

use super::interaction::ViewportCommand;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

/// Screen = graph * k + (x, y), in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Tween {
	from: f64,
	to: f64,
	start_ms: f64,
	duration_ms: f64,
}

impl Tween {
	fn sample(&self, now_ms: f64) -> (f64, bool) {
		if self.duration_ms <= 0.0 {
			return (self.to, true);
		}
		let t = ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0);
		(
			self.from + (self.to - self.from) * ease_out_cubic(t),
			t >= 1.0,
		)
	}
}

#[derive(Clone, Debug)]
pub struct Viewport {
	pub transform: ViewTransform,
	pub width: f64,
	pub height: f64,
	center: Option<(Tween, Tween)>,
	zoom: Option<Tween>,
}

impl Viewport {
	/// Origin of graph space at the middle of the canvas.
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			width,
			height,
			center: None,
			zoom: None,
		}
	}

	/// Graph point currently at the middle of the canvas.
	pub fn center(&self) -> (f64, f64) {
		self.transform
			.screen_to_graph(self.width / 2.0, self.height / 2.0)
	}

	pub fn is_animating(&self) -> bool {
		self.center.is_some() || self.zoom.is_some()
	}

	pub fn apply(&mut self, command: ViewportCommand, now_ms: f64) {
		match command {
			ViewportCommand::CenterAt { x, y, duration_ms } => {
				self.center_at(x, y, duration_ms, now_ms)
			}
			ViewportCommand::Zoom { level, duration_ms } => self.zoom_to(level, duration_ms, now_ms),
		}
	}

	pub fn center_at(&mut self, x: f64, y: f64, duration_ms: f64, now_ms: f64) {
		let (cx, cy) = self.center();
		self.center = Some((
			Tween {
				from: cx,
				to: x,
				start_ms: now_ms,
				duration_ms,
			},
			Tween {
				from: cy,
				to: y,
				start_ms: now_ms,
				duration_ms,
			},
		));
		self.advance(now_ms);
	}

	pub fn zoom_to(&mut self, level: f64, duration_ms: f64, now_ms: f64) {
		self.zoom = Some(Tween {
			from: self.transform.k,
			to: level.clamp(MIN_ZOOM, MAX_ZOOM),
			start_ms: now_ms,
			duration_ms,
		});
		self.advance(now_ms);
	}

	/// Step running tweens. Zooming keeps the current center fixed.
	pub fn advance(&mut self, now_ms: f64) {
		if !self.is_animating() {
			return;
		}
		let (mut cx, mut cy) = self.center();
		let mut k = self.transform.k;
		if let Some((tx, ty)) = self.center {
			let ((x, done), (y, _)) = (tx.sample(now_ms), ty.sample(now_ms));
			(cx, cy) = (x, y);
			if done {
				self.center = None;
			}
		}
		if let Some(tz) = self.zoom {
			let (z, done) = tz.sample(now_ms);
			k = z;
			if done {
				self.zoom = None;
			}
		}
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
	}

	/// Wheel zoom around the pointer. Cancels running tweens.
	pub fn zoom_around(&mut self, sx: f64, sy: f64, factor: f64) {
		self.center = None;
		self.zoom = None;
		let k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = k;
	}

	/// Pan so the transform origin sits at `(x, y)`. Cancels a running
	/// center tween.
	pub fn pan_to(&mut self, x: f64, y: f64) {
		self.center = None;
		self.transform.x = x;
		self.transform.y = y;
	}

	/// Keep the same graph point centered across a size change.
	pub fn resize(&mut self, width: f64, height: f64) {
		let (cx, cy) = self.center();
		self.width = width;
		self.height = height;
		self.transform.x = width / 2.0 - cx * self.transform.k;
		self.transform.y = height / 2.0 - cy * self.transform.k;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: (f64, f64), b: (f64, f64)) -> bool {
		(a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
	}

	#[test]
	fn starts_centered_on_origin() {
		let vp = Viewport::new(800.0, 600.0);
		assert!(close(vp.center(), (0.0, 0.0)));
		assert!(close(vp.transform.screen_to_graph(410.0, 300.0), (10.0, 0.0)));
	}

	#[test]
	fn center_and_zoom_finish_on_target() {
		let mut vp = Viewport::new(800.0, 600.0);
		vp.apply(
			ViewportCommand::CenterAt {
				x: 50.0,
				y: -20.0,
				duration_ms: 1000.0,
			},
			0.0,
		);
		vp.apply(
			ViewportCommand::Zoom {
				level: 6.0,
				duration_ms: 2000.0,
			},
			0.0,
		);
		vp.advance(500.0);
		assert!(vp.is_animating());
		assert!(vp.transform.k > 1.0 && vp.transform.k < 6.0);

		vp.advance(1000.0);
		assert!(close(vp.center(), (50.0, -20.0)));
		vp.advance(2500.0);
		assert!(!vp.is_animating());
		assert_eq!(vp.transform.k, 6.0);
		assert!(close(vp.center(), (50.0, -20.0)));
	}

	#[test]
	fn zero_duration_jumps() {
		let mut vp = Viewport::new(100.0, 100.0);
		vp.center_at(5.0, 5.0, 0.0, 0.0);
		assert!(!vp.is_animating());
		assert!(close(vp.center(), (5.0, 5.0)));
	}

	#[test]
	fn wheel_zoom_keeps_pointer_fixed_and_cancels_tweens() {
		let mut vp = Viewport::new(800.0, 600.0);
		vp.zoom_to(6.0, 2000.0, 0.0);
		let before = vp.transform.screen_to_graph(100.0, 100.0);
		vp.zoom_around(100.0, 100.0, 1.1);
		assert!(!vp.is_animating());
		assert!(close(vp.transform.screen_to_graph(100.0, 100.0), before));

		for _ in 0..100 {
			vp.zoom_around(0.0, 0.0, 1.1);
		}
		assert_eq!(vp.transform.k, MAX_ZOOM);
	}

	#[test]
	fn resize_preserves_center() {
		let mut vp = Viewport::new(800.0, 600.0);
		vp.center_at(30.0, 40.0, 0.0, 0.0);
		vp.resize(1024.0, 768.0);
		assert!(close(vp.center(), (30.0, 40.0)));
	}

	#[test]
	fn easing_is_monotonic_and_bounded() {
		assert_eq!(ease_out_cubic(0.0), 0.0);
		assert_eq!(ease_out_cubic(1.0), 1.0);
		assert!(ease_out_cubic(0.5) > 0.5);
	}
}
