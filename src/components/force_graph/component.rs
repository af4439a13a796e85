use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::hit::{PickTarget, ShadowCanvas};
use super::interaction::DetailSink;
use super::loader::HtmlImageLoader;
use super::render::{self, CanvasText};
use super::state::ForceGraphState;
use super::types::{GraphData, NodeSnapshot, NodeUpdate};
use crate::config::GraphConfig;
use crate::error::GraphError;

const FRAME_DT: f32 = 0.016;

/// Live simulation plus the pick buffer painted from its last frame.
struct Engine {
	state: ForceGraphState<HtmlImageLoader>,
	shadow: ShadowCanvas,
}

impl Engine {
	fn pick(&self, x: f64, y: f64) -> Option<PickTarget> {
		let decoded = self.shadow.pick(
			x,
			y,
			self.state.device_scale,
			self.state.graph.nodes().len(),
			self.state.graph.links().len(),
		);
		self.state.confirm_pick(x, y, decoded)
	}

	fn resize(&mut self, canvas: &HtmlCanvasElement, w: f64, h: f64, dpr: f64) {
		size_canvas(canvas, &self.shadow, w, h, dpr);
		self.state.device_scale = dpr;
		self.state.resize(w, h);
	}
}

type Shared<T> = Rc<RefCell<Option<T>>>;

struct CallbackSink(Callback<Option<NodeSnapshot>>);

impl DetailSink for CallbackSink {
	fn show(&self, snapshot: NodeSnapshot) {
		self.0.run(Some(snapshot));
	}

	fn clear(&self) {
		self.0.run(None);
	}
}

#[component]
pub fn ForceGraphCanvas(
	data: GraphData,
	config: GraphConfig,
	/// Receives the activated node, or `None` when focus is cleared.
	#[prop(into)]
	on_select: Callback<Option<NodeSnapshot>>,
	/// Saved edits to merge into the in-memory graph.
	#[prop(into)]
	updates: Signal<Option<NodeUpdate>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let engine: Shared<Engine> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let keydown_cb: Shared<Closure<dyn FnMut(KeyboardEvent)>> = Rc::new(RefCell::new(None));
	let (engine_init, animate_init, resize_init, keydown_init) = (
		engine.clone(),
		animate.clone(),
		resize_cb.clone(),
		keydown_cb.clone(),
	);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if engine_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let setup = || -> Result<CanvasRenderingContext2d, GraphError> {
			let ctx = context_2d(&canvas)?;
			let document = window
				.document()
				.ok_or_else(|| GraphError::Canvas("no document".into()))?;
			let shadow = ShadowCanvas::new(&document)?;
			let (w, h) = container_size(&window, &canvas, fullscreen, width, height);
			let dpr = window.device_pixel_ratio();
			let state = ForceGraphState::new(
				&data,
				&config,
				HtmlImageLoader::default(),
				Box::new(CallbackSink(on_select)),
				w,
				h,
			);
			let mut engine = Engine { state, shadow };
			engine.resize(&canvas, w, h, dpr);
			*engine_init.borrow_mut() = Some(engine);
			Ok(ctx)
		};
		let ctx = match setup() {
			Ok(ctx) => ctx,
			Err(e) => {
				error!("graph canvas setup failed: {}", e);
				return;
			}
		};

		let (engine_resize, canvas_resize) = (engine_init.clone(), canvas.clone());
		*resize_init.borrow_mut() = Some(Closure::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (w, h) = container_size(&win, &canvas_resize, fullscreen, width, height);
			if let Some(ref mut e) = *engine_resize.borrow_mut() {
				e.resize(&canvas_resize, w, h, win.device_pixel_ratio());
			}
		}));
		if let Some(ref cb) = *resize_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let engine_key = engine_init.clone();
		*keydown_init.borrow_mut() = Some(Closure::new(move |ev: KeyboardEvent| {
			if ev.key() == "Escape" {
				if let Some(ref mut e) = *engine_key.borrow_mut() {
					e.state.escape();
				}
			}
		}));
		if let Some(ref cb) = *keydown_init.borrow() {
			let _ = window.add_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref());
		}

		let (engine_anim, animate_inner) = (engine_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut e) = *engine_anim.borrow_mut() {
				e.state.tick(FRAME_DT);
				let frame = e.state.build_frame(&CanvasText(&ctx));
				let (viewport, dpr) = (&e.state.viewport, e.state.device_scale);
				render::render(&frame, viewport, dpr, &ctx);
				render::paint_hit_areas(&frame, viewport, dpr, &e.shadow);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let engine_upd = engine.clone();
	Effect::new(move |_| {
		if let Some(update) = updates.get() {
			if let Some(ref mut e) = *engine_upd.borrow_mut() {
				e.state.apply_update(&update);
			}
		}
	});

	let pointer = move |ev: &MouseEvent| -> Option<(f64, f64)> {
		let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
		let rect = canvas.get_bounding_client_rect();
		Some((
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		))
	};

	let engine_md = engine.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut e) = *engine_md.borrow_mut() {
			let target = e.pick(x, y);
			e.state.pointer_down(x, y, target);
		}
	};

	let engine_mm = engine.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut e) = *engine_mm.borrow_mut() {
			let target = e.pick(x, y);
			e.state.pointer_move(x, y, target);
			let cursor = if e.state.selection.state().hovered_node.is_some() {
				"pointer"
			} else {
				"grab"
			};
			if let Some(canvas) = canvas_ref.get() {
				let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
			}
		}
	};

	let engine_mu = engine.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut e) = *engine_mu.borrow_mut() {
			e.state.pointer_up();
		}
	};

	let engine_ml = engine.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut e) = *engine_ml.borrow_mut() {
			e.state.pointer_leave();
		}
	};

	let engine_wh = engine.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut e) = *engine_wh.borrow_mut() {
			e.state.wheel(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, GraphError> {
	canvas
		.get_context("2d")
		.map_err(GraphError::canvas)?
		.ok_or_else(|| GraphError::Canvas("2d context unavailable".into()))?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| GraphError::Canvas("unexpected context type".into()))
}

/// CSS size of the drawing area.
fn container_size(
	window: &Window,
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		let dim = |v: Result<JsValue, JsValue>, fallback: f64| {
			v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
		};
		return (
			dim(window.inner_width(), 800.0),
			dim(window.inner_height(), 600.0),
		);
	}
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_width() as f64)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

/// Backing stores in device pixels, layout size in CSS pixels.
fn size_canvas(canvas: &HtmlCanvasElement, shadow: &ShadowCanvas, w: f64, h: f64, dpr: f64) {
	let (pw, ph) = ((w * dpr).round() as u32, (h * dpr).round() as u32);
	canvas.set_width(pw);
	canvas.set_height(ph);
	shadow.resize(pw, ph);
	let style = web_sys::HtmlElement::style(canvas);
	let _ = style.set_property("width", &format!("{}px", w));
	let _ = style.set_property("height", &format!("{}px", h));
}
