use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use super::images::{Bitmap, ImageEntry, ImageLoader};

impl Bitmap for HtmlImageElement {
	fn natural_size(&self) -> (f64, f64) {
		(self.natural_width() as f64, self.natural_height() as f64)
	}
}

type Listener = Closure<dyn FnMut()>;

/// Loads through `<img>` elements. Listener closures live as long as the
/// loader, matching the session lifetime of cache entries.
#[derive(Default)]
pub struct HtmlImageLoader {
	listeners: RefCell<Vec<(Listener, Listener)>>,
}

impl ImageLoader for HtmlImageLoader {
	type Image = HtmlImageElement;

	fn load(&self, entry: Rc<ImageEntry<HtmlImageElement>>) {
		let Some(url) = entry.current_url().map(str::to_owned) else {
			return;
		};
		let img = match HtmlImageElement::new() {
			Ok(img) => img,
			Err(_) => {
				// no DOM: exhaust the candidates so the node shows the placeholder
				while entry.fail_attempt().is_some() {}
				return;
			}
		};
		img.set_cross_origin(Some("anonymous"));

		let (img_ok, entry_ok) = (img.clone(), entry.clone());
		let onload: Listener = Closure::new(move || entry_ok.complete(img_ok.clone()));

		let (img_err, entry_err) = (img.clone(), entry);
		let onerror: Listener = Closure::new(move || {
			if let Some(next) = entry_err.fail_attempt() {
				debug!("retrying image at {}", next);
				img_err.set_src(&next);
			}
		});

		img.set_onload(Some(onload.as_ref().unchecked_ref()));
		img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
		img.set_src(&url);
		self.listeners.borrow_mut().push((onload, onerror));
	}
}
