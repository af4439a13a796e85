//! Evidence image resolution.
//!
//! Each node id gets at most one cache entry per session. An entry owns an
//! ordered candidate URL list; the loader walks it until one succeeds or
//! all fail. Entries are polled every frame; their status only moves
//! forward (`Pending` to `Loaded` or `Failed`).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};
use serde_json::Value;

use super::model::Node;
use super::types::Properties;
use crate::config::ImageSources;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
	Pending,
	Loaded,
	Failed,
}

/// Anything with intrinsic pixel dimensions.
pub trait Bitmap {
	fn natural_size(&self) -> (f64, f64);
}

/// Starts loads. Implementations call [`ImageEntry::complete`] on success
/// and [`ImageEntry::fail_attempt`] on error, retrying with the URL it
/// returns.
pub trait ImageLoader {
	type Image;

	fn load(&self, entry: Rc<ImageEntry<Self::Image>>);
}

#[derive(Debug)]
pub struct ImageEntry<I> {
	candidates: Vec<String>,
	attempt: Cell<usize>,
	status: Cell<LoadStatus>,
	image: RefCell<Option<I>>,
}

impl<I> ImageEntry<I> {
	pub fn new(candidates: Vec<String>) -> Self {
		let status = if candidates.is_empty() {
			LoadStatus::Failed
		} else {
			LoadStatus::Pending
		};
		Self {
			candidates,
			attempt: Cell::new(0),
			status: Cell::new(status),
			image: RefCell::new(None),
		}
	}

	pub fn status(&self) -> LoadStatus {
		self.status.get()
	}

	#[cfg(test)]
	pub fn loaded(&self) -> bool {
		self.status() == LoadStatus::Loaded
	}

	pub fn failed(&self) -> bool {
		self.status() == LoadStatus::Failed
	}

	/// URL currently being attempted, if still pending.
	pub fn current_url(&self) -> Option<&str> {
		match self.status() {
			LoadStatus::Pending => self.candidates.get(self.attempt.get()).map(String::as_str),
			_ => None,
		}
	}

	/// Record a successful load. Ignored once the entry has settled.
	pub fn complete(&self, image: I) {
		if self.status() != LoadStatus::Pending {
			return;
		}
		*self.image.borrow_mut() = Some(image);
		self.status.set(LoadStatus::Loaded);
	}

	/// Abandon the current candidate. Returns the next URL to try, or `None`
	/// once every candidate has failed.
	pub fn fail_attempt(&self) -> Option<String> {
		if self.status() != LoadStatus::Pending {
			return None;
		}
		let next = self.attempt.get() + 1;
		self.attempt.set(next);
		match self.candidates.get(next) {
			Some(url) => Some(url.clone()),
			None => {
				warn!("image failed at every candidate: {:?}", self.candidates);
				self.status.set(LoadStatus::Failed);
				None
			}
		}
	}

	pub fn with_image<R>(&self, f: impl FnOnce(&I) -> R) -> Option<R> {
		self.image.borrow().as_ref().map(f)
	}
}

pub struct ImageResolver<L: ImageLoader> {
	loader: L,
	sources: ImageSources,
	cache: HashMap<String, Option<Rc<ImageEntry<L::Image>>>>,
}

impl<L: ImageLoader> ImageResolver<L> {
	pub fn new(loader: L, sources: ImageSources) -> Self {
		Self {
			loader,
			sources,
			cache: HashMap::new(),
		}
	}

	#[cfg(test)]
	pub fn loader(&self) -> &L {
		&self.loader
	}

	pub fn has_source(&self, node: &Node) -> bool {
		!self.source_paths(node).is_empty()
	}

	/// Cached entry for the node, starting the load on first request.
	/// `None` means the node has no image and will never be retried.
	pub fn resolve(&mut self, node: &Node) -> Option<Rc<ImageEntry<L::Image>>> {
		if let Some(entry) = self.cache.get(&node.id) {
			return entry.clone();
		}
		let candidates = self.candidates(node);
		if candidates.is_empty() {
			self.cache.insert(node.id.clone(), None);
			return None;
		}
		debug!("loading image for {} ({} candidates)", node.id, candidates.len());
		let entry = Rc::new(ImageEntry::new(candidates));
		self.cache.insert(node.id.clone(), Some(entry.clone()));
		self.loader.load(entry.clone());
		Some(entry)
	}

	/// Source paths in priority order: `image`, `screenshot`, then paths
	/// derived from a symbol id.
	pub fn source_paths(&self, node: &Node) -> Vec<String> {
		let mut paths: Vec<String> = ["image", "screenshot"]
			.iter()
			.filter_map(|key| node.property_str(key))
			.map(str::to_owned)
			.collect();
		paths.extend(symbol_paths(&node.id, &self.sources));
		paths
	}

	/// Every URL to try, deduplicated, each source expanded across mirrors.
	pub fn candidates(&self, node: &Node) -> Vec<String> {
		let mut urls = Vec::new();
		for path in self.source_paths(node) {
			push_mirrored(&mut urls, &path, &self.sources);
		}
		if is_symbol(&node.id, &self.sources) {
			push_placeholder(&mut urls, &self.sources);
		}
		urls
	}
}

fn is_symbol(id: &str, sources: &ImageSources) -> bool {
	!sources.symbol_prefix.is_empty() && id.starts_with(&sources.symbol_prefix)
}

fn symbol_paths(id: &str, sources: &ImageSources) -> Vec<String> {
	if !is_symbol(id, sources) {
		return Vec::new();
	}
	let dir = sources.symbol_dir.trim_end_matches('/');
	sources
		.symbol_extensions
		.iter()
		.map(|ext| format!("{}/{}.{}", dir, id, ext))
		.collect()
}

fn push_mirrored(urls: &mut Vec<String>, path: &str, sources: &ImageSources) {
	let path = normalize_path(path, sources);
	for mirror in &sources.mirrors {
		let url = format!("{}{}", mirror.trim_end_matches('/'), path);
		if !urls.contains(&url) {
			urls.push(url);
		}
	}
}

fn push_placeholder(urls: &mut Vec<String>, sources: &ImageSources) {
	if let Some(placeholder) = &sources.placeholder {
		if !urls.contains(placeholder) {
			urls.push(placeholder.clone());
		}
	}
}

/// One labelled picture in the details gallery, with its fallback URLs.
#[derive(Clone, Debug, PartialEq)]
pub struct EvidenceSource {
	pub label: &'static str,
	pub candidates: Vec<String>,
}

/// Everything the details gallery tries to show for a node, in display
/// order: screenshot, image, paths inferred from Facebook post ids and
/// URLs, then derived symbol files.
pub fn evidence_sources(
	id: &str,
	properties: &Properties,
	sources: &ImageSources,
) -> Vec<EvidenceSource> {
	let text = |key: &str| {
		properties
			.get(key)
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|s| !s.is_empty())
	};
	let facebook = sources.facebook_dir.trim_end_matches('/');

	let mut found: Vec<(&'static str, String, bool)> = Vec::new();
	if let Some(path) = text("screenshot") {
		found.push(("Screenshot", path.to_owned(), false));
	}
	if let Some(path) = text("image") {
		found.push(("Symbol/Logo", path.to_owned(), false));
	}
	if let Some(handle) = post_id_handle(id) {
		found.push((
			"Facebook Post",
			format!("{}/{}/{}.png", facebook, handle, id),
			false,
		));
	}
	if let Some((handle, post)) = text("url").and_then(facebook_post) {
		found.push((
			"Facebook Screenshot (Inferred)",
			format!("{}/{}/fb_{}_{}.png", facebook, handle, handle, post),
			false,
		));
	}
	for path in symbol_paths(id, sources) {
		found.push(("Symbol", path, true));
	}

	found
		.into_iter()
		.map(|(label, path, symbol)| {
			let mut candidates = Vec::new();
			push_mirrored(&mut candidates, &path, sources);
			if symbol {
				push_placeholder(&mut candidates, sources);
			}
			EvidenceSource { label, candidates }
		})
		.collect()
}

/// `fb_<handle>_<post>` ids name their page handle second.
fn post_id_handle(id: &str) -> Option<&str> {
	let mut parts = id.split('_');
	if parts.next()? != "fb" {
		return None;
	}
	let handle = parts.next().filter(|h| !h.is_empty())?;
	parts.next()?;
	Some(handle)
}

/// `(handle, post)` from `…facebook.com/<handle>/posts/<post>[?…]`.
fn facebook_post(url: &str) -> Option<(&str, &str)> {
	let (_, rest) = url.split_once("facebook.com/")?;
	let mut parts = rest.split('/');
	let handle = parts.next().filter(|h| !h.is_empty())?;
	if parts.next()? != "posts" {
		return None;
	}
	let post = parts.next()?.split('?').next()?;
	(!post.is_empty()).then_some((handle, post))
}

/// Forward slashes, rooted at `/`: paths already under the data prefix are
/// rooted as-is, absolute paths are kept, anything else goes under the data
/// root.
pub fn normalize_path(path: &str, sources: &ImageSources) -> String {
	let path = path.trim().replace('\\', "/");
	if path.starts_with(&sources.data_prefix) {
		format!("/{}", path)
	} else if path.starts_with('/') {
		path
	} else {
		format!("{}/{}", sources.data_root.trim_end_matches('/'), path)
	}
}
