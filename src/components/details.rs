//! Side panel with the selected node's properties, in-place editing and
//! an evidence gallery.

use std::collections::BTreeMap;

use leptos::ev::MouseEvent;
use leptos::prelude::*;
use log::{debug, warn};
use serde_json::Value;

use super::force_graph::{
	EvidenceSource, Group, NodeSnapshot, NodeUpdate, Properties, evidence_sources,
};
use crate::config::ImageSources;

const ACCENT: &str = "#58a6ff";

/// Properties shown in the table; screenshots go to the gallery instead.
fn visible(key: &str) -> bool {
	key != "screenshot"
}

pub fn display_value(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

pub fn is_link(value: &str) -> bool {
	value.starts_with("http://") || value.starts_with("https://")
}

fn draft_values(properties: &Properties) -> BTreeMap<String, String> {
	properties
		.iter()
		.filter(|(k, _)| visible(k))
		.map(|(k, v)| (k.clone(), display_value(v)))
		.collect()
}

#[component]
pub fn DetailsPanel(
	selection: RwSignal<Option<NodeSnapshot>>,
	#[prop(into)] on_save: Callback<NodeUpdate>,
	/// Lookup rules for the evidence gallery.
	images: ImageSources,
) -> impl IntoView {
	let editing = RwSignal::new(false);
	let drafts = RwSignal::new(BTreeMap::<String, String>::new());

	Effect::new(move |_| {
		let values = selection.with(|s| {
			s.as_ref()
				.map(|s| draft_values(&s.properties))
				.unwrap_or_default()
		});
		drafts.set(values);
		editing.set(false);
	});

	let toggle = move |_: MouseEvent| editing.update(|e| *e = !*e);
	let save = move |_: MouseEvent| {
		let Some(id) = selection.with(|s| s.as_ref().map(|s| s.id.clone())) else {
			return;
		};
		editing.set(false);
		on_save.run(NodeUpdate {
			id,
			properties: drafts.get(),
		});
	};

	let title = move || {
		selection.with(|s| match s {
			Some(s) => format!("{}: {}", s.group, s.name),
			None => "Select a node".into(),
		})
	};
	let title_color = move || {
		selection.with(|s| match s {
			Some(s) => Group::parse(&s.group).color(),
			None => ACCENT,
		})
	};

	let controls = move || {
		selection.with(Option::is_some).then(|| {
			view! {
				<button class="edit-btn" on:click=toggle>
					{move || if editing.get() { "Cancel" } else { "✎ Edit" }}
				</button>
				{move || editing.get().then(|| view! {
					<button class="save-btn" on:click=save>"Save"</button>
				})}
			}
		})
	};

	let rows = move || {
		let Some(snapshot) = selection.get() else {
			return view! {
				<tr>
					<td colspan="2" class="placeholder">"Click on a node to view details"</td>
				</tr>
			}
			.into_any();
		};
		if snapshot.properties.is_empty() {
			return view! {
				<tr>
					<td colspan="2">"No properties available"</td>
				</tr>
			}
			.into_any();
		}
		let is_editing = editing.get();
		snapshot
			.properties
			.iter()
			.filter(|(k, _)| visible(k))
			.map(|(key, value)| {
				let text = display_value(value);
				let cell = if is_editing {
					let key = key.clone();
					view! {
						<input
							type="text"
							class="edit-input"
							prop:value=text
							on:input=move |ev| {
								let value = event_target_value(&ev);
								drafts.update(|d| {
									d.insert(key.clone(), value);
								});
							}
						/>
					}
					.into_any()
				} else if is_link(&text) {
					let href = text.clone();
					view! { <a href=href target="_blank">{text}</a> }.into_any()
				} else {
					view! { <span>{text}</span> }.into_any()
				};
				view! {
					<tr>
						<td class="prop-key">{key.clone()}</td>
						<td class="prop-val">{cell}</td>
					</tr>
				}
			})
			.collect_view()
			.into_any()
	};

	let gallery = move || {
		let Some(snapshot) = selection.get() else {
			return view! { <div class="gallery-empty">"No evidence selected"</div> }.into_any();
		};
		let found = evidence_sources(&snapshot.id, &snapshot.properties, &images);
		if found.is_empty() {
			return view! { <div class="gallery-empty">"No evidence available"</div> }.into_any();
		}
		view! {
			{found
				.into_iter()
				.map(|source| view! { <EvidenceImage source=source /> })
				.collect_view()}
			<div class="gallery-caption">"Click to enlarge"</div>
		}
		.into_any()
	};

	view! {
		<aside class="details-panel">
			<header>
				<h2 style:color=title_color>{title}</h2>
				{controls}
			</header>
			<table>
				<tbody>{rows}</tbody>
			</table>
			<section class="gallery">{gallery}</section>
		</aside>
	}
}

/// Next candidate after a failed load, or `None` once the list is spent.
fn next_attempt(attempt: usize, candidates: usize) -> Option<usize> {
	(attempt + 1 < candidates).then_some(attempt + 1)
}

/// One gallery picture. Walks its candidate URLs on load errors and shows
/// the last one tried when none loads.
#[component]
fn EvidenceImage(source: EvidenceSource) -> impl IntoView {
	let EvidenceSource { label, candidates } = source;
	let last = candidates.last().cloned().unwrap_or_default();
	let attempt = RwSignal::new(0usize);
	let failed = RwSignal::new(candidates.is_empty());
	let candidates = StoredValue::new(candidates);

	let src = move || {
		candidates.with_value(|c| c.get(attempt.get()).cloned().unwrap_or_default())
	};
	let on_error = move |_: web_sys::ErrorEvent| {
		let count = candidates.with_value(Vec::len);
		match next_attempt(attempt.get_untracked(), count) {
			Some(next) => {
				attempt.set(next);
				debug!("retrying evidence image ({} of {})", next + 1, count);
			}
			None => {
				warn!("evidence image not found at any of {} candidates", count);
				failed.set(true);
			}
		}
	};
	let enlarge = move |_: MouseEvent| {
		if let Some(window) = web_sys::window() {
			let _ = window.open_with_url_and_target(&src(), "_blank");
		}
	};

	view! {
		<div class="evidence">
			<div class="evidence-label">{label}</div>
			{move || {
				if failed.get() {
					let href = last.clone();
					view! {
						<div class="evidence-missing">
							"Image not found: "
							<a href=href target="_blank">{last.clone()}</a>
						</div>
					}
					.into_any()
				} else {
					view! { <img class="gallery-img" src=src on:error=on_error on:click=enlarge /> }
						.into_any()
				}
			}}
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn values_render_as_plain_text() {
		assert_eq!(display_value(&Value::from("x")), "x");
		assert_eq!(display_value(&Value::from(42)), "42");
		assert_eq!(display_value(&Value::Null), "");
		assert_eq!(display_value(&Value::Bool(true)), "true");
	}

	#[test]
	fn only_http_urls_are_links() {
		assert!(is_link("https://example.org/post/1"));
		assert!(is_link("http://example.org"));
		assert!(!is_link("data/evidence/a.png"));
	}

	#[test]
	fn failed_loads_advance_until_the_list_is_spent() {
		assert_eq!(next_attempt(0, 3), Some(1));
		assert_eq!(next_attempt(1, 3), Some(2));
		assert_eq!(next_attempt(2, 3), None);
		assert_eq!(next_attempt(0, 1), None);
	}

	#[test]
	fn drafts_skip_screenshot() {
		let props = Properties::from([
			("screenshot".to_string(), Value::from("a.png")),
			("city".to_string(), Value::from("Warsaw")),
		]);
		let drafts = draft_values(&props);
		assert_eq!(drafts.len(), 1);
		assert_eq!(drafts["city"], "Warsaw");
	}
}
