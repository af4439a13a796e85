use leptos::prelude::*;
use log::{error, info};

use crate::api;
use crate::components::banner::{Notice, StatusBanner};
use crate::components::details::DetailsPanel;
use crate::components::force_graph::{ForceGraphCanvas, GraphData, NodeSnapshot, NodeUpdate};
use crate::config::GraphConfig;

/// Graph view with the details panel and status banner.
#[component]
pub fn Home() -> impl IntoView {
	let config = GraphConfig::from_document();
	let graph_data = RwSignal::new(None::<GraphData>);
	let selection = RwSignal::new(None::<NodeSnapshot>);
	let saved = RwSignal::new(None::<NodeUpdate>);
	let notice = RwSignal::new(None::<Notice>);

	let graph_url = config.graph_url.clone();
	wasm_bindgen_futures::spawn_local(async move {
		match api::fetch_graph(&graph_url).await {
			Ok(data) => {
				info!(
					"loaded graph: {} nodes, {} links",
					data.nodes.len(),
					data.links.len()
				);
				graph_data.set(Some(data));
			}
			Err(e) => {
				error!("graph load failed: {}", e);
				notice.set(Some(Notice::fatal(format!(
					"Failed to load graph data: {}",
					e
				))));
			}
		}
	});

	let on_select = Callback::new(move |snapshot: Option<NodeSnapshot>| {
		if let Some(s) = &snapshot {
			notice.set(Some(Notice::info(format!("Selected: {}", s.name))));
		}
		selection.set(snapshot);
	});

	let images = config.images.clone();
	let update_url = config.update_url.clone();
	let on_save = Callback::new(move |update: NodeUpdate| {
		// Local copy first; the backend write is best effort.
		selection.update(|s| {
			if let Some(s) = s {
				s.merge(&update);
			}
		});
		saved.set(Some(update.clone()));

		let url = update_url.clone();
		wasm_bindgen_futures::spawn_local(async move {
			if let Err(e) = api::update_node(&url, &update).await {
				error!("saving {} failed: {}", update.id, e);
				notice.set(Some(Notice::error(format!("Failed to save changes: {}", e))));
			}
		});
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				{move || {
					graph_data
						.get()
						.map(|data| {
							view! {
								<ForceGraphCanvas
									data=data
									config=config.clone()
									on_select=on_select
									updates=saved
									fullscreen=true
								/>
							}
						})
				}}
				<DetailsPanel selection=selection on_save=on_save images=images />
				<StatusBanner notice=notice />
			</div>
		</ErrorBoundary>
	}
}
