//! Backend calls: the initial graph fetch and fire-and-forget node updates.

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::components::force_graph::{GraphData, NodeUpdate};
use crate::error::GraphError;

pub async fn fetch_graph(url: &str) -> Result<GraphData, GraphError> {
	let opts = RequestInit::new();
	opts.set_method("GET");
	let request = Request::new_with_str_and_init(url, &opts).map_err(GraphError::request)?;
	let text = send(&request).await?;
	GraphData::from_json(&text)
}

pub async fn update_node(url: &str, update: &NodeUpdate) -> Result<(), GraphError> {
	let body = serde_json::to_string(update)?;
	let opts = RequestInit::new();
	opts.set_method("POST");
	opts.set_body(&body.into());
	let request = Request::new_with_str_and_init(url, &opts).map_err(GraphError::request)?;
	request
		.headers()
		.set("Content-Type", "application/json")
		.map_err(GraphError::request)?;
	send(&request).await.map(|_| ())
}

/// Run the request and return the body text of a successful response.
async fn send(request: &Request) -> Result<String, GraphError> {
	let window = web_sys::window().ok_or_else(|| GraphError::Request("no window".into()))?;
	let response: Response = JsFuture::from(window.fetch_with_request(request))
		.await
		.map_err(GraphError::request)?
		.dyn_into()
		.map_err(|_| GraphError::Request("fetch did not return a Response".into()))?;

	if !response.ok() {
		return Err(GraphError::Status {
			status: response.status(),
			text: response.status_text(),
		});
	}

	let text = JsFuture::from(response.text().map_err(GraphError::request)?)
		.await
		.map_err(GraphError::request)?;
	text.as_string()
		.ok_or_else(|| GraphError::Request("response body is not text".into()))
}
