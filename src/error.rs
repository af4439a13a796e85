//! Crate error type.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures surfaced by data loading and canvas setup.
#[derive(Debug, Error)]
pub enum GraphError {
	/// The request never produced a response (network, CORS, bad URL).
	#[error("request failed: {0}")]
	Request(String),
	/// The server answered with a non-success status.
	#[error("server returned {status} {text}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// HTTP status text.
		text: String,
	},
	/// The payload was not the expected JSON shape.
	#[error("malformed payload: {0}")]
	Decode(#[from] serde_json::Error),
	/// A browser API needed for drawing was missing.
	#[error("canvas unavailable: {0}")]
	Canvas(String),
}

impl GraphError {
	/// Wrap a thrown JS value as a request failure.
	pub fn request(value: JsValue) -> Self {
		GraphError::Request(describe(&value))
	}

	/// Wrap a thrown JS value as a canvas failure.
	pub fn canvas(value: JsValue) -> Self {
		GraphError::Canvas(describe(&value))
	}
}

fn describe(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
