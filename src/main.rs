// Dependencies are used by the library crate, not the binary.
#![allow(unused_crate_dependencies)]

use evidence_graph_canvas::{App, init_logging};

fn main() {
	init_logging();
	leptos::mount::mount_to_body(App);
}
