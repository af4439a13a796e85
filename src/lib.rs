//! Entity graph explorer: a force-directed canvas over a backend graph, with
//! focus mode, evidence images and a property editor.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

mod api;
mod components;
mod config;
mod error;
mod pages;

use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Route `log` output to the browser console and report panics there.
pub fn init_logging() {
	console_error_panic_hook::set_once();
	if console_log::init_with_level(Level::Debug).is_ok() {
		info!("evidence graph starting");
	}
}

/// Routes the graph view and handles 404's.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		<Title text="Evidence Graph" />

		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />
		<Meta name="description" content="Entity relationships and their evidence" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
