use leptos::ev::MouseEvent;
use leptos::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
	Info,
	Error,
}

/// A message shown in the corner banner.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
	pub message: String,
	pub level: NoticeLevel,
	/// Persistent notices ignore clicks.
	pub persistent: bool,
}

impl Notice {
	pub fn info(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			level: NoticeLevel::Info,
			persistent: false,
		}
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			level: NoticeLevel::Error,
			persistent: false,
		}
	}

	pub fn fatal(message: impl Into<String>) -> Self {
		Self {
			persistent: true,
			..Self::error(message)
		}
	}

	fn background(&self) -> &'static str {
		match self.level {
			NoticeLevel::Info => "rgba(50, 120, 200, 0.95)",
			NoticeLevel::Error => "rgba(220, 50, 47, 0.95)",
		}
	}
}

#[component]
pub fn StatusBanner(notice: RwSignal<Option<Notice>>) -> impl IntoView {
	let dismiss = move |_: MouseEvent| {
		if notice.with(|n| n.as_ref().is_some_and(|n| !n.persistent)) {
			notice.set(None);
		}
	};

	move || {
		notice.get().map(|n| {
			view! {
				<div
					class="status-banner"
					style:background={n.background()}
					style:cursor={if n.persistent { "default" } else { "pointer" }}
					on:click=dismiss
				>
					{n.message.clone()}
				</div>
			}
		})
	}
}
