mod component;
mod drag;
mod hit;
mod images;
mod interaction;
mod link_style;
mod loader;
mod model;
mod node_style;
mod render;
mod state;
mod types;
mod viewport;

pub use component::ForceGraphCanvas;
pub use images::{EvidenceSource, evidence_sources};
pub use types::{GraphData, Group, NodeSnapshot, NodeUpdate, Properties};
