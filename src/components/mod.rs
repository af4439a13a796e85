pub mod banner;
pub mod details;
pub mod force_graph;
