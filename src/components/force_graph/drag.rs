//! Drag-to-pin. A dragged node is held at the pointer by its pin; the
//! layout engine honors pins on every step and resumes once it is cleared.

use std::collections::HashSet;

use log::debug;

use super::model::{Node, NodeKey, Pin};

#[derive(Debug, Default)]
pub struct DragController {
	pinned: HashSet<NodeKey>,
}

impl DragController {
	#[cfg(test)]
	pub fn is_pinned(&self, key: NodeKey) -> bool {
		self.pinned.contains(&key)
	}

	/// One drag-movement event. `current` is the simulated position, `pointer`
	/// the reported coordinate in graph space.
	pub fn drag(&mut self, node: &mut Node, current: (f64, f64), pointer: (f64, f64)) {
		if self.pinned.insert(node.key) {
			debug!("drag start {}", node.id);
			node.pin = Some(Pin {
				fx: current.0,
				fy: current.1,
			});
			return;
		}
		node.pin = Some(Pin {
			fx: pointer.0,
			fy: pointer.1,
		});
	}

	/// Release back to the simulation. No-op for nodes that were never pinned.
	pub fn end(&mut self, node: &mut Node) {
		if self.pinned.remove(&node.key) {
			debug!("drag end {}", node.id);
			node.pin = None;
		}
	}
}
