use crate::gate::GATE;

/// Brackets an undo-body, symmetric to [`crate::scope::PushScope`]. On
/// construction, descends the active context into the present record's
/// sub-context. On drop, ascends back and retreats the parent's cursor by
/// one if the parent is itself nested inside another record.
pub struct PopScope {
	active: bool,
}

impl PopScope {
	/// Descends the gate's active context into the present record's
	/// sub-context. A no-op (the returned scope releases as a no-op too) if
	/// the gate is locked or no context has been installed yet.
	pub fn new() -> PopScope {
		if GATE.is_locked() {
			return PopScope { active: false };
		}
		let Some(current) = GATE.try_context() else {
			return PopScope { active: false };
		};
		GATE.set_context(current.present_unchecked().sub_context());
		PopScope { active: true }
	}
}

impl Default for PopScope {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for PopScope {
	fn drop(&mut self) {
		if !self.active {
			return;
		}
		if GATE.is_locked() {
			return;
		}
		let Some(current) = GATE.try_context() else {
			return;
		};
		let Some(parent) = current.parent() else {
			return;
		};
		GATE.set_context(parent.clone());

		// Symmetric to `PushScope`'s redo-advance guard: if `parent`'s own
		// `undo()` call is what's driving this scope, it already retreats
		// its own cursor explicitly after this body returns. Bumping it here
		// too would decrement it twice and skip a record. Only a
		// pass-through ancestor — nested deeper, with its own `undo()` not
		// in flight — needs this nudge on its behalf.
		if parent.parent().is_some() && parent.present_index() > 1 && !parent.is_undoing_self() {
			parent.decrement_present();
		}
	}
}
