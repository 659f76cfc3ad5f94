use crate::gate::GATE;

/// Brackets a do-body. On construction, descends the active context into
/// the present record's sub-context, so nested pushes land there instead
/// of in the context the outer push happened on. On drop, ascends back and
/// either advances the parent's cursor (if the parent is itself mid-redo
/// and nested) or fires the parent's stack-changed observer.
///
/// Construction and release are each no-ops while the gate is locked or the
/// active context is already undoing (the undo path uses [`PopScope`]
/// instead, and must not be double-descended by a stray `PushScope`).
pub struct PushScope {
	active: bool,
}

impl PushScope {
	/// Descends the gate's active context into the present record's
	/// sub-context. A no-op (the returned scope releases as a no-op too) if
	/// the gate is locked or the active context is already undoing.
	pub fn new() -> PushScope {
		if GATE.is_locked() {
			return PushScope { active: false };
		}
		let Some(current) = GATE.try_context() else {
			return PushScope { active: false };
		};
		if current.is_undoing() {
			return PushScope { active: false };
		}
		GATE.set_context(current.present_unchecked().sub_context());
		PushScope { active: true }
	}

	/// Runs the release step immediately and disarms the subsequent `Drop`,
	/// for use together with [`crate::Context::abort_push`] when a do-body
	/// decides mid-flight that nothing observable happened.
	pub fn abort(mut self) {
		self.release();
	}

	fn release(&mut self) {
		if !self.active {
			return;
		}
		self.active = false;

		if GATE.is_locked() {
			return;
		}
		let Some(current) = GATE.try_context() else {
			return;
		};
		if current.is_undoing() {
			return;
		}
		let Some(parent) = current.parent() else {
			return;
		};
		GATE.set_context(parent.clone());

		if parent.take_abort_requested() {
			return;
		}

		// `parent`'s own cursor already advanced explicitly if `parent`'s own
		// `redo()` call is what's driving this scope (its `redo()` increments
		// before invoking, per `Context::redo`'s ordering contract) — bumping
		// it again here would double-advance and skip a record. Only a
		// pass-through ancestor that isn't itself running `redo()` (some
		// further-out ancestor is) needs the bump, to stand in for the
		// `push()` that redo's replay path skips.
		if parent.parent().is_some() && parent.is_redoing() && !parent.is_redoing_self() && parent.present_index() < parent.stack_len() - 1 {
			parent.increment_present();
		} else if !parent.is_redoing() {
			parent.fire_observer();
		}
	}
}

impl Default for PushScope {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for PushScope {
	fn drop(&mut self) {
		self.release();
	}
}
