//! Process-wide recording gate: the active-context pointer that
//! [`crate::scope::PushScope`]/[`crate::scope::PopScope`] swap, and the
//! enable/disable switch that silences recording wholesale.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::context::Context;

struct GateState {
	active: Mutex<Option<Context>>,
	locked: AtomicBool,
}

static STATE: OnceLock<GateState> = OnceLock::new();

fn state() -> &'static GateState {
	STATE.get_or_init(|| GateState {
		active: Mutex::new(None),
		locked: AtomicBool::new(false),
	})
}

/// Process-wide handle to the active history context and the recording
/// lock, in the same zero-sized singleton-service shape as this codebase's
/// other process-wide handles. `GATE.context()` panics if no context has
/// ever been installed, because that is a host programming error rather
/// than a recoverable runtime condition.
#[derive(Clone, Copy, Debug, Default)]
pub struct Gate;

/// The single process-wide instance.
pub static GATE: Gate = Gate;

impl Gate {
	/// Installs `ctx` as the active context.
	pub fn set_context(&self, ctx: Context) {
		*state().active.lock() = Some(ctx);
	}

	/// The active context, or `None` if none has been installed yet.
	///
	/// Used internally by the scoped controllers, which must degrade to a
	/// no-op rather than panic when the gate is unset.
	pub fn try_context(&self) -> Option<Context> {
		state().active.lock().clone()
	}

	/// The active context.
	///
	/// # Panics
	///
	/// Panics if no context has been installed via [`Self::set_context`].
	pub fn context(&self) -> Context {
		self.try_context().expect("historian::GATE used before GATE.set_context(...) installed a root context")
	}

	/// Ascends from the active context to the one with no parent.
	pub fn root_context(&self) -> Context {
		let mut ctx = self.context();
		while let Some(parent) = ctx.parent() {
			ctx = parent;
		}
		ctx
	}

	/// Clears the lock, resuming normal recording and playback.
	pub fn enable(&self) {
		state().locked.store(false, Ordering::SeqCst);
		trace!(target: "historian", "gate enabled");
	}

	/// Sets the lock. While locked, push/abort_push/undo/redo/save/load/clear
	/// all become no-ops returning a neutral value, and the scoped
	/// controllers skip their descent/ascent entirely.
	pub fn disable(&self) {
		state().locked.store(true, Ordering::SeqCst);
		trace!(target: "historian", "gate disabled");
	}

	/// `true` if [`Self::disable`] has been called without a matching
	/// [`Self::enable`].
	pub fn is_locked(&self) -> bool {
		state().locked.load(Ordering::SeqCst)
	}
}

#[cfg(test)]
mod tests;
