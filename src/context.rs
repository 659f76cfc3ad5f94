//! A node in the history tree: an ordered stack of [`Record`]s with a
//! "present" cursor, undo/redo, and the notification hook hosts use to
//! repaint an undo/redo menu.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::gate::GATE;
use crate::record::{Record, StepFn};

pub(crate) type WeakInner = Weak<ContextInner>;

/// One node of the history tree.
///
/// Cheap to clone (an `Arc` bump) — cloning a `Context` hands out another
/// handle to the same node, not a copy of its stack.
#[derive(Clone)]
pub struct Context(pub(crate) Arc<ContextInner>);

pub(crate) struct ContextInner {
	parent: Option<WeakInner>,
	stack: Mutex<Vec<Record>>,
	present: AtomicUsize,
	is_undoing: AtomicBool,
	is_redoing: AtomicBool,
	abort_requested: AtomicBool,
	observer: Mutex<Option<Box<dyn FnMut(usize) + Send>>>,
	op_lock: Mutex<()>,
}

impl Context {
	pub(crate) fn new(parent: Option<WeakInner>) -> Context {
		Context(Arc::new_cyclic(|weak_self| ContextInner {
			parent,
			stack: Mutex::new(vec![Record::sentinel(weak_self.clone())]),
			present: AtomicUsize::new(0),
			is_undoing: AtomicBool::new(false),
			is_redoing: AtomicBool::new(false),
			abort_requested: AtomicBool::new(false),
			observer: Mutex::new(None),
			op_lock: Mutex::new(()),
		}))
	}

	/// Creates a context with no parent — the base of a history tree.
	pub fn root() -> Context {
		Context::new(None)
	}

	pub(crate) fn downgrade(&self) -> WeakInner {
		Arc::downgrade(&self.0)
	}

	/// The context whose current record owns this one, if any.
	pub fn parent(&self) -> Option<Context> {
		self.0.parent.as_ref().and_then(Weak::upgrade).map(Context)
	}

	/// `true` if this context or any ancestor is currently inside `undo()`.
	pub fn is_undoing(&self) -> bool {
		let mut cur = Some(self.clone());
		while let Some(c) = cur {
			if c.0.is_undoing.load(Ordering::SeqCst) {
				return true;
			}
			cur = c.parent();
		}
		false
	}

	/// `true` if this context or any ancestor is currently inside `redo()`.
	pub fn is_redoing(&self) -> bool {
		let mut cur = Some(self.clone());
		while let Some(c) = cur {
			if c.0.is_redoing.load(Ordering::SeqCst) {
				return true;
			}
			cur = c.parent();
		}
		false
	}

	/// `true` if *this* context's own `undo()` call is in flight, ignoring
	/// ancestors. Used by [`crate::scope::PopScope`] to tell "I just ascended
	/// back into the context whose own `undo()` is driving me, which already
	/// retreats its own cursor" from "I ascended into a pass-through ancestor
	/// that needs its cursor nudged on this context's behalf".
	pub(crate) fn is_undoing_self(&self) -> bool {
		self.0.is_undoing.load(Ordering::SeqCst)
	}

	/// `true` if *this* context's own `redo()` call is in flight, ignoring
	/// ancestors. Symmetric to [`Self::is_undoing_self`], used by
	/// [`crate::scope::PushScope`].
	pub(crate) fn is_redoing_self(&self) -> bool {
		self.0.is_redoing.load(Ordering::SeqCst)
	}

	pub(crate) fn present_index(&self) -> usize {
		self.0.present.load(Ordering::SeqCst)
	}

	pub(crate) fn stack_len(&self) -> usize {
		self.0.stack.lock().len()
	}

	pub(crate) fn increment_present(&self) {
		self.0.present.fetch_add(1, Ordering::SeqCst);
	}

	pub(crate) fn decrement_present(&self) {
		self.0.present.fetch_sub(1, Ordering::SeqCst);
	}

	pub(crate) fn take_abort_requested(&self) -> bool {
		self.0.abort_requested.swap(false, Ordering::SeqCst)
	}

	pub(crate) fn fire_observer(&self) {
		let present = self.present_index();
		if let Some(cb) = self.0.observer.lock().as_mut() {
			cb(present);
		}
	}

	/// Registers a single observer, replacing any previously bound one.
	/// Fired after push, undo, redo, and clear.
	pub fn bind_on_stack_changed(&self, f: impl FnMut(usize) + Send + 'static) {
		*self.0.observer.lock() = Some(Box::new(f));
	}

	/// Clears the bound observer, if any.
	pub fn unbind_on_stack_changed(&self) {
		*self.0.observer.lock() = None;
	}

	/// The record at the present cursor, or `None` while the gate is locked.
	/// Otherwise never `None` — index 0 holds the sentinel, whose do/undo are
	/// inert.
	pub fn present(&self) -> Option<Record> {
		if GATE.is_locked() {
			return None;
		}
		let idx = self.present_index();
		Some(self.0.stack.lock()[idx].clone())
	}

	/// The record at the present cursor, ignoring the gate lock. For
	/// internal use at call sites that have already established the gate is
	/// unlocked (push/undo/redo all bail out before reaching this point).
	pub(crate) fn present_unchecked(&self) -> Record {
		let idx = self.present_index();
		self.0.stack.lock()[idx].clone()
	}

	/// The record one step ahead of present, if the redo tail is non-empty.
	/// `None` while the gate is locked, same as [`Self::present`].
	pub fn peek_future(&self) -> Option<Record> {
		if GATE.is_locked() {
			return None;
		}
		let idx = self.present_index();
		self.0.stack.lock().get(idx + 1).cloned()
	}

	/// Read-only snapshot of the full stack, sentinel included.
	pub fn stack_view(&self) -> Vec<Record> {
		self.0.stack.lock().clone()
	}

	/// Registers a reversible command: truncates any redo tail, appends a
	/// new record capturing `do_fn`/`undo_fn`, and advances the cursor onto
	/// it. Does not invoke `do_fn` — see [`Self::perform`] for the common
	/// push-then-execute sequence a generated call site follows.
	///
	/// A no-op returning `None` if the gate is locked or this context (or
	/// an ancestor) is currently undoing or redoing.
	pub fn push(
		&self,
		label: impl Into<String>,
		do_fn: impl FnMut() -> bool + Send + 'static,
		undo_fn: impl FnMut() -> bool + Send + 'static,
	) -> Option<Record> {
		if GATE.is_locked() || self.is_undoing() || self.is_redoing() {
			return None;
		}

		let do_fn: StepFn = Box::new(do_fn);
		let undo_fn: StepFn = Box::new(undo_fn);
		let record = Record::new(label.into(), do_fn, undo_fn, self);
		{
			let mut stack = self.0.stack.lock();
			let present = self.present_index();
			stack.truncate(present + 1);
			stack.push(record.clone());
		}
		self.increment_present();
		trace!(target: "historian", id = record.id(), label = record.label(), present = self.present_index(), "push");
		Some(record)
	}

	/// Pushes a record and immediately invokes its do-closure inside a
	/// [`crate::scope::PushScope`], mirroring the sequence a macro-generated
	/// call site follows. Returns the do-closure's result, or `false` if the
	/// push itself was a no-op.
	pub fn perform(
		&self,
		label: impl Into<String>,
		do_fn: impl FnMut() -> bool + Send + 'static,
		undo_fn: impl FnMut() -> bool + Send + 'static,
	) -> bool {
		let Some(record) = self.push(label, do_fn, undo_fn) else {
			return false;
		};
		let _scope = crate::scope::PushScope::new();
		record.invoke_do()
	}

	/// Removes the most recently pushed record and retreats the cursor,
	/// unwinding a push the caller has decided did nothing observable.
	/// Also marks the enclosing [`crate::scope::PushScope`]'s release as
	/// suppressed, so its normal ascend-time bookkeeping (redo-cursor
	/// advance, observer fire) does not run for a push that never
	/// completed — see the abort protocol in the module docs.
	pub fn abort_push(&self) {
		if GATE.is_locked() {
			return;
		}
		let mut stack = self.0.stack.lock();
		if stack.len() > 1 {
			stack.pop();
			drop(stack);
			self.decrement_present();
			self.0.abort_requested.store(true, Ordering::SeqCst);
			trace!(target: "historian", present = self.present_index(), "push aborted");
		}
	}

	/// Replays `stack[present]`'s undo-closure and retreats the cursor.
	/// Returns `false` with no effect if the gate is locked or nothing has
	/// been done yet. Serialized per-context by an internal mutex: a
	/// concurrent call blocks for the duration of the in-flight undo body.
	pub fn undo(&self) -> bool {
		if GATE.is_locked() {
			return false;
		}
		let _op_guard = self.0.op_lock.lock();
		let present = self.present_index();
		if present == 0 {
			return false;
		}
		let record = self.0.stack.lock()[present].clone();
		let span = tracing::trace_span!(target: "historian", "context.undo", present);
		let _entered = span.enter();
		self.0.is_undoing.store(true, Ordering::SeqCst);
		// present still points at `record` here, so the pop scope descends
		// into the right sub-context; it ascends back out before the flag
		// below is cleared, same as any nesting underneath it would.
		let result = {
			let _scope = crate::scope::PopScope::new();
			record.invoke_undo()
		};
		self.0.is_undoing.store(false, Ordering::SeqCst);
		self.decrement_present();
		self.fire_observer();
		result
	}

	/// Replays `stack[present + 1]`'s do-closure and advances the cursor.
	/// Returns `false` with no effect if the gate is locked or the redo
	/// tail is empty.
	pub fn redo(&self) -> bool {
		if GATE.is_locked() {
			return false;
		}
		let _op_guard = self.0.op_lock.lock();
		let present = self.present_index();
		let len = self.stack_len();
		if present >= len - 1 {
			return false;
		}
		let record = self.0.stack.lock()[present + 1].clone();
		let span = tracing::trace_span!(target: "historian", "context.redo", present);
		let _entered = span.enter();
		self.0.is_redoing.store(true, Ordering::SeqCst);
		// Advance the cursor before invoking so the push scope below,
		// which reads `present()` to find the sub-context, descends into
		// the record actually being redone rather than its predecessor.
		self.increment_present();
		let result = {
			let _scope = crate::scope::PushScope::new();
			record.invoke_do()
		};
		self.0.is_redoing.store(false, Ordering::SeqCst);
		self.fire_observer();
		result
	}

	/// Resets the stack to a single fresh sentinel and fires the observer.
	pub fn clear(&self) {
		if GATE.is_locked() {
			return;
		}
		*self.0.stack.lock() = vec![Record::sentinel(self.downgrade())];
		self.0.present.store(0, Ordering::SeqCst);
		trace!(target: "historian", "context cleared");
		self.fire_observer();
	}

	/// Debug rendering of the stack, recursing into each record's
	/// sub-context with one extra level of indentation.
	pub fn dump(&self, indent: usize) -> String {
		let pad = "  ".repeat(indent);
		let present = self.present_index();
		let stack = self.0.stack.lock().clone();
		let mut out = String::new();
		for (i, record) in stack.iter().enumerate() {
			let marker = if i == present { "*" } else { " " };
			out.push_str(&format!("{pad}{marker} [{}] {} (#{})\n", i, record.label(), record.id()));
			out.push_str(&record.sub_context().dump(indent + 1));
		}
		out
	}
}

impl std::fmt::Debug for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Context")
			.field("present", &self.present_index())
			.field("len", &self.stack_len())
			.field("has_parent", &self.parent().is_some())
			.finish()
	}
}
