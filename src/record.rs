//! A single reversible command and the sub-context it owns.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::context::Context;
use crate::memento::MementoStore;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) type StepFn = Box<dyn FnMut() -> bool + Send>;

/// One entry in a [`Context`](crate::Context) stack: a label, a captured
/// do/undo pair, a memento map, and the sub-context that holds whatever
/// gets pushed while this record's do-body is running.
///
/// Cheap to clone: internally reference-counted, the way [`Context`] is.
#[derive(Clone)]
pub struct Record(pub(crate) Arc<RecordInner>);

pub(crate) struct RecordInner {
	label: String,
	id: u64,
	do_fn: Mutex<StepFn>,
	undo_fn: Mutex<StepFn>,
	mementos: MementoStore,
	sub: Context,
}

impl Record {
	pub(crate) fn new(label: String, do_fn: StepFn, undo_fn: StepFn, owner: &Context) -> Record {
		let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
		Record(Arc::new(RecordInner {
			label,
			id,
			do_fn: Mutex::new(do_fn),
			undo_fn: Mutex::new(undo_fn),
			mementos: MementoStore::default(),
			sub: Context::new(Some(owner.downgrade())),
		}))
	}

	/// The sentinel occupying index 0 of every context's stack. Its do/undo
	/// are never invoked; it exists so `present()` always returns a valid
	/// handle and `present == 0` has a concrete record to point at.
	pub(crate) fn sentinel(owner: crate::context::WeakInner) -> Record {
		Record(Arc::new(RecordInner {
			label: "<sentinel>".to_string(),
			id: 0,
			do_fn: Mutex::new(Box::new(|| true)),
			undo_fn: Mutex::new(Box::new(|| true)),
			mementos: MementoStore::default(),
			sub: Context::new(Some(owner)),
		}))
	}

	/// Human-readable tag supplied at push time.
	pub fn label(&self) -> &str {
		&self.0.label
	}

	/// Process-unique, monotonically increasing identifier. The sentinel is
	/// always id 0; real records start at 1.
	pub fn id(&self) -> u64 {
		self.0.id
	}

	/// The context nested beneath this record, holding whatever gets pushed
	/// while this record's do-body runs.
	pub fn sub_context(&self) -> Context {
		self.0.sub.clone()
	}

	/// Invokes the stored do-closure. Called once by [`Context::push`]'s
	/// caller on first execution, and again by [`Context::redo`] every time
	/// this slot is replayed forward.
	pub fn invoke_do(&self) -> bool {
		let result = (self.0.do_fn.lock())();
		trace!(target: "historian", id = self.id(), label = self.label(), result, "record.do");
		result
	}

	/// Invokes the stored undo-closure.
	pub fn invoke_undo(&self) -> bool {
		let result = (self.0.undo_fn.lock())();
		trace!(target: "historian", id = self.id(), label = self.label(), result, "record.undo");
		result
	}

	/// Stores `value` under `key` for later retrieval by [`Self::load`].
	///
	/// A no-op (returns `false`) unless the gate is enabled and this
	/// record's sub-context is neither undoing nor redoing — saves are only
	/// meaningful during the natural first execution, which is exactly the
	/// window in which the active context (this record's sub-context, once
	/// a push/pop scope has descended into it) reports neither flag set.
	pub fn save<T: Any + Send + 'static>(&self, key: &str, value: T) -> bool {
		if crate::gate::GATE.is_locked() {
			return false;
		}
		if self.0.sub.is_undoing() || self.0.sub.is_redoing() {
			return false;
		}
		self.0.mementos.save(key, value);
		true
	}

	/// Retrieves a value saved by [`Self::save`].
	///
	/// A no-op (returns `false`) unless the gate is enabled and this
	/// record's sub-context is undoing or redoing, the key is present, and
	/// the stored value's dynamic type matches `T`. `out` is left untouched
	/// on failure.
	pub fn load<T: Any + Clone + Send + 'static>(&self, key: &str, out: &mut T) -> bool {
		if crate::gate::GATE.is_locked() {
			return false;
		}
		if !(self.0.sub.is_undoing() || self.0.sub.is_redoing()) {
			return false;
		}
		self.0.mementos.load(key, out)
	}
}

impl std::fmt::Debug for Record {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Record").field("id", &self.id()).field("label", &self.label()).finish()
	}
}
