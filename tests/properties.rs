//! Property tests for the invariants a history tree must hold regardless
//! of the specific sequence of operations driving it.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use historian::{Context, GATE};
use proptest::prelude::*;
use serial_test::serial;

mod support;

fn counter_ops(counter: Arc<AtomicI32>, delta: i32) -> (impl FnMut() -> bool + Send + 'static, impl FnMut() -> bool + Send + 'static) {
	let do_counter = counter.clone();
	let undo_counter = counter;
	let do_fn = move || {
		do_counter.fetch_add(delta, Ordering::SeqCst);
		true
	};
	let undo_fn = move || {
		undo_counter.fetch_sub(delta, Ordering::SeqCst);
		true
	};
	(do_fn, undo_fn)
}

#[test]
#[serial]
fn p1_cursor_stays_within_stack_bounds_across_a_random_walk() {
	let ctx = support::fresh_root();
	let counter = Arc::new(AtomicI32::new(0));

	// 12 pushes, interleaved undo/redo calls in a fixed but irregular
	// order, checking the cursor invariant after every step.
	for i in 0..12 {
		let (d, u) = counter_ops(counter.clone(), 1);
		ctx.push(format!("op{i}"), d, u).unwrap().invoke_do();
		assert!(ctx.present_index() <= ctx.stack_view().len() - 1);

		if i % 3 == 0 {
			ctx.undo();
			assert!(ctx.present_index() <= ctx.stack_view().len() - 1);
		}
		if i % 4 == 0 {
			ctx.redo();
			assert!(ctx.present_index() <= ctx.stack_view().len() - 1);
		}
	}
	for _ in 0..20 {
		ctx.undo();
		assert!(ctx.present_index() <= ctx.stack_view().len() - 1);
	}
	for _ in 0..20 {
		ctx.redo();
		assert!(ctx.present_index() <= ctx.stack_view().len() - 1);
	}
}

proptest! {
	#[test]
	fn p2_undo_then_redo_is_the_identity(deltas in prop::collection::vec(-20i32..20, 1..15)) {
		let _guard = historian_test_lock();
		GATE.enable();
		let ctx = Context::root();
		let counter = Arc::new(AtomicI32::new(0));

		for (i, delta) in deltas.iter().enumerate() {
			let (d, u) = counter_ops(counter.clone(), *delta);
			ctx.push(format!("op{i}"), d, u).unwrap().invoke_do();
		}
		let after_do = counter.load(Ordering::SeqCst);

		prop_assert!(ctx.undo());
		prop_assert!(ctx.redo());
		prop_assert_eq!(counter.load(Ordering::SeqCst), after_do);
	}
}

// proptest's generated closures aren't `#[serial]`-compatible directly, so
// each property test grabs the same process-wide lock `serial_test` uses
// under the hood by delegating to a tiny helper marked `#[serial]` is not
// possible from inside a macro body; instead each property test takes out
// this crate-local lock for the duration of its cases.
fn historian_test_lock() -> std::sync::MutexGuard<'static, ()> {
	static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
	match LOCK.lock() {
		Ok(guard) => guard,
		Err(poisoned) => poisoned.into_inner(),
	}
}

#[test]
#[serial]
fn p3_push_after_undo_truncates_the_redo_tail() {
	let ctx = support::fresh_root();
	let counter = Arc::new(AtomicI32::new(0));

	for i in 0..5 {
		let (d, u) = counter_ops(counter.clone(), 1);
		ctx.push(format!("op{i}"), d, u).unwrap().invoke_do();
	}
	ctx.undo();
	ctx.undo();
	assert!(ctx.peek_future().is_some());

	let (d, u) = counter_ops(counter, 1);
	ctx.push("fresh", d, u).unwrap().invoke_do();
	assert_eq!(ctx.present_index(), ctx.stack_view().len() - 1);
	assert!(ctx.peek_future().is_none());
}

#[test]
#[serial]
fn p4_push_and_save_are_no_ops_while_undoing_or_redoing() {
	let ctx = support::fresh_root();
	let push_rejected = Arc::new(AtomicUsize::new(0));
	let push_rejected_undo = push_rejected.clone();
	let save_rejected = Arc::new(AtomicUsize::new(0));
	let save_rejected_undo = save_rejected.clone();

	let cell: Arc<std::sync::OnceLock<historian::Record>> = Arc::new(std::sync::OnceLock::new());
	let do_cell = cell.clone();
	let undo_cell = cell.clone();

	let do_fn = move || {
		do_cell.get().unwrap().save("hMarker", 1i32);
		true
	};
	// Running entirely inside the PopScope Context::undo() wraps around
	// this closure: the context it sees is this record's own sub, whose
	// is_undoing() ascends to the parent and finds it mid-undo.
	let undo_fn = move || {
		let active = GATE.context();
		let (d, u) = counter_ops(Arc::new(AtomicI32::new(0)), 1);
		if active.push("nested-during-undo", d, u).is_none() {
			push_rejected_undo.fetch_add(1, Ordering::SeqCst);
		}
		if !undo_cell.get().unwrap().save("hAttemptedAgain", 2i32) {
			save_rejected_undo.fetch_add(1, Ordering::SeqCst);
		}
		true
	};

	let record = ctx.push("tracked", do_fn, undo_fn).unwrap();
	cell.set(record.clone()).ok();
	record.invoke_do();

	assert!(ctx.undo());
	assert_eq!(push_rejected.load(Ordering::SeqCst), 1, "push attempted mid-undo must be refused");
	assert_eq!(save_rejected.load(Ordering::SeqCst), 1, "save attempted mid-undo must be refused");
}

#[test]
#[serial]
fn p5_load_fails_outside_of_replay() {
	let ctx = support::fresh_root();
	let cell: Arc<std::sync::OnceLock<historian::Record>> = Arc::new(std::sync::OnceLock::new());
	let save_cell = cell.clone();
	let do_fn = move || {
		save_cell.get().unwrap().save("hValue", 42i32);
		true
	};
	let undo_fn = move || true;
	let record = ctx.push("keep", do_fn, undo_fn).unwrap();
	cell.set(record.clone()).ok();
	record.invoke_do();

	let mut out = 0i32;
	assert!(!record.load("hValue", &mut out), "load must fail outside undo/redo");
}

#[test]
#[serial]
fn p6_save_under_a_key_is_readable_under_its_undo_suffixed_name() {
	let ctx = support::fresh_root();
	let cell: Arc<std::sync::OnceLock<historian::Record>> = Arc::new(std::sync::OnceLock::new());
	let do_cell = cell.clone();
	let undo_cell = cell.clone();
	let observed: Arc<std::sync::Mutex<Option<i32>>> = Arc::new(std::sync::Mutex::new(None));
	let undo_observed = observed.clone();

	let do_fn = move || {
		do_cell.get().unwrap().save("hPayload", 99i32);
		true
	};
	let undo_fn = move || {
		let mut out = 0i32;
		if undo_cell.get().unwrap().load("hPayload_Undo", &mut out) {
			*undo_observed.lock().unwrap() = Some(out);
		}
		true
	};

	let record = ctx.push("keyed", do_fn, undo_fn).unwrap();
	cell.set(record.clone()).ok();
	record.invoke_do();

	assert!(ctx.undo());
	assert_eq!(*observed.lock().unwrap(), Some(99));
}

#[test]
#[serial]
fn p7_locked_gate_leaves_stack_and_cursor_untouched() {
	let ctx = support::fresh_root();
	let counter = Arc::new(AtomicI32::new(0));
	let (d, u) = counter_ops(counter.clone(), 1);
	ctx.push("before-lock", d, u).unwrap().invoke_do();
	let present_before = ctx.present_index();
	let len_before = ctx.stack_view().len();

	GATE.disable();
	let (d2, u2) = counter_ops(counter.clone(), 1);
	assert!(ctx.push("during-lock", d2, u2).is_none());
	assert!(!ctx.undo());
	assert!(!ctx.redo());
	assert!(ctx.present().is_none());
	assert!(ctx.peek_future().is_none());
	ctx.clear();
	GATE.enable();

	assert_eq!(ctx.present_index(), present_before);
	assert_eq!(ctx.stack_view().len(), len_before);
}

#[test]
#[serial]
fn p8_observer_fires_exactly_once_per_committed_operation() {
	let ctx = support::fresh_root();
	let fired = Arc::new(AtomicUsize::new(0));
	let observer_count = fired.clone();
	ctx.bind_on_stack_changed(move |_present| {
		observer_count.fetch_add(1, Ordering::SeqCst);
	});

	let counter = Arc::new(AtomicI32::new(0));
	let (d, u) = counter_ops(counter, 1);
	ctx.perform("tracked", d, u);
	assert_eq!(fired.load(Ordering::SeqCst), 1);

	assert!(ctx.undo());
	assert_eq!(fired.load(Ordering::SeqCst), 2);

	assert!(ctx.redo());
	assert_eq!(fired.load(Ordering::SeqCst), 3);

	ctx.clear();
	assert_eq!(fired.load(Ordering::SeqCst), 4);
}

#[test]
#[serial]
fn p9_a_do_body_that_pushes_sub_records_unwinds_as_one_outer_step() {
	let ctx = support::fresh_root();
	let sub_pushes = 3usize;

	let do_fn = move || {
		let active = GATE.context();
		for i in 0..sub_pushes {
			let (d, u) = counter_ops(Arc::new(AtomicI32::new(0)), 1);
			let record = active.push(format!("sub{i}"), d, u).unwrap();
			record.invoke_do();
		}
		true
	};
	let undo_fn = move || {
		let active = GATE.context();
		for _ in 0..sub_pushes {
			assert!(active.undo());
		}
		true
	};

	let present_before = ctx.present_index();
	assert!(ctx.perform("outer", do_fn, undo_fn));
	assert_eq!(ctx.present_index(), present_before + 1);

	let sub = ctx.present().expect("gate is enabled").sub_context();
	assert_eq!(sub.present_index(), sub_pushes);

	assert!(ctx.undo());
	assert_eq!(ctx.present_index(), present_before);
	let sub_after_undo = ctx.stack_view()[present_before + 1].sub_context();
	assert_eq!(sub_after_undo.present_index(), 0);
}
