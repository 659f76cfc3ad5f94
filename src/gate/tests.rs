use serial_test::serial;

use super::*;
use crate::context::Context;

#[test]
#[serial]
fn set_and_get_context_round_trips() {
	let ctx = Context::root();
	GATE.set_context(ctx.clone());
	assert_eq!(GATE.context().present_index(), ctx.present_index());
	GATE.enable();
}

#[test]
#[serial]
fn root_context_ascends_to_the_parentless_node() {
	GATE.enable();
	let root = Context::root();
	GATE.set_context(root.clone());
	let sub = root.present().expect("gate is enabled").sub_context();
	GATE.set_context(sub);
	assert!(GATE.root_context().parent().is_none());
	GATE.set_context(root);
	GATE.enable();
}

#[test]
#[serial]
fn disable_sets_is_locked_and_enable_clears_it() {
	assert!(!GATE.is_locked());
	GATE.disable();
	assert!(GATE.is_locked());
	GATE.enable();
	assert!(!GATE.is_locked());
}

#[test]
#[serial]
fn try_context_is_none_style_safe_before_any_context_is_installed() {
	// try_context never panics regardless of prior test ordering; it is
	// the no-panic counterpart used internally by the scoped controllers.
	let _ = GATE.try_context();
}
