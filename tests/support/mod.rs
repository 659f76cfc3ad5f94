use historian::{Context, GATE};

/// Installs a fresh root context as the gate's active context and makes
/// sure the gate is enabled, regardless of what a previous test in this
/// binary left behind.
pub fn fresh_root() -> Context {
	GATE.enable();
	let root = Context::root();
	GATE.set_context(root.clone());
	root
}
