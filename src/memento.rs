//! Per-record keyed store for auxiliary values captured during the natural
//! first execution of a command and retrieved during undo or redo.

use std::any::Any;
use std::collections::HashMap;

use parking_lot::Mutex;

/// Save-once, load-many map from string key to a type-erased value.
///
/// Values live as long as the owning record. `load` verifies the dynamic
/// type before cloning a value back to the caller, so a key collision
/// between unrelated types fails closed instead of transmuting.
#[derive(Default)]
pub(crate) struct MementoStore {
	values: Mutex<HashMap<String, Box<dyn Any + Send>>>,
}

impl MementoStore {
	pub(crate) fn save<T: Any + Send + 'static>(&self, key: &str, value: T) {
		self.values.lock().insert(canonicalize_key(key).to_string(), Box::new(value));
	}

	pub(crate) fn load<T: Any + Clone + Send + 'static>(&self, key: &str, out: &mut T) -> bool {
		let values = self.values.lock();
		match values.get(canonicalize_key(key)).and_then(|v| v.downcast_ref::<T>()) {
			Some(v) => {
				*out = v.clone();
				true
			}
			None => false,
		}
	}
}

/// Strips a trailing `"_Undo"` suffix so a do-function's save and the
/// paired undo-function's load address the same slot.
fn canonicalize_key(key: &str) -> &str {
	key.strip_suffix("_Undo").unwrap_or(key)
}
