//! Scoped controllers that switch the gate's active context on entry and
//! exit of a do- or undo-body, bracketing exactly one level of descent into
//! a record's sub-context.

mod pop;
mod push;

pub use pop::PopScope;
pub use push::PushScope;
