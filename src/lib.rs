#![cfg_attr(test, allow(unused_crate_dependencies))]
#![warn(missing_docs)]
//! Tree-structured, context-scoped undo/redo command stack.
//!
//! An application records a reversible operation by pushing a `Record`
//! (label, a do-closure, an undo-closure, and a memento map) onto the
//! currently active [`Context`]. While that record's do-body runs, a
//! [`scope::PushScope`] has already descended the gate's active context
//! into the record's own sub-context, so any operation the do-body itself
//! performs is recorded one level deeper in the tree rather than flattened
//! into its parent's stack. Undoing or redoing a record replays the
//! opposite closure and lets a [`scope::PopScope`]/[`scope::PushScope`]
//! bracket the same descent for the nested operations underneath it.
//!
//! ```text
//! Context (root)                     Context (sub, owned by record #2)
//! ┌─────────────────────────┐        ┌──────────────────────────┐
//! │ stack: [sentinel,        │        │ stack: [sentinel,         │
//! │         #1 Add,          │        │         #3 RemoveObject,  │
//! │         #2 Merge] ───────┼───────►│         #4 RemoveObject,  │
//! │ present: 2                │        │         #5 SetObject]     │
//! └─────────────────────────┘        │ present: 3                │
//!                                     └──────────────────────────┘
//! ```
//!
//! Every mutating and replaying operation is a no-op while [`gate::GATE`] is
//! disabled, and every fallible operation reports failure through a `bool`
//! or `Option` return rather than a `Result` — there is nothing for a host
//! to propagate with `?`. See the module docs below for the boundary of
//! each piece.

/// A node in the history tree: an ordered stack of [`Record`]s with a
/// present cursor.
pub mod context;
/// The process-wide recording gate and active-context pointer.
pub mod gate;
mod memento;
/// A single reversible command and the sub-context it owns.
pub mod record;
/// RAII controllers that bracket a do- or undo-body.
pub mod scope;

pub use context::Context;
pub use gate::{GATE, Gate};
pub use record::Record;
pub use scope::{PopScope, PushScope};
