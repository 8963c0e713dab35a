//! dotxt: a command-line todo-list manager over plain-text list files.
//!
//! Each list is a file under `<config>/todos/`; each line is a task
//! written in a small token mini-language:
//!
//! ```text
//! (A) write report +work @desk $due=1w $every=1m $p=page/12/100
//! ```
//!
//! The pipeline: a raw line is lexed into tokens, parsed into a typed
//! task (bad tokens revert to plain text instead of failing the file),
//! collected into a list whose cleanup keeps dense ids and an acyclic
//! parent graph, sorted with stable multi-key ordering, and rendered
//! back as colored, width-folded lines.

pub mod color;
pub mod config;
pub mod error;
pub mod list;
pub mod log;
pub mod recur;
pub mod render;
pub mod sort;
pub mod store;
pub mod task;
pub mod time;

#[doc(hidden)]
pub mod testutil;
