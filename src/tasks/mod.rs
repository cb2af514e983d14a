//! The task domain: wire model, filter predicate and the in-memory
//! collection driving both the CLI tables and the TUI board.

mod model;
mod store;

pub use model::{ParseEnumError, Priority, Status, Task, TaskDraft, TaskFilter};
pub use store::{LoadState, StoreError, TaskStore};
