// Library exports for redraft

pub mod assist;
pub mod config;
pub mod reconcile;
pub mod richtext;
pub mod selection;
pub mod surface;

// Re-export the types most callers need
pub use assist::action::EditAction;
pub use assist::generator::{GenerationError, TextGenerator};
pub use assist::session::AssistSession;
pub use selection::{FrozenSelection, SelectionTracker};
pub use surface::{DocumentEditor, SelectionRange};
