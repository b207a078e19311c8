pub mod account;
pub mod authoring;
pub mod boilerplate;
pub mod drag;
pub mod editor;
pub mod history;
pub mod session;
pub mod testcases;
pub mod workbench;

#[cfg(test)]
mod testing;

pub use account::AccountStats;
pub use boilerplate::{Boilerplate, BoilerplateField, LanguageBoilerplateStore};
pub use drag::{Axis, CursorHost, DragResizeController, NoopCursorHost, Point, PointerLocks, Rect};
pub use session::{ExecutionSession, Phase, SessionError};
pub use workbench::{DescriptionTab, SplitState, Workbench, WorkbenchError};
