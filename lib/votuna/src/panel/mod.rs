//! One transfer panel as a tokio task.
//!
//! The task owns every piece of panel state. Front ends talk to it through a [`PanelHandle`]:
//! commands go in over an mpsc channel and immutable [`PanelSnapshot`]s come back on a watch
//! channel. Remote calls run on spawned tasks and report back to the panel, which drops any
//! completion that no longer matches its state.

mod actor;
mod command;
mod handle;
mod snapshot;

pub use actor::TransferPanel;
pub use command::PanelCommand;
pub use handle::PanelHandle;
pub use snapshot::{CounterpartySnapshot, PanelSnapshot, SourceItemsSnapshot};
