use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use super::{PanelCommand, PanelSnapshot};
use crate::error::{Result, TransferError};

/// Handle to a running transfer panel for sending commands and reading its state
#[derive(Debug, Clone)]
pub struct PanelHandle {
    id: Uuid,
    commands: mpsc::Sender<PanelCommand>,
    snapshots: watch::Receiver<PanelSnapshot>,
}

impl PanelHandle {
    pub(crate) fn new(
        id: Uuid,
        commands: mpsc::Sender<PanelCommand>,
        snapshots: watch::Receiver<PanelSnapshot>,
    ) -> Self {
        Self {
            id,
            commands,
            snapshots,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn send(&self, command: PanelCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TransferError::PanelClosed)
    }

    pub async fn execute(&self) -> Result<()> {
        self.send(PanelCommand::Execute).await
    }

    pub async fn retry_preview(&self) -> Result<()> {
        self.send(PanelCommand::RetryPreview).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(PanelCommand::Shutdown).await
    }

    /// The latest published state.
    pub fn snapshot(&self) -> PanelSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
        self.snapshots.clone()
    }

    /// Waits until a published state satisfies `predicate` and returns it.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&PanelSnapshot) -> bool,
    ) -> Result<PanelSnapshot> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| TransferError::PanelClosed)?;
        Ok(snapshot.clone())
    }
}
