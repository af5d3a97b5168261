use std::collections::{BTreeMap, BTreeSet};

use crate::ids::{LayerId, OutputId, ShellSurfaceId, WorkspaceId};

/// A virtual desktop. Each output gets its own child layer for it.
#[derive(Debug)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub index: usize,
    pub name: String,
    pub(crate) layers: BTreeMap<OutputId, LayerId>,
}

impl Workspace {
    pub fn new(id: WorkspaceId, index: usize) -> Self {
        Self {
            id,
            index,
            name: format!("{}", index + 1),
            layers: BTreeMap::new(),
        }
    }

    pub fn mask(&self) -> u32 {
        1u32 << (self.index % 32)
    }

    pub fn layer(&self, output: OutputId) -> Option<LayerId> {
        self.layers.get(&output).copied()
    }
}

/// Result of a pager activation: every (workspace, output) pair that became
/// current, in the order listeners must see them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub changes: Vec<(WorkspaceId, OutputId)>,
    pub hidden: Vec<(WorkspaceId, OutputId)>,
}

/// Tracks which workspace each output shows.
#[derive(Debug, Default)]
pub struct Pager {
    active: BTreeMap<OutputId, WorkspaceId>,
    listeners: BTreeSet<ShellSurfaceId>,
}

impl Pager {
    pub fn active(&self, output: OutputId) -> Option<WorkspaceId> {
        self.active.get(&output).copied()
    }

    pub fn is_workspace_active(&self, workspace: WorkspaceId, output: OutputId) -> bool {
        self.active(output) == Some(workspace)
    }

    /// First output currently showing the workspace, in output creation order.
    pub fn output_of(&self, workspace: WorkspaceId) -> Option<OutputId> {
        self.active
            .iter()
            .find(|(_, ws)| **ws == workspace)
            .map(|(o, _)| *o)
    }

    /// Makes `workspace` current on `output`. If another output was showing
    /// it, that output takes over the workspace `output` had before.
    pub fn activate(&mut self, workspace: WorkspaceId, output: OutputId) -> Activation {
        let mut activation = Activation {
            changes: Vec::new(),
            hidden: Vec::new(),
        };
        let previous = self.active.get(&output).copied();
        if previous == Some(workspace) {
            return activation;
        }

        let other = self
            .active
            .iter()
            .find(|(o, ws)| **o != output && **ws == workspace)
            .map(|(o, _)| *o);

        self.active.insert(output, workspace);
        if let Some(previous) = previous {
            activation.hidden.push((previous, output));
        }
        activation.changes.push((workspace, output));

        if let (Some(other), Some(previous)) = (other, previous) {
            self.active.insert(other, previous);
            activation.hidden.push((workspace, other));
            activation.changes.push((previous, other));
        }
        activation
    }

    /// Assigns a workspace to an output that has none: the first one not shown
    /// anywhere, or the first one overall when every workspace is taken.
    pub fn assign(&mut self, output: OutputId, workspaces: &[WorkspaceId]) -> Option<Activation> {
        if self.active.contains_key(&output) {
            return None;
        }
        let free = workspaces
            .iter()
            .find(|ws| self.output_of(**ws).is_none())
            .or_else(|| workspaces.first())
            .copied()?;
        Some(self.activate(free, output))
    }

    pub fn remove_output(&mut self, output: OutputId) {
        self.active.remove(&output);
    }

    pub fn subscribe(&mut self, shell_surface: ShellSurfaceId) {
        self.listeners.insert(shell_surface);
    }

    pub fn unsubscribe(&mut self, shell_surface: ShellSurfaceId) {
        self.listeners.remove(&shell_surface);
    }

    pub fn listeners(&self) -> Vec<ShellSurfaceId> {
        self.listeners.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const O1: OutputId = OutputId::new(1);
    const O2: OutputId = OutputId::new(2);
    const A: WorkspaceId = WorkspaceId::new(10);
    const B: WorkspaceId = WorkspaceId::new(11);
    const C: WorkspaceId = WorkspaceId::new(12);

    #[test]
    fn activation_is_a_pure_query_afterwards() {
        let mut pager = Pager::default();
        pager.activate(A, O1);
        assert!(pager.is_workspace_active(A, O1));
        assert!(!pager.is_workspace_active(A, O2));
        assert!(pager.activate(A, O1).changes.is_empty());
    }

    #[test]
    fn activating_a_workspace_shown_elsewhere_swaps() {
        let mut pager = Pager::default();
        pager.activate(A, O1);
        pager.activate(B, O2);

        let activation = pager.activate(B, O1);
        assert_eq!(activation.changes, vec![(B, O1), (A, O2)]);
        assert_eq!(activation.hidden, vec![(A, O1), (B, O2)]);
        assert_eq!(pager.active(O1), Some(B));
        assert_eq!(pager.active(O2), Some(A));
    }

    #[test]
    fn assign_prefers_free_workspace() {
        let mut pager = Pager::default();
        pager.assign(O1, &[A, B, C]);
        pager.assign(O2, &[A, B, C]);
        assert_eq!(pager.active(O1), Some(A));
        assert_eq!(pager.active(O2), Some(B));
        assert!(pager.assign(O2, &[A, B, C]).is_none());

        let mut single = Pager::default();
        single.assign(O1, &[A]);
        single.assign(O2, &[A]);
        assert_eq!(single.active(O2), Some(A));
    }
}
