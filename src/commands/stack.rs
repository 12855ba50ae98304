// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

use crate::model::{CanvasInfo, CanvasPipeline};
use crate::selection::SelectionSet;
use crate::styles::{StyleDelta, StyleLayers};

use super::{EditActionData, EditType};

/// Where the stack is in handling a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandPhase {
    #[default]
    Idle,
    /// The before-edit handler is running
    Recording,
    /// The mutation is being applied
    Committing,
}

/// Before and after state of one pipeline touched by a command.
/// `None` means the pipeline did not exist on that side.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDelta {
    pub pipeline_id: String,
    pub before: Option<CanvasPipeline>,
    pub after: Option<CanvasPipeline>,
}

impl PipelineDelta {
    fn apply(&self, info: &mut CanvasInfo, forward: bool) {
        let target = if forward { &self.after } else { &self.before };
        match target {
            Some(pipeline) => info.upsert_pipeline(pipeline.clone()),
            None => {
                info.remove_pipeline(&self.pipeline_id);
            }
        }
    }
}

/// Pipelines that differ between two snapshots
pub fn diff_pipelines(before: &[CanvasPipeline], after: &[CanvasPipeline]) -> Vec<PipelineDelta> {
    let mut deltas = Vec::new();

    for old in before {
        let new = after.iter().find(|p| p.id == old.id);
        if new != Some(old) {
            deltas.push(PipelineDelta {
                pipeline_id: old.id.clone(),
                before: Some(old.clone()),
                after: new.cloned(),
            });
        }
    }
    for new in after {
        if !before.iter().any(|p| p.id == new.id) {
            deltas.push(PipelineDelta {
                pipeline_id: new.id.clone(),
                before: None,
                after: Some(new.clone()),
            });
        }
    }

    deltas
}

/// One recorded, reversible edit
#[derive(Debug, Clone)]
pub struct Command {
    pub data: EditActionData,
    pub label: String,
    pub deltas: Vec<PipelineDelta>,
    /// Permanent styles the edit added, removed or re-keyed
    pub style_deltas: Vec<StyleDelta>,
    pub selection_before: SelectionSet,
    pub selection_after: SelectionSet,
}

impl Command {
    pub fn edit_type(&self) -> EditType {
        self.data.edit_type()
    }

    /// Restore the state from before the edit
    pub fn revert(&self, info: &mut CanvasInfo, styles: &mut StyleLayers) {
        for delta in self.deltas.iter().rev() {
            delta.apply(info, false);
        }
        for delta in &self.style_deltas {
            styles.restore_permanent(&delta.key, delta.before.as_ref());
        }
    }

    /// Apply the edit again
    pub fn replay(&self, info: &mut CanvasInfo, styles: &mut StyleLayers) {
        for delta in &self.deltas {
            delta.apply(info, true);
        }
        for delta in &self.style_deltas {
            styles.restore_permanent(&delta.key, delta.after.as_ref());
        }
    }

    /// Ids of the pipelines this command changes
    pub fn pipeline_ids(&self) -> Vec<&str> {
        self.deltas.iter().map(|d| d.pipeline_id.as_str()).collect()
    }
}

/// Undo and redo stacks plus the reentrancy marker
#[derive(Debug, Default)]
pub struct CommandStack {
    undo: Vec<Command>,
    redo: Vec<Command>,
    phase: CommandPhase,
}

impl CommandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new command. Any redo history is discarded.
    pub fn push(&mut self, command: Command) {
        self.undo.push(command);
        self.redo.clear();
    }

    pub fn pop_undo(&mut self) -> Option<Command> {
        self.undo.pop()
    }

    pub fn pop_redo(&mut self) -> Option<Command> {
        self.redo.pop()
    }

    pub fn push_undo(&mut self, command: Command) {
        self.undo.push(command);
    }

    pub fn push_redo(&mut self, command: Command) {
        self.redo.push(command);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo.last().map(|c| c.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo.last().map(|c| c.label.as_str())
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn phase(&self) -> CommandPhase {
        self.phase
    }

    /// Switch phase, returning the previous one so it can be restored
    pub fn enter(&mut self, phase: CommandPhase) -> CommandPhase {
        std::mem::replace(&mut self.phase, phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::EditPayload;
    use crate::model::CanvasNode;
    use crate::styles::{StyleKey, StyleSpec};

    fn command(label: &str) -> Command {
        Command {
            data: EditActionData::new(
                "main",
                EditPayload::DeleteSelectedObjects {
                    object_ids: vec!["n1".into()],
                },
            ),
            label: label.into(),
            deltas: Vec::new(),
            style_deltas: Vec::new(),
            selection_before: SelectionSet::default(),
            selection_after: SelectionSet::default(),
        }
    }

    #[test]
    fn test_diff_only_changed_pipelines() {
        let a = CanvasPipeline::new("a");
        let b = CanvasPipeline::new("b");
        let mut b2 = b.clone();
        b2.nodes.push(CanvasNode::execution("n1", "N1"));
        let c = CanvasPipeline::new("c");

        let deltas = diff_pipelines(&[a.clone(), b], &[a, b2, c]);
        let ids: Vec<&str> = deltas.iter().map(|d| d.pipeline_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(deltas[1].before.is_none());
    }

    #[test]
    fn test_revert_and_replay() {
        let mut info = CanvasInfo::empty("flow", "main");
        let before = info.pipelines.clone();
        info.pipeline_mut("main")
            .unwrap()
            .nodes
            .push(CanvasNode::execution("n1", "N1"));
        info.upsert_pipeline(CanvasPipeline::new("sub"));

        let mut styles = StyleLayers::default();
        let earlier = styles.clone();
        styles.set(StyleKey::new("main", "n1"), StyleSpec::with_body("fill: red"), false);

        let mut cmd = command("Add");
        cmd.deltas = diff_pipelines(&before, &info.pipelines);
        cmd.style_deltas = styles.permanent_changes(&earlier);

        cmd.revert(&mut info, &mut styles);
        assert!(info.pipeline("main").unwrap().nodes.is_empty());
        assert!(!info.contains_pipeline("sub"));
        assert!(styles.is_empty());

        cmd.replay(&mut info, &mut styles);
        assert!(info.pipeline("main").unwrap().node("n1").is_some());
        assert!(info.contains_pipeline("sub"));
        assert_eq!(styles.len(false), 1);
    }

    #[test]
    fn test_push_clears_redo() {
        let mut stack = CommandStack::new();
        stack.push(command("first"));
        let undone = stack.pop_undo().unwrap();
        stack.push_redo(undone);
        assert_eq!(stack.redo_label(), Some("first"));

        stack.push(command("second"));
        assert!(!stack.can_redo());
        assert_eq!(stack.undo_label(), Some("second"));
    }

    #[test]
    fn test_enter_returns_previous_phase() {
        let mut stack = CommandStack::new();
        assert_eq!(stack.enter(CommandPhase::Recording), CommandPhase::Idle);
        assert_eq!(stack.enter(CommandPhase::Committing), CommandPhase::Recording);
        assert_eq!(stack.phase(), CommandPhase::Committing);
    }
}
