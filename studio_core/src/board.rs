use std::fmt;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::points::Points;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct WorkItemId(pub u64);

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkItemKind {
    Story,
    Blocker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkItemStatus {
    Backlog,
    Queued,
    InProgress,
    Done,
}

/// A single unit of work on the board: a point-bearing story, or a
/// zero-point blocker that halts all story progress while it is live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub kind: WorkItemKind,
    pub title: String,
    pub points_required: Points,
    pub points_done: Points,
    pub status: WorkItemStatus,
}

impl WorkItem {
    pub fn story(id: WorkItemId, title: impl Into<String>, points: u32) -> Self {
        Self {
            id,
            kind: WorkItemKind::Story,
            title: title.into(),
            points_required: Points::from_u32(points),
            points_done: Points::zero(),
            status: WorkItemStatus::Backlog,
        }
    }

    /// Blockers carry no points and spawn already blocking.
    pub fn blocker(id: WorkItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            kind: WorkItemKind::Blocker,
            title: title.into(),
            points_required: Points::zero(),
            points_done: Points::zero(),
            status: WorkItemStatus::InProgress,
        }
    }

    pub fn is_story(&self) -> bool {
        self.kind == WorkItemKind::Story
    }

    pub fn is_blocker(&self) -> bool {
        self.kind == WorkItemKind::Blocker
    }

    pub fn is_done(&self) -> bool {
        self.status == WorkItemStatus::Done
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == WorkItemStatus::InProgress
    }

    /// A story is complete once its accrued points cover the requirement.
    pub fn is_complete(&self) -> bool {
        self.points_done >= self.points_required
    }

    /// Accrues progress, clamped into `[0, points_required]`.
    pub fn apply_progress(&mut self, delta: Points) {
        self.points_done = self
            .points_done
            .accrue_clamped(delta, self.points_required);
    }
}

/// Allocates ids shared by the contract generator and the disruption roll.
#[derive(Resource, Debug, Default)]
pub struct WorkItemIds {
    next: u64,
}

impl WorkItemIds {
    pub fn next(&mut self) -> WorkItemId {
        self.next += 1;
        WorkItemId(self.next)
    }
}

/// The current sprint's working set: committed stories plus live blockers.
///
/// Cleared at every sprint boundary after its state has been merged back
/// into the contract-wide backlog.
#[derive(Resource, Debug, Default, Clone)]
pub struct SprintBoard {
    pub items: Vec<WorkItem>,
}

impl SprintBoard {
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, item: WorkItem) {
        self.items.push(item);
    }

    pub fn get(&self, id: WorkItemId) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_mut(&mut self, id: WorkItemId) -> Option<&mut WorkItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn remove(&mut self, id: WorkItemId) -> Option<WorkItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn stories(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter().filter(|item| item.is_story())
    }

    pub fn in_progress_story_count(&self) -> usize {
        self.stories().filter(|item| item.is_in_progress()).count()
    }

    pub fn incomplete_story_count(&self) -> usize {
        self.stories().filter(|item| !item.is_done()).count()
    }

    pub fn active_blocker_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.is_blocker() && item.is_in_progress())
            .count()
    }

    pub fn has_active_blocker(&self) -> bool {
        self.active_blocker_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_never_exceeds_requirement() {
        let mut story = WorkItem::story(WorkItemId(1), "Wire up login", 3);
        story.status = WorkItemStatus::InProgress;

        story.apply_progress(Points::from_u32(2));
        assert!(!story.is_complete());

        story.apply_progress(Points::from_u32(5));
        assert_eq!(story.points_done, story.points_required);
        assert!(story.is_complete());
    }

    #[test]
    fn blockers_spawn_live_with_zero_points() {
        let blocker = WorkItem::blocker(WorkItemId(2), "CI is down");
        assert!(blocker.is_blocker());
        assert!(blocker.is_in_progress());
        assert!(blocker.points_required.is_zero());
    }

    #[test]
    fn board_counts_distinguish_stories_from_blockers() {
        let mut board = SprintBoard::default();
        let mut story = WorkItem::story(WorkItemId(1), "Export report", 5);
        story.status = WorkItemStatus::InProgress;
        board.push(story);
        board.push(WorkItem::blocker(WorkItemId(2), "Flaky tests"));

        assert_eq!(board.in_progress_story_count(), 1);
        assert_eq!(board.incomplete_story_count(), 1);
        assert_eq!(board.active_blocker_count(), 1);
        assert!(board.has_active_blocker());
    }

    #[test]
    fn id_allocator_is_monotonic() {
        let mut ids = WorkItemIds::default();
        let first = ids.next();
        let second = ids.next();
        assert!(second > first);
    }
}
