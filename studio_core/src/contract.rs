use std::fmt;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::board::{SprintBoard, WorkItem, WorkItemId};
use crate::points::Points;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ContractId(pub u64);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A multi-sprint unit of work with one aggregate payout, scored at close.
///
/// `full_backlog` is the superset of every story ever generated for the
/// contract; item statuses there are synchronized with the sprint board at
/// commit time and at every sprint boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub client: String,
    pub full_backlog: Vec<WorkItem>,
    pub base_payout: i64,
    pub total_sprints: u8,
    /// 1-based; never exceeds `total_sprints`.
    pub current_sprint: u8,
}

impl Contract {
    pub fn on_final_sprint(&self) -> bool {
        self.current_sprint >= self.total_sprints
    }

    pub fn backlog_item(&self, id: WorkItemId) -> Option<&WorkItem> {
        self.full_backlog.iter().find(|item| item.id == id)
    }

    pub fn backlog_item_mut(&mut self, id: WorkItemId) -> Option<&mut WorkItem> {
        self.full_backlog.iter_mut().find(|item| item.id == id)
    }

    pub fn total_points(&self) -> Points {
        self.full_backlog
            .iter()
            .filter(|item| item.is_story())
            .map(|item| item.points_required)
            .sum()
    }

    pub fn points_done(&self) -> Points {
        self.full_backlog
            .iter()
            .filter(|item| item.is_story())
            .map(|item| item.points_done)
            .sum()
    }

    /// Writes the board's story progress and statuses back into the
    /// contract-wide backlog. Blockers never enter the backlog.
    pub fn merge_board(&mut self, board: &SprintBoard) {
        for item in board.stories() {
            if let Some(entry) = self.backlog_item_mut(item.id) {
                entry.status = item.status;
                entry.points_done = item.points_done;
            }
        }
    }
}

/// The active contract, if any, plus a running count of signed contracts.
#[derive(Resource, Debug, Default, Clone)]
pub struct ContractState {
    pub active: Option<Contract>,
    pub signed: u64,
}

impl ContractState {
    pub fn active(&self) -> Option<&Contract> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Contract> {
        self.active.as_mut()
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::WorkItemStatus;

    fn contract_with_stories(points: &[u32]) -> Contract {
        Contract {
            id: ContractId(1),
            client: "Acme Analytics".to_string(),
            full_backlog: points
                .iter()
                .enumerate()
                .map(|(i, p)| WorkItem::story(WorkItemId(i as u64 + 1), format!("story {i}"), *p))
                .collect(),
            base_payout: 8_000,
            total_sprints: 2,
            current_sprint: 1,
        }
    }

    #[test]
    fn merge_board_syncs_status_and_progress() {
        let mut contract = contract_with_stories(&[5, 3]);
        let mut board = SprintBoard::default();
        let mut committed = contract.full_backlog[0].clone();
        committed.status = WorkItemStatus::InProgress;
        committed.apply_progress(Points::from_u32(2));
        board.push(committed);
        board.push(WorkItem::blocker(WorkItemId(99), "Prod incident"));

        contract.merge_board(&board);

        let merged = contract.backlog_item(WorkItemId(1)).unwrap();
        assert_eq!(merged.status, WorkItemStatus::InProgress);
        assert_eq!(merged.points_done, Points::from_u32(2));
        // The blocker stays off the backlog.
        assert!(contract.backlog_item(WorkItemId(99)).is_none());
    }

    #[test]
    fn point_totals_span_the_full_backlog() {
        let contract = contract_with_stories(&[5, 3, 2]);
        assert_eq!(contract.total_points(), Points::from_u32(10));
        assert_eq!(contract.points_done(), Points::zero());
    }

    #[test]
    fn final_sprint_detection() {
        let mut contract = contract_with_stories(&[5]);
        assert!(!contract.on_final_sprint());
        contract.current_sprint = 2;
        assert!(contract.on_final_sprint());
    }
}
