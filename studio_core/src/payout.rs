//! Pure payout and grading functions invoked at sprint boundaries.

use serde::Serialize;

use crate::board::WorkItem;
use crate::points::Points;
use crate::resources::SimulationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportKind {
    Interim,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

/// Ranked thresholds over the completion ratio; first band that the ratio
/// reaches wins. Anything below the last band is an F.
const GRADE_BANDS: &[(f32, Grade)] = &[
    (1.0, Grade::S),
    (0.9, Grade::A),
    (0.75, Grade::B),
    (0.6, Grade::C),
    (0.4, Grade::D),
];

impl Grade {
    pub fn for_ratio(ratio: f32) -> Self {
        GRADE_BANDS
            .iter()
            .find(|(threshold, _)| ratio >= *threshold)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

/// Story/point tallies over a set of work items. Blockers never count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PointTally {
    pub stories: u32,
    pub stories_done: u32,
    pub points_total: Points,
    pub points_done: Points,
}

impl PointTally {
    pub fn over<'a>(items: impl Iterator<Item = &'a WorkItem>) -> Self {
        let mut tally = Self::default();
        for item in items.filter(|item| item.is_story()) {
            tally.stories += 1;
            tally.points_total += item.points_required;
            tally.points_done += item.points_done;
            if item.is_done() {
                tally.stories_done += 1;
            }
        }
        tally
    }

    pub fn completion_ratio(&self) -> f32 {
        self.points_done.ratio_of(self.points_total)
    }

    fn is_perfect(&self) -> bool {
        !self.points_total.is_zero() && self.points_done >= self.points_total
    }
}

/// Result of one sprint boundary. Produced exactly once per boundary and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct SprintReport {
    pub kind: ReportKind,
    pub sprint_index: u8,
    pub sprint: PointTally,
    pub contract: PointTally,
    pub blockers_dismissed: u32,
    /// Full sprint days skipped by shipping early; zero otherwise.
    pub days_remaining: u32,
    pub cash_earned: i64,
    pub perfect_bonus: i64,
    pub early_bonus: i64,
    pub grade: Grade,
}

impl SprintReport {
    pub fn total_cash(&self) -> i64 {
        self.cash_earned + self.perfect_bonus + self.early_bonus
    }
}

/// Scores a non-final sprint. No money changes hands before contract
/// close, so every cash field is zero and the grade is provisional.
pub fn interim_report(
    sprint_index: u8,
    sprint_items: &[WorkItem],
    contract_items: &[WorkItem],
    blockers_dismissed: u32,
    days_remaining: u32,
) -> SprintReport {
    let sprint = PointTally::over(sprint_items.iter());
    let contract = PointTally::over(contract_items.iter());
    SprintReport {
        kind: ReportKind::Interim,
        sprint_index,
        sprint,
        contract,
        blockers_dismissed,
        days_remaining,
        cash_earned: 0,
        perfect_bonus: 0,
        early_bonus: 0,
        grade: Grade::for_ratio(contract.completion_ratio()),
    }
}

/// Scores the contract at close.
///
/// Cash follows the payout curve `base × ratio^exponent`, so near-full
/// completion is worth disproportionately more than a straight percentage.
/// The early bonus is computed off the base payout, not the curved cash.
#[allow(clippy::too_many_arguments)]
pub fn final_report(
    sprint_index: u8,
    sprint_items: &[WorkItem],
    contract_items: &[WorkItem],
    blockers_dismissed: u32,
    days_remaining: u32,
    base_payout: i64,
    config: &SimulationConfig,
) -> SprintReport {
    let sprint = PointTally::over(sprint_items.iter());
    let contract = PointTally::over(contract_items.iter());
    let ratio = contract.completion_ratio();

    let cash_earned = curved_cash(base_payout, ratio, config.payout_curve_exponent);
    let perfect_bonus = if contract.is_perfect() {
        (base_payout as f64 * config.perfect_bonus_fraction as f64).round() as i64
    } else {
        0
    };
    let early_bonus = if days_remaining > 0 {
        (base_payout as f64 * config.early_bonus_per_day as f64 * days_remaining as f64).round()
            as i64
    } else {
        0
    };

    SprintReport {
        kind: ReportKind::Final,
        sprint_index,
        sprint,
        contract,
        blockers_dismissed,
        days_remaining,
        cash_earned,
        perfect_bonus,
        early_bonus,
        grade: Grade::for_ratio(ratio),
    }
}

fn curved_cash(base_payout: i64, ratio: f32, exponent: f32) -> i64 {
    if ratio <= 0.0 {
        return 0;
    }
    let curved = (ratio as f64).powf(exponent.max(1.0) as f64);
    (base_payout as f64 * curved).round() as i64
}
