use std::fmt;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::points::Points;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ContributorId(pub u64);

impl fmt::Display for ContributorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// At most one passive effect per contributor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PassiveEffect {
    /// Multiplicative reduction applied to the disruption-roll chance.
    DisruptionShield { reduction: f32 },
    /// Additive bonus applied to the team's aggregate velocity.
    VelocityBoost { bonus: Points },
}

/// A developer on (or offered to) the studio roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub id: ContributorId,
    pub name: String,
    pub archetype: String,
    /// Work units contributed per tick.
    pub velocity: Points,
    pub passive: Option<PassiveEffect>,
}

/// Allocates contributor ids across candidate batches.
#[derive(Resource, Debug, Default)]
pub struct ContributorIds {
    next: u64,
}

impl ContributorIds {
    pub fn next(&mut self) -> ContributorId {
        self.next += 1;
        ContributorId(self.next)
    }
}

/// The hired team. Contributors are never removed once hired.
#[derive(Resource, Debug, Default, Clone)]
pub struct Roster {
    pub contributors: Vec<Contributor>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.contributors.iter().any(|c| c.name == name)
    }

    pub fn hire(&mut self, contributor: Contributor) {
        self.contributors.push(contributor);
    }

    /// Aggregate per-tick velocity: individual velocities plus any
    /// velocity-boost passives.
    pub fn aggregate_velocity(&self) -> Points {
        let base: Points = self.contributors.iter().map(|c| c.velocity).sum();
        let boost: Points = self
            .contributors
            .iter()
            .filter_map(|c| match c.passive {
                Some(PassiveEffect::VelocityBoost { bonus }) => Some(bonus),
                _ => None,
            })
            .sum();
        base + boost
    }

    /// Multiplier applied to the disruption chance: one minus the summed
    /// shield reductions, floored at zero.
    pub fn disruption_multiplier(&self) -> f32 {
        let total_reduction: f32 = self
            .contributors
            .iter()
            .filter_map(|c| match c.passive {
                Some(PassiveEffect::DisruptionShield { reduction }) => Some(reduction.max(0.0)),
                _ => None,
            })
            .sum();
        (1.0 - total_reduction).clamp(0.0, 1.0)
    }
}

/// A generated hire offer: contributor data plus the asking price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub contributor: Contributor,
    pub hire_cost: i64,
}

/// The current batch of hire offers. Replaced wholesale on refresh.
#[derive(Resource, Debug, Default, Clone)]
pub struct CandidatePool {
    pub candidates: Vec<Candidate>,
}

impl CandidatePool {
    pub fn replace(&mut self, batch: Vec<Candidate>) {
        self.candidates = batch;
    }

    pub fn take(&mut self, id: ContributorId) -> Option<Candidate> {
        let index = self
            .candidates
            .iter()
            .position(|c| c.contributor.id == id)?;
        Some(self.candidates.remove(index))
    }
}
