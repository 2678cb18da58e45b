//! Procedural generation of contracts and hiring candidates.
//!
//! Pure functions of the catalog and the random stream; no simulation
//! state is read here.

use rand::{rngs::SmallRng, Rng};
use tracing::debug;

use crate::board::{WorkItem, WorkItemIds};
use crate::content::{ArchetypeDefinition, ContentCatalog, PassiveEffectDef};
use crate::contract::{Contract, ContractId};
use crate::points::Points;
use crate::roster::{Candidate, Contributor, ContributorIds, PassiveEffect, Roster};

/// Draws a fresh contract. Every field is drawn independently of the
/// others; story titles are drawn without replacement until the template
/// pool runs out, then with replacement.
pub fn generate_contract(
    catalog: &ContentCatalog,
    ids: &mut WorkItemIds,
    id: ContractId,
    rng: &mut SmallRng,
) -> Contract {
    let (stories_min, stories_max) = catalog.contract().stories();
    let (points_min, points_max) = catalog.contract().points();
    let (sprints_min, sprints_max) = catalog.contract().sprints();
    let (payout_min, payout_max) = catalog.contract().payout();

    let story_count = rng.gen_range(stories_min..=stories_max);
    let mut title_pool: Vec<&str> = catalog.story_titles().iter().map(String::as_str).collect();

    let mut full_backlog = Vec::with_capacity(story_count as usize);
    for _ in 0..story_count {
        let title = if title_pool.is_empty() {
            let titles = catalog.story_titles();
            titles[rng.gen_range(0..titles.len())].clone()
        } else {
            title_pool
                .swap_remove(rng.gen_range(0..title_pool.len()))
                .to_string()
        };
        let points = rng.gen_range(points_min..=points_max);
        full_backlog.push(WorkItem::story(ids.next(), title, points));
    }

    let client = catalog.clients()[rng.gen_range(0..catalog.clients().len())].clone();
    let contract = Contract {
        id,
        client,
        full_backlog,
        base_payout: rng.gen_range(payout_min..=payout_max),
        total_sprints: rng.gen_range(sprints_min..=sprints_max),
        current_sprint: 1,
    };

    debug!(
        target: "burndown::generators",
        contract = %contract.id,
        client = %contract.client,
        stories = contract.full_backlog.len(),
        sprints = contract.total_sprints,
        payout = contract.base_payout,
        "contract.generated"
    );
    contract
}

/// Draws a batch of hire offers.
///
/// Archetypes come from the weighted table, avoiding in-batch duplicates on
/// a best-effort, capped-retry basis. Names are kept unique against the
/// roster and the batch, falling back to a numbered suffix once an
/// archetype's pool is drained.
pub fn generate_candidates(
    catalog: &ContentCatalog,
    roster: &Roster,
    ids: &mut ContributorIds,
    rng: &mut SmallRng,
    batch_size: usize,
    dedup_attempts: u32,
) -> Vec<Candidate> {
    let mut batch: Vec<Candidate> = Vec::with_capacity(batch_size);

    for _ in 0..batch_size {
        let archetype = pick_archetype(catalog.archetypes(), &batch, rng, dedup_attempts);
        let name = pick_name(archetype, roster, &batch, rng);
        let velocity = Points::from_f32(sample_f32(
            rng,
            archetype.velocity_min,
            archetype.velocity_max,
        ));
        let hire_cost = sample_i64(rng, archetype.hire_cost_min, archetype.hire_cost_max);
        let passive = archetype.passive.map(|def| match def {
            PassiveEffectDef::DisruptionShield { reduction } => {
                PassiveEffect::DisruptionShield { reduction }
            }
            PassiveEffectDef::VelocityBoost { bonus } => PassiveEffect::VelocityBoost {
                bonus: Points::from_f32(bonus),
            },
        });

        batch.push(Candidate {
            contributor: Contributor {
                id: ids.next(),
                name,
                archetype: archetype.id.clone(),
                velocity,
                passive,
            },
            hire_cost,
        });
    }

    debug!(
        target: "burndown::generators",
        count = batch.len(),
        "candidates.generated"
    );
    batch
}

/// Weighted draw over the archetype table. Duplicates within the batch are
/// re-rolled up to `dedup_attempts` times, then accepted rather than
/// looping forever.
fn pick_archetype<'a>(
    archetypes: &'a [ArchetypeDefinition],
    batch: &[Candidate],
    rng: &mut SmallRng,
    dedup_attempts: u32,
) -> &'a ArchetypeDefinition {
    let mut picked = weighted_pick(archetypes, rng);
    for _ in 0..dedup_attempts {
        let duplicate = batch
            .iter()
            .any(|candidate| candidate.contributor.archetype == picked.id);
        if !duplicate {
            break;
        }
        picked = weighted_pick(archetypes, rng);
    }
    picked
}

fn weighted_pick<'a>(
    archetypes: &'a [ArchetypeDefinition],
    rng: &mut SmallRng,
) -> &'a ArchetypeDefinition {
    let total: u64 = archetypes.iter().map(|a| a.weight as u64).sum();
    let mut roll = rng.gen_range(0..total.max(1));
    for archetype in archetypes {
        let weight = archetype.weight as u64;
        if roll < weight {
            return archetype;
        }
        roll -= weight;
    }
    // Only reachable when every weight is zero; the catalog rejects that.
    &archetypes[archetypes.len() - 1]
}

fn pick_name(
    archetype: &ArchetypeDefinition,
    roster: &Roster,
    batch: &[Candidate],
    rng: &mut SmallRng,
) -> String {
    let taken = |name: &str| {
        roster.contains_name(name) || batch.iter().any(|c| c.contributor.name == name)
    };

    let free: Vec<&str> = archetype
        .names
        .iter()
        .map(String::as_str)
        .filter(|name| !taken(name))
        .collect();
    if !free.is_empty() {
        return free[rng.gen_range(0..free.len())].to_string();
    }

    // Pool drained: number the fallback until it no longer collides.
    let base = &archetype.names[rng.gen_range(0..archetype.names.len())];
    let mut generation = 2u32;
    loop {
        let name = format!("{base} {generation}");
        if !taken(&name) {
            return name;
        }
        generation += 1;
    }
}

fn sample_f32(rng: &mut SmallRng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

fn sample_i64(rng: &mut SmallRng, min: i64, max: i64) -> i64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimRng;

    fn catalog() -> std::sync::Arc<ContentCatalog> {
        ContentCatalog::builtin()
    }

    fn stream(seed: u64) -> SmallRng {
        SimRng::seeded(seed).substream("generator-tests")
    }

    #[test]
    fn contract_fields_stay_within_catalog_ranges() {
        let catalog = catalog();
        let mut ids = WorkItemIds::default();

        for seed in 0..20 {
            let mut rng = stream(seed);
            let contract = generate_contract(&catalog, &mut ids, ContractId(seed + 1), &mut rng);

            let (smin, smax) = catalog.contract().stories();
            let stories = contract.full_backlog.len() as u32;
            assert!(stories >= smin && stories <= smax);

            let (pmin, pmax) = catalog.contract().points();
            for story in &contract.full_backlog {
                let points = story.points_required.to_f32();
                assert!(points >= pmin as f32 && points <= pmax as f32);
                assert_eq!(story.status, crate::board::WorkItemStatus::Backlog);
            }

            let (qmin, qmax) = catalog.contract().sprints();
            assert!(contract.total_sprints >= qmin && contract.total_sprints <= qmax);

            let (cmin, cmax) = catalog.contract().payout();
            assert!(contract.base_payout >= cmin && contract.base_payout <= cmax);
            assert_eq!(contract.current_sprint, 1);
        }
    }

    #[test]
    fn story_titles_are_unique_while_the_pool_lasts() {
        let catalog = catalog();
        let mut ids = WorkItemIds::default();
        let mut rng = stream(3);
        let contract = generate_contract(&catalog, &mut ids, ContractId(1), &mut rng);

        let mut titles: Vec<&str> = contract
            .full_backlog
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        titles.sort_unstable();
        let before = titles.len();
        titles.dedup();
        assert_eq!(titles.len(), before);
    }

    #[test]
    fn candidate_batches_have_three_offers_with_distinct_archetypes() {
        let catalog = catalog();
        let roster = Roster::default();
        let mut ids = ContributorIds::default();

        for seed in 0..20 {
            let mut rng = stream(seed);
            // A generous retry budget makes a residual duplicate wildly
            // improbable; five archetypes compete for three slots.
            let batch = generate_candidates(&catalog, &roster, &mut ids, &mut rng, 3, 64);
            assert_eq!(batch.len(), 3);

            let mut archetypes: Vec<&str> = batch
                .iter()
                .map(|c| c.contributor.archetype.as_str())
                .collect();
            archetypes.sort_unstable();
            archetypes.dedup();
            assert_eq!(archetypes.len(), 3, "seed {seed} produced duplicates");
        }
    }

    #[test]
    fn candidate_stats_respect_archetype_ranges() {
        let catalog = catalog();
        let roster = Roster::default();
        let mut ids = ContributorIds::default();
        let mut rng = stream(11);

        let batch = generate_candidates(&catalog, &roster, &mut ids, &mut rng, 3, 10);
        for candidate in &batch {
            let archetype = catalog
                .archetypes()
                .iter()
                .find(|a| a.id == candidate.contributor.archetype)
                .expect("archetype exists in catalog");
            let velocity = candidate.contributor.velocity.to_f32();
            assert!(velocity >= archetype.velocity_min - 1e-4);
            assert!(velocity <= archetype.velocity_max + 1e-4);
            assert!(candidate.hire_cost >= archetype.hire_cost_min);
            assert!(candidate.hire_cost <= archetype.hire_cost_max);
        }
    }

    #[test]
    fn candidate_names_avoid_roster_and_batch_collisions() {
        let catalog = catalog();
        let mut ids = ContributorIds::default();
        let mut roster = Roster::default();

        // Occupy every name in the catalog to force the fallback path.
        for archetype in catalog.archetypes() {
            for name in &archetype.names {
                roster.hire(Contributor {
                    id: ids.next(),
                    name: name.clone(),
                    archetype: archetype.id.clone(),
                    velocity: Points::from_f32(0.3),
                    passive: None,
                });
            }
        }

        let mut rng = stream(5);
        let batch = generate_candidates(&catalog, &roster, &mut ids, &mut rng, 3, 10);
        for candidate in &batch {
            assert!(!roster.contains_name(&candidate.contributor.name));
        }
        let mut names: Vec<&str> = batch.iter().map(|c| c.contributor.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn weighted_pick_never_selects_zero_weight_rows() {
        let json = r#"{
            "story_titles": ["a"],
            "blocker_titles": ["b"],
            "clients": ["c"],
            "archetypes": [
                {"id": "never", "label": "Never", "weight": 0,
                 "velocity_min": 0.1, "velocity_max": 0.2,
                 "hire_cost_min": 100, "hire_cost_max": 200, "names": ["X"]},
                {"id": "always", "label": "Always", "weight": 5,
                 "velocity_min": 0.1, "velocity_max": 0.2,
                 "hire_cost_min": 100, "hire_cost_max": 200, "names": ["Y", "Z", "W"]}
            ]
        }"#;
        let catalog = ContentCatalog::from_json_str(json).unwrap();
        let mut rng = stream(9);

        for _ in 0..50 {
            assert_eq!(weighted_pick(catalog.archetypes(), &mut rng).id, "always");
        }
    }
}
