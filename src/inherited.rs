//! Earned-run attribution across a pitching change.
//!
//! A starter who leaves with runners on base is charged with those runners if they later score,
//! even though the runs cross the plate while a reliever is pitching.

use crate::advance::{Origin, ParsedAdvances, count_unearned_markers, parse_advances};
use crate::game::GameError;
use crate::log;
use crate::tenure::TenureSplit;
use crate::types::{Base, EventRecord};
use crate::warnings::ParseWarnings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EarnedRuns {
    pub starter: u32,
    pub relief: u32,
    /// Runs scored by starter-responsible runners after the change; included in `starter`.
    pub inherited: u32,
}

/// The starter's last event and the first relief event fall in the same inning.
pub fn removed_mid_inning(split: &TenureSplit<'_>) -> bool {
    match (split.starter.last(), split.relief.first()) {
        (Some(last), Some(first)) => last.inning == first.inning,
        _ => false,
    }
}

fn carries_runner_of(event: &EventRecord, pitcher_id: &str) -> bool {
    Base::ALL
        .into_iter()
        .any(|base| event.responsible_pitcher(base) == Some(pitcher_id))
}

fn report_malformed(event: &EventRecord, parsed: &ParsedAdvances, warnings: &mut ParseWarnings) {
    for malformed in &parsed.malformed {
        let msg = format!(
            "{} inning {}: {} in '{}'",
            event.game_id, event.inning, malformed, event.event_text
        );
        log::warn(&msg);
        warnings.push(&msg);
    }
}

/// Most starter-responsible runners on base at once during the inning of the change.
///
/// This can exceed the count at the first relief event: a batter walked on a count the
/// reliever inherited is charged to the starter.
fn inherited_capacity(split: &TenureSplit<'_>) -> u32 {
    let Some(first_relief) = split.relief.first() else {
        return 0;
    };
    split
        .relief
        .iter()
        .take_while(|e| e.inning == first_relief.inning)
        .map(|e| e.runners_charged_to(split.starter_id))
        .max()
        .unwrap_or(0)
        .min(Base::ALL.len() as u32)
}

/// Counts earned runs scored during relief by runners the starter left on base.
///
/// Only relief events that still carry a starter-responsible runner and score at least one run
/// are examined. The total may not exceed the most such runners on base at once in the inning
/// of the change.
pub fn inherited_runs_scored(
    split: &TenureSplit<'_>,
    warnings: &mut ParseWarnings,
) -> Result<u32, GameError> {
    let starter = split.starter_id;
    let capacity = inherited_capacity(split);

    let mut inherited = 0u32;
    for event in split
        .relief
        .iter()
        .filter(|e| e.runs > 0 && carries_runner_of(e, starter))
    {
        let parsed = parse_advances(&event.event_text);
        report_malformed(event, &parsed, warnings);

        for advance in parsed.advances.iter().filter(|a| a.is_earned_run()) {
            let charged = match advance.origin {
                Some(Origin::Base(base)) => event.responsible_pitcher(base) == Some(starter),
                Some(Origin::Implicit) => true,
                Some(Origin::Batter) | None => false,
            };
            if charged {
                inherited += 1;
            }
        }
    }

    if inherited > capacity {
        return Err(GameError::AttributionOverflow {
            pitcher: starter.to_string(),
            inherited,
            capacity,
        });
    }

    Ok(inherited)
}

/// Runs scored on `events` less the `(UR)` markers in their play text.
fn earned_in_segment(
    pitcher: &str,
    events: &[&EventRecord],
    also_deduct: u32,
) -> Result<u32, GameError> {
    let runs: u32 = events.iter().map(|e| e.runs).sum();
    let unearned: u32 = events
        .iter()
        .filter(|e| e.runs > 0)
        .map(|e| count_unearned_markers(&e.event_text))
        .sum();
    let deducted = unearned + also_deduct;

    runs.checked_sub(deducted)
        .ok_or_else(|| GameError::EarnedRunUnderflow {
            pitcher: pitcher.to_string(),
            runs,
            deducted,
        })
}

pub fn attribute_earned_runs(
    split: &TenureSplit<'_>,
    warnings: &mut ParseWarnings,
) -> Result<EarnedRuns, GameError> {
    let inherited = if removed_mid_inning(split) {
        inherited_runs_scored(split, warnings)?
    } else {
        0
    };

    let starter = earned_in_segment(split.starter_id, &split.starter, 0)? + inherited;
    let relief = match split.relief.first() {
        Some(first) => earned_in_segment(&first.pitcher_id, &split.relief, inherited)?,
        None => 0,
    };

    Ok(EarnedRuns {
        starter,
        relief,
        inherited,
    })
}
