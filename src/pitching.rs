use crate::game::GameError;
use crate::inherited::{EarnedRuns, removed_mid_inning};
use crate::innings::InningsPitched;
use crate::tenure::TenureSplit;
use crate::types::{EventRecord, EventType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PitchingLine {
    pub innings: InningsPitched,
    pub hits: u32,
    pub home_runs: u32,
    /// Includes intentional walks.
    pub walks: u32,
    pub intentional_walks: u32,
    pub hit_by_pitch: u32,
    pub strikeouts: u32,
    pub earned_runs: u32,
}

impl PitchingLine {
    /// `None` when no outs were recorded.
    pub fn era(&self) -> Option<f64> {
        self.innings.era(self.earned_runs)
    }

    pub fn whip(&self) -> Option<f64> {
        self.innings.whip(self.hits, self.walks)
    }

    fn add(mut self, event: &EventRecord) -> Self {
        self.hits += u32::from(event.is_hit());
        self.walks += u32::from(event.event_type.is_walk());
        match event.event_type {
            EventType::HomeRun => self.home_runs += 1,
            EventType::IntentionalWalk => self.intentional_walks += 1,
            EventType::HitByPitch => self.hit_by_pitch += 1,
            EventType::Strikeout => self.strikeouts += 1,
            _ => {}
        }
        self
    }

    fn from_events(events: &[&EventRecord], innings: InningsPitched, earned_runs: u32) -> Self {
        let counts = events
            .iter()
            .fold(PitchingLine::default(), |line, event| line.add(event));
        Self {
            innings,
            earned_runs,
            ..counts
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PitchingLines {
    pub starter: PitchingLine,
    pub relief: PitchingLine,
}

/// Outs recorded by a team's defence over `events`.
pub fn defensive_outs(events: &[&EventRecord]) -> u32 {
    events.iter().map(|e| e.event_outs).sum()
}

/// Outs credited to the starter, read from the state of the game when they left.
pub fn starter_outs(
    split: &TenureSplit<'_>,
    total_outs: u32,
) -> Result<InningsPitched, GameError> {
    if split.is_complete_game() {
        return Ok(InningsPitched::from_outs(total_outs));
    }

    let Some(last) = split.starter.last() else {
        return Ok(InningsPitched::default());
    };
    let innings = if removed_mid_inning(split) {
        InningsPitched::from_outs(
            last.inning.saturating_sub(1) * 3 + last.outs_before + last.event_outs,
        )
    } else {
        InningsPitched::from_whole_innings(last.inning)
    };

    if innings.outs() > total_outs {
        return Err(GameError::OutsMismatch {
            pitcher: split.starter_id.to_string(),
            starter_outs: innings.outs(),
            total_outs,
        });
    }
    Ok(innings)
}

pub fn pitching_lines(
    split: &TenureSplit<'_>,
    earned: EarnedRuns,
    total_outs: u32,
) -> Result<PitchingLines, GameError> {
    let starter_ip = starter_outs(split, total_outs)?;
    let starter = PitchingLine::from_events(&split.starter, starter_ip, earned.starter);

    let relief = if split.is_complete_game() {
        PitchingLine::default()
    } else {
        let relief_ip = InningsPitched::from_outs(total_outs) - starter_ip;
        PitchingLine::from_events(&split.relief, relief_ip, earned.relief)
    };

    Ok(PitchingLines { starter, relief })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenure::split_tenures;
    use crate::testing::{play, refs, three_up_three_down};
    use crate::types::BattingSide;

    const SIDE: BattingSide = BattingSide::Away;

    #[test]
    fn test_complete_game_takes_every_out() {
        let mut events = Vec::new();
        for inning in 1..=9 {
            events.extend(three_up_three_down(SIDE, inning, "ace00001", true));
        }
        events[4] = events[4].clone().with_event(EventType::Strikeout, "K");
        let events = refs(&events);
        let split = split_tenures("SEA", &events).unwrap();
        let total = defensive_outs(&events);

        let lines = pitching_lines(&split, EarnedRuns::default(), total).unwrap();

        assert_eq!(total, 27);
        assert_eq!(lines.starter.innings.outs(), 27);
        assert_eq!(lines.starter.strikeouts, 1);
        assert_eq!(lines.relief, PitchingLine::default());
    }

    #[test]
    fn test_mid_inning_removal_uses_outs_at_exit() {
        let mut events = Vec::new();
        for inning in 1..=5 {
            events.extend(three_up_three_down(SIDE, inning, "starter1", true));
        }
        events.push(play(SIDE, 6, "starter1").started().with_outs(0, 1));
        events.push(
            play(SIDE, 6, "starter1")
                .started()
                .with_outs(1, 0)
                .with_event(EventType::Walk, "W"),
        );
        events.push(play(SIDE, 6, "reliever").with_outs(1, 1));
        events.push(
            play(SIDE, 6, "reliever")
                .with_outs(2, 1)
                .with_event(EventType::Strikeout, "K"),
        );
        let events = refs(&events);
        let split = split_tenures("SEA", &events).unwrap();
        let total = defensive_outs(&events);

        let lines = pitching_lines(&split, EarnedRuns::default(), total).unwrap();

        assert_eq!(lines.starter.innings.thirds_notation(), 5.1);
        assert_eq!(lines.relief.innings.outs(), 2);
        assert_eq!(lines.starter.innings.outs() + lines.relief.innings.outs(), total);
        assert_eq!(lines.starter.walks, 1);
        assert_eq!(lines.relief.strikeouts, 1);
    }

    #[test]
    fn test_boundary_change_is_whole_innings() {
        let mut events = Vec::new();
        for inning in 1..=6 {
            events.extend(three_up_three_down(SIDE, inning, "starter1", true));
        }
        events.extend(three_up_three_down(SIDE, 7, "reliever", false));
        let events = refs(&events);
        let split = split_tenures("SEA", &events).unwrap();

        let ip = starter_outs(&split, defensive_outs(&events)).unwrap();
        assert_eq!(ip, InningsPitched::from_whole_innings(6));
        assert_eq!(ip.to_string(), "6.0");
    }

    #[test]
    fn test_rates_use_exact_outs() {
        let line = PitchingLine {
            innings: InningsPitched::from_outs(16),
            hits: 5,
            walks: 3,
            earned_runs: 2,
            ..PitchingLine::default()
        };
        assert!((line.era().unwrap() - 3.375).abs() < 1e-9);
        assert!((line.whip().unwrap() - 1.5).abs() < 1e-9);

        let knocked_out_early = PitchingLine {
            hits: 4,
            earned_runs: 4,
            ..PitchingLine::default()
        };
        assert_eq!(knocked_out_early.era(), None);
        assert_eq!(knocked_out_early.whip(), None);
    }

    #[test]
    fn test_starter_outs_beyond_recorded_total_is_rejected() {
        let mut events = three_up_three_down(SIDE, 1, "starter1", true);
        events.push(play(SIDE, 3, "reliever").with_outs(0, 0));
        let events = refs(&events);
        let split = split_tenures("SEA", &events).unwrap();

        let err = starter_outs(&split, 2).unwrap_err();
        assert_eq!(
            err,
            GameError::OutsMismatch {
                pitcher: "starter1".to_string(),
                starter_outs: 3,
                total_outs: 2,
            }
        );
    }
}
