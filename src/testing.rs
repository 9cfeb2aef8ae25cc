//! Event fixtures shared by the unit tests.

use crate::types::{Base, BattingSide, EventRecord, EventType};

pub(crate) const GAME_ID: &str = "NYA201904010";
pub(crate) const AWAY_TEAM: &str = "BOS";

/// A generic out with no runners on, no runs, and the pitcher not flagged as a starter.
pub(crate) fn play(side: BattingSide, inning: u32, pitcher: &str) -> EventRecord {
    EventRecord {
        game_id: GAME_ID.to_string(),
        away_team_id: AWAY_TEAM.to_string(),
        inning,
        batting_side: side,
        outs_before: 0,
        event_outs: 1,
        event_type: EventType::GenericOut,
        hit_value: 0,
        at_bat: true,
        plate_appearance_index: 0,
        runs: 0,
        event_text: "63".to_string(),
        pitcher_id: pitcher.to_string(),
        pitcher_started: false,
        run1_pitcher_id: None,
        run2_pitcher_id: None,
        run3_pitcher_id: None,
    }
}

impl EventRecord {
    pub(crate) fn with_outs(mut self, before: u32, recorded: u32) -> Self {
        self.outs_before = before;
        self.event_outs = recorded;
        self
    }

    /// Sets the event code and text, deriving the hit value and at-bat flag from the code.
    pub(crate) fn with_event(mut self, event_type: EventType, text: &str) -> Self {
        self.event_type = event_type;
        self.event_text = text.to_string();
        self.hit_value = match event_type {
            EventType::Single => 1,
            EventType::Double => 2,
            EventType::Triple => 3,
            EventType::HomeRun => 4,
            _ => 0,
        };
        self.at_bat = !matches!(
            event_type,
            EventType::Walk
                | EventType::IntentionalWalk
                | EventType::HitByPitch
                | EventType::StolenBase
                | EventType::WildPitch
                | EventType::Balk
        );
        if self.hit_value > 0 || self.event_type.is_walk() || event_type == EventType::HitByPitch
        {
            self.event_outs = 0;
        }
        self
    }

    pub(crate) fn with_runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    pub(crate) fn with_pa(mut self, index: u32) -> Self {
        self.plate_appearance_index = index;
        self
    }

    pub(crate) fn started(mut self) -> Self {
        self.pitcher_started = true;
        self
    }

    pub(crate) fn with_runner(mut self, base: Base, pitcher: &str) -> Self {
        let slot = match base {
            Base::First => &mut self.run1_pitcher_id,
            Base::Second => &mut self.run2_pitcher_id,
            Base::Third => &mut self.run3_pitcher_id,
        };
        *slot = Some(pitcher.to_string());
        self
    }

    pub(crate) fn in_game(mut self, game_id: &str) -> Self {
        self.game_id = game_id.to_string();
        self
    }
}

/// Three quick outs in one half-inning.
pub(crate) fn three_up_three_down(
    side: BattingSide,
    inning: u32,
    pitcher: &str,
    started: bool,
) -> Vec<EventRecord> {
    (0..3)
        .map(|outs| {
            let event = play(side, inning, pitcher).with_outs(outs, 1);
            if started { event.started() } else { event }
        })
        .collect()
}

pub(crate) fn refs(events: &[EventRecord]) -> Vec<&EventRecord> {
    events.iter().collect()
}
