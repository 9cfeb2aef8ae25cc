use crate::types::{EventRecord, EventType};

/// One team's offensive totals for a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BattingLine {
    pub plate_appearances: u32,
    pub at_bats: u32,
    pub hits: u32,
    pub singles: u32,
    pub doubles: u32,
    pub triples: u32,
    pub home_runs: u32,
    pub total_bases: u32,
    /// Includes intentional walks.
    pub walks: u32,
    pub intentional_walks: u32,
    pub hit_by_pitch: u32,
    pub runs: u32,
}

impl BattingLine {
    fn add(mut self, event: &EventRecord) -> Self {
        self.at_bats += u32::from(event.at_bat);
        self.hits += u32::from(event.is_hit());
        self.total_bases += u32::from(event.hit_value);
        self.runs += event.runs;
        self.walks += u32::from(event.event_type.is_walk());

        match event.event_type {
            EventType::Single => self.singles += 1,
            EventType::Double => self.doubles += 1,
            EventType::Triple => self.triples += 1,
            EventType::HomeRun => self.home_runs += 1,
            EventType::IntentionalWalk => self.intentional_walks += 1,
            EventType::HitByPitch => self.hit_by_pitch += 1,
            _ => {}
        }
        self
    }
}

/// Folds a team's batting events into its line. Empty input yields all zeros.
pub fn batting_line(events: &[&EventRecord]) -> BattingLine {
    let line = events
        .iter()
        .fold(BattingLine::default(), |line, event| line.add(event));

    BattingLine {
        plate_appearances: events
            .iter()
            .map(|e| e.plate_appearance_index + 1)
            .max()
            .unwrap_or(0),
        ..line
    }
}
