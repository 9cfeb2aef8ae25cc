use crate::game::GameError;
use crate::types::EventRecord;

/// One team's defensive events for a game, split between the starting pitcher and the bullpen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenureSplit<'a> {
    pub starter_id: &'a str,
    /// No event carried the started flag; the first pitcher on the mound was taken as starter.
    pub de_facto: bool,
    pub starter: Vec<&'a EventRecord>,
    pub relief: Vec<&'a EventRecord>,
}

impl TenureSplit<'_> {
    pub fn is_complete_game(&self) -> bool {
        self.relief.is_empty()
    }
}

/// Splits `events` (in game order) into starter and relief segments, preserving order in each.
pub fn split_tenures<'a>(
    team: &str,
    events: &[&'a EventRecord],
) -> Result<TenureSplit<'a>, GameError> {
    let first = *events.first().ok_or_else(|| GameError::EmptyTenure {
        team: team.to_string(),
    })?;

    if let Some(flagged) = events.iter().copied().find(|e| e.pitcher_started) {
        let (starter, relief) = events.iter().copied().partition(|e| e.pitcher_started);
        return Ok(TenureSplit {
            starter_id: flagged.pitcher_id.as_str(),
            de_facto: false,
            starter,
            relief,
        });
    }

    let starter_id = first.pitcher_id.as_str();
    let (starter, relief) = events.iter().copied().partition(|e| e.pitcher_id == starter_id);
    Ok(TenureSplit {
        starter_id,
        de_facto: true,
        starter,
        relief,
    })
}
