//! Flat per-team records projected from game summaries, one per team per game.

use chrono::NaiveDate;

use crate::batting::BattingLine;
use crate::game::{GameSummary, TeamSummary};
use crate::pitching::PitchingLine;
use crate::season::GameFailure;

/// Game identity columns shared by both row kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameContext {
    pub game_id: String,
    pub date: NaiveDate,
    pub team_code: String,
    pub opponent: String,
    pub is_home: bool,
    pub is_doubleheader: bool,
    pub is_tripleheader: bool,
    pub parse_warning: Option<String>,
    pub source: String,
}

impl GameContext {
    fn new(summary: &GameSummary, team: &TeamSummary, source: &str) -> Self {
        Self {
            game_id: summary.game_id.clone(),
            date: summary.date,
            team_code: team.team.clone(),
            opponent: team.opponent.clone(),
            is_home: team.is_home,
            is_doubleheader: summary.is_doubleheader,
            is_tripleheader: summary.is_tripleheader,
            parse_warning: summary.parse_warning.clone(),
            source: source.to_string(),
        }
    }
}

/// A team's batting line plus the combined line of every pitcher after its starter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamGameRow {
    pub context: GameContext,
    pub batting: BattingLine,
    pub bullpen: PitchingLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarterGameRow {
    pub context: GameContext,
    pub starter_code: String,
    pub is_de_facto: bool,
    pub line: PitchingLine,
}

/// A game that could not be aggregated. Its statistics are written as NULL with the reason in
/// `parse_warning`, so the game stays visible in either table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedGameRow {
    pub game_id: String,
    pub reason: String,
    pub source: String,
}

impl FailedGameRow {
    pub fn new(failure: &GameFailure, source: &str) -> Self {
        Self {
            game_id: failure.game_id.clone(),
            reason: format!("game not aggregated: {}", failure.error),
            source: source.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeasonRow<T> {
    Game(T),
    Failed(FailedGameRow),
}

pub fn team_rows(summary: &GameSummary, source: &str) -> [TeamGameRow; 2] {
    summary.teams().map(|team| TeamGameRow {
        context: GameContext::new(summary, team, source),
        batting: team.batting,
        bullpen: team.bullpen,
    })
}

pub fn starter_rows(summary: &GameSummary, source: &str) -> [StarterGameRow; 2] {
    summary.teams().map(|team| StarterGameRow {
        context: GameContext::new(summary, team, source),
        starter_code: team.starter.pitcher_id.clone(),
        is_de_facto: team.starter.de_facto,
        line: team.starter.line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameError, aggregate_game};
    use crate::testing::{AWAY_TEAM, GAME_ID, refs, three_up_three_down};
    use crate::types::BattingSide;

    fn summary() -> GameSummary {
        let mut events = Vec::new();
        for inning in 1..=9 {
            events.extend(three_up_three_down(BattingSide::Away, inning, "homesp01", true));
            let (pitcher, started) = if inning < 7 {
                ("awaysp01", true)
            } else {
                ("awayrp01", false)
            };
            events.extend(three_up_three_down(BattingSide::Home, inning, pitcher, started));
        }
        aggregate_game(GAME_ID, &refs(&events)).unwrap()
    }

    #[test]
    fn test_team_rows_home_first() {
        let rows = team_rows(&summary(), "all2019.csv");

        assert_eq!(rows[0].context.team_code, "NYA");
        assert!(rows[0].context.is_home);
        assert_eq!(rows[1].context.team_code, AWAY_TEAM);
        assert_eq!(rows[1].context.opponent, "NYA");
        assert_eq!(rows[1].context.source, "all2019.csv");
        assert_eq!(rows[1].bullpen.innings.outs(), 9);
        assert_eq!(rows[0].bullpen, PitchingLine::default());
    }

    #[test]
    fn test_starter_rows_carry_pitcher_identity() {
        let rows = starter_rows(&summary(), "all2019.csv");

        assert_eq!(rows[0].starter_code, "homesp01");
        assert_eq!(rows[1].starter_code, "awaysp01");
        assert!(!rows[1].is_de_facto);
        assert_eq!(rows[1].line.innings.to_string(), "6.0");
        assert_eq!(rows[0].context.game_id, GAME_ID);
    }

    #[test]
    fn test_failed_game_row_carries_reason() {
        let failure = GameFailure {
            game_id: "NYA201904010".to_string(),
            error: GameError::EmptyTenure {
                team: "NYA".to_string(),
            },
        };

        let row = FailedGameRow::new(&failure, "all2019.csv");

        assert_eq!(row.game_id, "NYA201904010");
        assert_eq!(row.reason, "game not aggregated: no defensive events for NYA");
        assert_eq!(row.source, "all2019.csv");
    }
}
