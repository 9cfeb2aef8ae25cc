use chrono::NaiveDate;

use crate::batting::{BattingLine, batting_line};
use crate::inherited::attribute_earned_runs;
use crate::pitching::{PitchingLine, defensive_outs, pitching_lines};
use crate::tenure::split_tenures;
use crate::types::{BattingSide, EventRecord, GameId, GameIdError};
use crate::warnings::ParseWarnings;

/// Reasons a single game cannot be aggregated; such games are reported with NULL statistics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    MalformedGameId(#[from] GameIdError),

    #[error("no defensive events for {team}")]
    EmptyTenure { team: String },

    #[error(
        "{inherited} inherited runs charged to {pitcher}, but only {capacity} of their runners were on base at the change"
    )]
    AttributionOverflow {
        pitcher: String,
        inherited: u32,
        capacity: u32,
    },

    #[error("earned runs for {pitcher} would be negative ({runs} runs, {deducted} deducted)")]
    EarnedRunUnderflow {
        pitcher: String,
        runs: u32,
        deducted: u32,
    },

    #[error("{pitcher} credited with {starter_outs} outs but the defence recorded {total_outs}")]
    OutsMismatch {
        pitcher: String,
        starter_outs: u32,
        total_outs: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarterLine {
    pub pitcher_id: String,
    pub de_facto: bool,
    pub line: PitchingLine,
}

/// One team's view of a game: its offence and the pitching it used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSummary {
    pub team: String,
    pub opponent: String,
    pub is_home: bool,
    pub batting: BattingLine,
    pub starter: StarterLine,
    pub bullpen: PitchingLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub game_id: String,
    pub date: NaiveDate,
    pub is_doubleheader: bool,
    pub is_tripleheader: bool,
    pub home: TeamSummary,
    pub away: TeamSummary,
    /// Non-fatal notation problems found while attributing runs.
    pub parse_warning: Option<String>,
}

impl GameSummary {
    pub fn teams(&self) -> [&TeamSummary; 2] {
        [&self.home, &self.away]
    }
}

fn team_summary(
    team: &str,
    opponent: &str,
    batting_side: BattingSide,
    events: &[&EventRecord],
    warnings: &mut ParseWarnings,
) -> Result<TeamSummary, GameError> {
    let (batting, fielding): (Vec<&EventRecord>, Vec<&EventRecord>) = events
        .iter()
        .copied()
        .partition(|e| e.batting_side == batting_side);

    let split = split_tenures(team, &fielding)?;
    let earned = attribute_earned_runs(&split, warnings)?;
    let lines = pitching_lines(&split, earned, defensive_outs(&fielding))?;

    Ok(TeamSummary {
        team: team.to_string(),
        opponent: opponent.to_string(),
        is_home: batting_side == BattingSide::Home,
        batting: batting_line(&batting),
        starter: StarterLine {
            pitcher_id: split.starter_id.to_string(),
            de_facto: split.de_facto,
            line: lines.starter,
        },
        bullpen: lines.relief,
    })
}

/// Rebuilds one game's team and pitching lines from its play-by-play rows, in source order.
pub fn aggregate_game(game_id: &str, events: &[&EventRecord]) -> Result<GameSummary, GameError> {
    let id = GameId::parse(game_id)?;
    let away_team = events
        .first()
        .map(|e| e.away_team_id.trim().to_string())
        .unwrap_or_default();

    let mut warnings = ParseWarnings::default();
    let home = team_summary(
        &id.home_team,
        &away_team,
        BattingSide::Home,
        events,
        &mut warnings,
    )?;
    let away = team_summary(
        &away_team,
        &id.home_team,
        BattingSide::Away,
        events,
        &mut warnings,
    )?;

    Ok(GameSummary {
        game_id: game_id.trim().to_string(),
        date: id.date,
        is_doubleheader: id.is_doubleheader(),
        is_tripleheader: id.is_tripleheader(),
        home,
        away,
        parse_warning: warnings.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AWAY_TEAM, GAME_ID, play, refs, three_up_three_down};
    use crate::types::{Base, EventType};

    const HOME_ACE: &str = "homeace1";
    const AWAY_ACE: &str = "awayace1";

    /// Nine quiet innings each way; home pitchers face away batters.
    fn quiet_game() -> Vec<EventRecord> {
        let mut events = Vec::new();
        for inning in 1..=9 {
            events.extend(three_up_three_down(BattingSide::Away, inning, HOME_ACE, true));
            events.extend(three_up_three_down(BattingSide::Home, inning, AWAY_ACE, true));
        }
        events
    }

    fn batting_outs(events: &[EventRecord], side: BattingSide) -> u32 {
        events
            .iter()
            .filter(|e| e.batting_side == side)
            .map(|e| e.event_outs)
            .sum()
    }

    /// Away starter leaves with one out in the 6th and a runner on first, who scores.
    fn away_starter_pulled() -> Vec<EventRecord> {
        let mut events = Vec::new();
        for inning in 1..=9 {
            events.extend(three_up_three_down(BattingSide::Away, inning, HOME_ACE, true));
            if inning < 6 {
                events.extend(three_up_three_down(BattingSide::Home, inning, AWAY_ACE, true));
            } else if inning == 6 {
                let side = BattingSide::Home;
                events.push(play(side, 6, AWAY_ACE).started().with_outs(0, 1).with_pa(50));
                events.push(
                    play(side, 6, AWAY_ACE)
                        .started()
                        .with_outs(1, 0)
                        .with_event(EventType::Single, "S8")
                        .with_pa(51),
                );
                events.push(
                    play(side, 6, "awayrp01")
                        .with_outs(1, 0)
                        .with_event(EventType::Double, "D7.1-H")
                        .with_runner(Base::First, AWAY_ACE)
                        .with_runs(1)
                        .with_pa(52),
                );
                events.push(play(side, 6, "awayrp01").with_outs(1, 1).with_pa(53));
                events.push(play(side, 6, "awayrp01").with_outs(2, 1).with_pa(54));
            } else {
                events.extend(three_up_three_down(BattingSide::Home, inning, "awayrp01", false));
            }
        }
        events
    }

    #[test]
    fn test_complete_game_earned_runs_less_unearned() {
        let mut events = quiet_game();
        events.insert(
            10,
            play(BattingSide::Away, 4, HOME_ACE)
                .started()
                .with_outs(0, 0)
                .with_event(EventType::FieldingError, "E6.3-H(UR);2-H")
                .with_runs(2),
        );

        let summary = aggregate_game(GAME_ID, &refs(&events)).unwrap();

        let home = &summary.home;
        assert_eq!(home.starter.pitcher_id, HOME_ACE);
        assert_eq!(home.starter.line.earned_runs, 1);
        assert_eq!(home.starter.line.innings.outs(), 27);
        assert_eq!(home.bullpen, PitchingLine::default());
        assert_eq!(summary.away.batting.runs, 2);
        assert!(summary.parse_warning.is_none());
    }

    #[test]
    fn test_game_identity_fields() {
        let summary = aggregate_game(GAME_ID, &refs(&quiet_game())).unwrap();

        assert_eq!(summary.game_id, GAME_ID);
        assert_eq!(summary.date, NaiveDate::from_ymd_opt(2019, 4, 1).unwrap());
        assert!(!summary.is_doubleheader);
        assert_eq!(summary.home.team, "NYA");
        assert_eq!(summary.home.opponent, AWAY_TEAM);
        assert!(summary.home.is_home);
        assert_eq!(summary.away.team, AWAY_TEAM);
        assert!(!summary.away.is_home);
    }

    #[test]
    fn test_doubleheader_flag_from_game_number() {
        let events: Vec<_> = quiet_game()
            .into_iter()
            .map(|e| e.in_game("NYA201904012"))
            .collect();
        let summary = aggregate_game("NYA201904012", &refs(&events)).unwrap();
        assert!(summary.is_doubleheader);
        assert!(!summary.is_tripleheader);
    }

    #[test]
    fn test_outs_are_conserved_between_batting_and_pitching() {
        let events = away_starter_pulled();
        let summary = aggregate_game(GAME_ID, &refs(&events)).unwrap();

        for (team, batting_side) in [
            (&summary.home, BattingSide::Away),
            (&summary.away, BattingSide::Home),
        ] {
            assert_eq!(
                team.starter.line.innings.outs() + team.bullpen.innings.outs(),
                batting_outs(&events, batting_side)
            );
        }
    }

    #[test]
    fn test_inherited_runner_charged_to_starter() {
        let summary = aggregate_game(GAME_ID, &refs(&away_starter_pulled())).unwrap();

        let away = &summary.away;
        assert_eq!(away.starter.line.innings.thirds_notation(), 5.1);
        assert_eq!(away.starter.line.earned_runs, 1);
        assert_eq!(away.starter.line.hits, 1);
        assert_eq!(away.bullpen.earned_runs, 0);
        assert_eq!(away.bullpen.hits, 1);
        assert_eq!(away.bullpen.innings.to_string(), "3.2");
        assert_eq!(summary.home.batting.runs, 1);
        assert_eq!(summary.home.batting.plate_appearances, 55);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let events = away_starter_pulled();
        let events = refs(&events);
        assert_eq!(
            aggregate_game(GAME_ID, &events).unwrap(),
            aggregate_game(GAME_ID, &events).unwrap()
        );
    }

    #[test]
    fn test_de_facto_starter_when_no_flag() {
        let events: Vec<_> = quiet_game()
            .into_iter()
            .map(|mut e| {
                e.pitcher_started = false;
                e
            })
            .collect();

        let summary = aggregate_game(GAME_ID, &refs(&events)).unwrap();

        assert!(summary.home.starter.de_facto);
        assert_eq!(summary.home.starter.pitcher_id, HOME_ACE);
        assert_eq!(summary.home.starter.line.innings.outs(), 27);
    }

    #[test]
    fn test_malformed_tokens_carried_as_warning() {
        let mut events = away_starter_pulled();
        let scoring = events
            .iter_mut()
            .find(|e| e.event_text == "D7.1-H")
            .unwrap();
        scoring.event_text = "D7.1-H;9-H".to_string();

        let summary = aggregate_game(GAME_ID, &refs(&events)).unwrap();

        let warning = summary.parse_warning.unwrap();
        assert!(warning.contains("malformed advance token '9-H'"));
        assert_eq!(summary.away.starter.line.earned_runs, 1);
    }

    #[test]
    fn test_bad_game_id_fails_the_game() {
        let err = aggregate_game("NYA2019", &refs(&quiet_game())).unwrap_err();
        assert!(matches!(err, GameError::MalformedGameId(_)));
    }

    #[test]
    fn test_one_sided_game_fails_with_empty_tenure() {
        let events = three_up_three_down(BattingSide::Away, 1, HOME_ACE, true);
        let err = aggregate_game(GAME_ID, &refs(&events)).unwrap_err();
        assert_eq!(
            err,
            GameError::EmptyTenure {
                team: AWAY_TEAM.to_string()
            }
        );
    }
}
