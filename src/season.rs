use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use rayon::prelude::*;
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::game::{GameError, GameSummary, aggregate_game};
use crate::log;
use crate::rows::{FailedGameRow, SeasonRow, StarterGameRow, TeamGameRow, starter_rows, team_rows};
use crate::types::EventRecord;

pub type EventInput = Box<dyn Read + Send>;

/// Column names of headerless `cwevent -f 0-96 -x 0-62` output, by position: the 97 standard
/// fields followed by the 63 extended ones.
pub const CWEVENT_FIELDS: [&str; 160] = [
    "GAME_ID", "AWAY_TEAM_ID", "INN_CT", "BAT_HOME_ID", "OUTS_CT", "BALLS_CT", "STRIKES_CT",
    "PITCH_SEQ_TX", "AWAY_SCORE_CT", "HOME_SCORE_CT", "BAT_ID", "BAT_HAND_CD", "RESP_BAT_ID",
    "RESP_BAT_HAND_CD", "PIT_ID", "PIT_HAND_CD", "RESP_PIT_ID", "RESP_PIT_HAND_CD",
    "POS2_FLD_ID", "POS3_FLD_ID", "POS4_FLD_ID", "POS5_FLD_ID", "POS6_FLD_ID", "POS7_FLD_ID",
    "POS8_FLD_ID", "POS9_FLD_ID", "BASE1_RUN_ID", "BASE2_RUN_ID", "BASE3_RUN_ID", "EVENT_TX",
    "LEADOFF_FL", "PH_FL", "BAT_FLD_CD", "BAT_LINEUP_ID", "EVENT_CD", "BAT_EVENT_FL", "AB_FL",
    "H_FL", "SH_FL", "SF_FL", "EVENT_OUTS_CT", "DP_FL", "TP_FL", "RBI_CT", "WP_FL", "PB_FL",
    "FLD_CD", "BATTEDBALL_CD", "BUNT_FL", "FOUL_FL", "BATTEDBALL_LOC_TX", "ERR_CT",
    "ERR1_FLD_CD", "ERR1_CD", "ERR2_FLD_CD", "ERR2_CD", "ERR3_FLD_CD", "ERR3_CD",
    "BAT_DEST_ID", "RUN1_DEST_ID", "RUN2_DEST_ID", "RUN3_DEST_ID", "BAT_PLAY_TX",
    "RUN1_PLAY_TX", "RUN2_PLAY_TX", "RUN3_PLAY_TX", "RUN1_SB_FL", "RUN2_SB_FL", "RUN3_SB_FL",
    "RUN1_CS_FL", "RUN2_CS_FL", "RUN3_CS_FL", "RUN1_PK_FL", "RUN2_PK_FL", "RUN3_PK_FL",
    "RUN1_RESP_PIT_ID", "RUN2_RESP_PIT_ID", "RUN3_RESP_PIT_ID", "GAME_NEW_FL", "GAME_END_FL",
    "PR_RUN1_FL", "PR_RUN2_FL", "PR_RUN3_FL", "REMOVED_FOR_PR_RUN1_ID",
    "REMOVED_FOR_PR_RUN2_ID", "REMOVED_FOR_PR_RUN3_ID", "REMOVED_FOR_PH_BAT_ID",
    "REMOVED_FOR_PH_BAT_FLD_CD", "PO1_FLD_CD", "PO2_FLD_CD", "PO3_FLD_CD", "ASS1_FLD_CD",
    "ASS2_FLD_CD", "ASS3_FLD_CD", "ASS4_FLD_CD", "ASS5_FLD_CD", "EVENT_ID", "HOME_TEAM_ID",
    "BAT_TEAM_ID", "FLD_TEAM_ID", "BAT_LAST_ID", "INN_NEW_FL", "INN_END_FL",
    "START_BAT_SCORE_CT", "START_FLD_SCORE_CT", "INN_RUNS_CT", "GAME_PA_CT", "INN_PA_CT",
    "PA_NEW_FL", "PA_TRUNC_FL", "START_BASES_CD", "END_BASES_CD", "BAT_START_FL",
    "RESP_BAT_START_FL", "BAT_ON_DECK_ID", "BAT_IN_HOLD_ID", "PIT_START_FL",
    "RESP_PIT_START_FL", "RUN1_FLD_CD", "RUN1_LINEUP_CD", "RUN1_ORIGIN_EVENT_ID",
    "RUN2_FLD_CD", "RUN2_LINEUP_CD", "RUN2_ORIGIN_EVENT_ID", "RUN3_FLD_CD", "RUN3_LINEUP_CD",
    "RUN3_ORIGIN_EVENT_ID", "RUN1_RESP_CAT_ID", "RUN2_RESP_CAT_ID", "RUN3_RESP_CAT_ID",
    "PA_BALL_CT", "PA_CALLED_BALL_CT", "PA_INTENT_BALL_CT", "PA_PITCHOUT_BALL_CT",
    "PA_HITBATTER_BALL_CT", "PA_OTHER_BALL_CT", "PA_STRIKE_CT", "PA_CALLED_STRIKE_CT",
    "PA_SWINGMISS_STRIKE_CT", "PA_FOUL_STRIKE_CT", "PA_INPLAY_STRIKE_CT", "PA_OTHER_STRIKE_CT",
    "EVENT_RUNS_CT", "FLD_ID", "BASE2_FORCE_FL", "BASE3_FORCE_FL", "BASE4_FORCE_FL",
    "BAT_SAFE_ERR_FL", "BAT_FATE_ID", "RUN1_FATE_ID", "RUN2_FATE_ID", "RUN3_FATE_ID",
    "FATE_RUNS_CT", "ASS6_FLD_CD", "ASS7_FLD_CD", "ASS8_FLD_CD", "ASS9_FLD_CD", "ASS10_FLD_CD",
    "UNKNOWN_OUT_EXC_FL", "UNCERTAIN_PLAY_EXC_FL",
];

/// Errors that abort a whole season file.
#[derive(Debug, thiserror::Error)]
pub enum SeasonError {
    #[error("failed to open '{path}': {source}")]
    InputStream {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to read events from '{path}': {source}")]
    Csv { path: String, source: csv::Error },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionMode {
    #[default]
    Plain,
    Zstd,
}

impl CompressionMode {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(format!(
                "Invalid compression value '{}'. Supported values: 'zstd' or NULL/omitted.",
                normalized
            ))
        }
    }
}

pub fn open_input_stream(
    path: &Path,
    compression: CompressionMode,
) -> Result<EventInput, SeasonError> {
    let input_error = |source| SeasonError::InputStream {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(input_error)?;
    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as EventInput)
            .map_err(input_error),
    }
}

/// Every event row of one season file, in file order.
#[derive(Debug, Clone)]
pub struct SeasonTable {
    pub source: String,
    pub events: Vec<EventRecord>,
}

fn is_header(record: &StringRecord) -> bool {
    record.iter().any(|field| field.eq_ignore_ascii_case("GAME_ID"))
}

impl SeasonTable {
    /// Reads a `cwevent` CSV. A first row naming `GAME_ID` is the header; without one, columns
    /// are taken in [`CWEVENT_FIELDS`] order. Columns beyond those of [`EventRecord`] are
    /// ignored.
    pub fn from_reader<R: Read>(source: &str, reader: R) -> Result<Self, SeasonError> {
        let csv_error = |source_err| SeasonError::Csv {
            path: source.to_string(),
            source: source_err,
        };
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = csv_reader.records();

        let mut events: Vec<EventRecord> = Vec::new();
        let headers = match records.next().transpose().map_err(csv_error)? {
            Some(first) if is_header(&first) => first,
            Some(first) => {
                let headers = StringRecord::from(&CWEVENT_FIELDS[..]);
                events.push(first.deserialize(Some(&headers)).map_err(csv_error)?);
                headers
            }
            None => StringRecord::new(),
        };
        for record in records {
            let record = record.map_err(csv_error)?;
            events.push(record.deserialize(Some(&headers)).map_err(csv_error)?);
        }

        Ok(Self {
            source: source.to_string(),
            events,
        })
    }

    /// Each game's rows, keyed by game id in order of first appearance.
    pub fn games(&self) -> Vec<(&str, Vec<&EventRecord>)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut games: Vec<(&str, Vec<&EventRecord>)> = Vec::new();

        for event in &self.events {
            let game_id = event.game_id.as_str();
            let slot = *index.entry(game_id).or_insert_with(|| {
                games.push((game_id, Vec::new()));
                games.len() - 1
            });
            games[slot].1.push(event);
        }

        games
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameFailure {
    pub game_id: String,
    pub error: GameError,
}

#[derive(Debug, Clone)]
pub struct SeasonOutput {
    pub source: String,
    pub summaries: Vec<GameSummary>,
    pub failures: Vec<GameFailure>,
}

impl SeasonOutput {
    /// Two rows per aggregated game, then one per failed game.
    pub fn team_rows(&self) -> Vec<SeasonRow<TeamGameRow>> {
        self.summaries
            .iter()
            .flat_map(|summary| team_rows(summary, &self.source))
            .map(SeasonRow::Game)
            .chain(self.failed_rows())
            .collect()
    }

    pub fn starter_rows(&self) -> Vec<SeasonRow<StarterGameRow>> {
        self.summaries
            .iter()
            .flat_map(|summary| starter_rows(summary, &self.source))
            .map(SeasonRow::Game)
            .chain(self.failed_rows())
            .collect()
    }

    fn failed_rows<T>(&self) -> impl Iterator<Item = SeasonRow<T>> + '_ {
        self.failures
            .iter()
            .map(|failure| SeasonRow::Failed(FailedGameRow::new(failure, &self.source)))
    }
}

/// Aggregates every game of a season in parallel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonDriver {
    /// Dedicated pool size; `None` runs on rayon's global pool.
    workers: Option<usize>,
}

impl SeasonDriver {
    pub fn new(workers: Option<usize>) -> Self {
        Self { workers }
    }

    pub fn run(&self, table: &SeasonTable) -> Result<SeasonOutput, SeasonError> {
        let games = table.games();
        let aggregate = || {
            games
                .par_iter()
                .map(|(game_id, events)| (*game_id, aggregate_game(game_id, events)))
                .collect::<Vec<_>>()
        };

        let results = match self.workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()?
                .install(aggregate),
            None => aggregate(),
        };

        let mut output = SeasonOutput {
            source: table.source.clone(),
            summaries: Vec::with_capacity(results.len()),
            failures: Vec::new(),
        };
        for (game_id, result) in results {
            match result {
                Ok(summary) => output.summaries.push(summary),
                Err(error) => {
                    log::error(format!("{}: skipping game {}: {}", table.source, game_id, error));
                    output.failures.push(GameFailure {
                        game_id: game_id.to_string(),
                        error,
                    });
                }
            }
        }

        log::info(format!(
            "{}: aggregated {} games, skipped {}",
            table.source,
            output.summaries.len(),
            output.failures.len()
        ));
        Ok(output)
    }

    pub fn run_path(
        &self,
        path: &Path,
        compression: CompressionMode,
    ) -> Result<SeasonOutput, SeasonError> {
        let input = open_input_stream(path, compression)?;
        let table = SeasonTable::from_reader(&path.display().to_string(), input)?;
        self.run(&table)
    }
}
