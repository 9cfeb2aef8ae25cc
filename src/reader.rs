use std::collections::VecDeque;
use std::error::Error;
use std::ffi::CString;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{Datelike, NaiveDate};
use duckdb::{
    core::{DataChunkHandle, Inserter, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use libduckdb_sys::duckdb_date;

use crate::batting::BattingLine;
use crate::duckdb_impl::bind_info_ffi::{
    NamedParameter, get_named_parameter_bigint, get_named_parameter_varchar,
};
use crate::log;
use crate::pitching::PitchingLine;
use crate::rows::{FailedGameRow, GameContext, SeasonRow, StarterGameRow, TeamGameRow};
use crate::season::{CompressionMode, SeasonDriver, SeasonOutput};
use crate::warnings::ParseWarnings;

const PATH_PATTERN_PARAM_INDEX: u64 = 0;
const ROWS_PER_CHUNK: usize = 2048;
/// `NaiveDate::num_days_from_ce` of 1970-01-01, DuckDB's day zero.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnType {
    Varchar,
    UInteger,
    Double,
    Boolean,
    Date,
}

impl ColumnType {
    fn to_handle(self) -> LogicalTypeHandle {
        match self {
            Self::Varchar => LogicalTypeHandle::from(LogicalTypeId::Varchar),
            Self::UInteger => LogicalTypeHandle::from(LogicalTypeId::UInteger),
            Self::Double => LogicalTypeHandle::from(LogicalTypeId::Double),
            Self::Boolean => LogicalTypeHandle::from(LogicalTypeId::Boolean),
            Self::Date => LogicalTypeHandle::from(LogicalTypeId::Date),
        }
    }
}

pub struct ColumnDef {
    name: &'static str,
    logical_type: ColumnType,
}

const fn col(name: &'static str, logical_type: ColumnType) -> ColumnDef {
    ColumnDef { name, logical_type }
}

/// Leading columns shared by both tables, in this order.
const CONTEXT_COLUMN_COUNT: usize = 7;
/// Trailing `parse_warning` and `Source` columns shared by both tables.
const TRAILER_COLUMN_COUNT: usize = 2;
const BATTING_COLUMN_COUNT: usize = 12;
/// `outs` through `ER`, between `IP` and the rates.
const PITCHING_COUNT_COLUMNS: usize = 8;
/// `IP`, the counts, `ERA` and `WHIP`.
const PITCHING_COLUMN_COUNT: usize = 1 + PITCHING_COUNT_COLUMNS + 2;

const TEAM_COLUMN_COUNT: usize =
    CONTEXT_COLUMN_COUNT + BATTING_COLUMN_COUNT + PITCHING_COLUMN_COUNT + TRAILER_COLUMN_COUNT;
const STARTER_COLUMN_COUNT: usize =
    CONTEXT_COLUMN_COUNT + 2 + PITCHING_COLUMN_COUNT + TRAILER_COLUMN_COUNT;

static TEAM_COLUMNS: [ColumnDef; TEAM_COLUMN_COUNT] = [
    col("game_id", ColumnType::Varchar),
    col("date", ColumnType::Date),
    col("team_code", ColumnType::Varchar),
    col("opponent", ColumnType::Varchar),
    col("is_home", ColumnType::Boolean),
    col("is_doubleheader", ColumnType::Boolean),
    col("is_tripleheader", ColumnType::Boolean),
    col("PA", ColumnType::UInteger),
    col("AB", ColumnType::UInteger),
    col("H", ColumnType::UInteger),
    col("1B", ColumnType::UInteger),
    col("2B", ColumnType::UInteger),
    col("3B", ColumnType::UInteger),
    col("HR", ColumnType::UInteger),
    col("TB", ColumnType::UInteger),
    col("BB", ColumnType::UInteger),
    col("IBB", ColumnType::UInteger),
    col("HBP", ColumnType::UInteger),
    col("R", ColumnType::UInteger),
    col("bullpen_IP", ColumnType::Double),
    col("bullpen_outs", ColumnType::UInteger),
    col("bullpen_H", ColumnType::UInteger),
    col("bullpen_HR", ColumnType::UInteger),
    col("bullpen_BB", ColumnType::UInteger),
    col("bullpen_IBB", ColumnType::UInteger),
    col("bullpen_HBP", ColumnType::UInteger),
    col("bullpen_K", ColumnType::UInteger),
    col("bullpen_ER", ColumnType::UInteger),
    col("bullpen_ERA", ColumnType::Double),
    col("bullpen_WHIP", ColumnType::Double),
    col("parse_warning", ColumnType::Varchar),
    col("Source", ColumnType::Varchar),
];

static STARTER_COLUMNS: [ColumnDef; STARTER_COLUMN_COUNT] = [
    col("game_id", ColumnType::Varchar),
    col("date", ColumnType::Date),
    col("team_code", ColumnType::Varchar),
    col("opponent", ColumnType::Varchar),
    col("is_home", ColumnType::Boolean),
    col("is_doubleheader", ColumnType::Boolean),
    col("is_tripleheader", ColumnType::Boolean),
    col("starter_code", ColumnType::Varchar),
    col("is_de_facto", ColumnType::Boolean),
    col("IP", ColumnType::Double),
    col("outs", ColumnType::UInteger),
    col("H", ColumnType::UInteger),
    col("HR", ColumnType::UInteger),
    col("BB", ColumnType::UInteger),
    col("IBB", ColumnType::UInteger),
    col("HBP", ColumnType::UInteger),
    col("K", ColumnType::UInteger),
    col("ER", ColumnType::UInteger),
    col("ERA", ColumnType::Double),
    col("WHIP", ColumnType::Double),
    col("parse_warning", ColumnType::Varchar),
    col("Source", ColumnType::Varchar),
];

fn batting_values(line: &BattingLine) -> [u32; BATTING_COLUMN_COUNT] {
    [
        line.plate_appearances,
        line.at_bats,
        line.hits,
        line.singles,
        line.doubles,
        line.triples,
        line.home_runs,
        line.total_bases,
        line.walks,
        line.intentional_walks,
        line.hit_by_pitch,
        line.runs,
    ]
}

/// Counting columns that follow the `IP` column.
fn pitching_values(line: &PitchingLine) -> [u32; PITCHING_COUNT_COLUMNS] {
    [
        line.innings.outs(),
        line.hits,
        line.home_runs,
        line.walks,
        line.intentional_walks,
        line.hit_by_pitch,
        line.strikeouts,
        line.earned_runs,
    ]
}

fn to_duckdb_date(date: NaiveDate) -> duckdb_date {
    duckdb_date {
        days: date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE,
    }
}

/// One of the row shapes a season can be projected into.
pub trait SeasonRowSet: 'static {
    type Row: Send + 'static;

    fn columns() -> &'static [ColumnDef];

    fn rows(output: &SeasonOutput) -> Vec<SeasonRow<Self::Row>>;

    fn context(row: &Self::Row) -> &GameContext;

    /// Writes the columns between the shared context and the trailer, returning the next
    /// column index.
    fn write_body(
        writer: &mut ChunkWriter<'_>,
        row_idx: usize,
        row: &Self::Row,
        warnings: &mut ParseWarnings,
    ) -> Result<usize, Box<dyn Error>>;
}

pub struct TeamRows;

impl SeasonRowSet for TeamRows {
    type Row = TeamGameRow;

    fn columns() -> &'static [ColumnDef] {
        &TEAM_COLUMNS
    }

    fn rows(output: &SeasonOutput) -> Vec<SeasonRow<TeamGameRow>> {
        output.team_rows()
    }

    fn context(row: &TeamGameRow) -> &GameContext {
        &row.context
    }

    fn write_body(
        writer: &mut ChunkWriter<'_>,
        row_idx: usize,
        row: &TeamGameRow,
        _warnings: &mut ParseWarnings,
    ) -> Result<usize, Box<dyn Error>> {
        let mut column = CONTEXT_COLUMN_COUNT;
        for value in batting_values(&row.batting) {
            writer.write_uinteger(column, row_idx, value);
            column += 1;
        }
        Ok(writer.write_pitching(column, row_idx, &row.bullpen))
    }
}

pub struct StarterRows;

impl SeasonRowSet for StarterRows {
    type Row = StarterGameRow;

    fn columns() -> &'static [ColumnDef] {
        &STARTER_COLUMNS
    }

    fn rows(output: &SeasonOutput) -> Vec<SeasonRow<StarterGameRow>> {
        output.starter_rows()
    }

    fn context(row: &StarterGameRow) -> &GameContext {
        &row.context
    }

    fn write_body(
        writer: &mut ChunkWriter<'_>,
        row_idx: usize,
        row: &StarterGameRow,
        warnings: &mut ParseWarnings,
    ) -> Result<usize, Box<dyn Error>> {
        let mut column = CONTEXT_COLUMN_COUNT;
        writer.write_varchar(column, row_idx, Some(row.starter_code.as_str()), warnings)?;
        column += 1;
        writer.write_boolean(column, row_idx, row.is_de_facto);
        column += 1;
        Ok(writer.write_pitching(column, row_idx, &row.line))
    }
}

#[repr(C)]
pub struct ReadSeasonBindData {
    paths: Vec<PathBuf>,
    compression: CompressionMode,
    threads: Option<usize>,
}

struct SharedState<Row> {
    next_path_idx: usize,
    pending: VecDeque<Row>,
}

#[repr(C)]
pub struct ReadSeasonInitData<Row> {
    state: Mutex<SharedState<Row>>,
}

/// `read_retrosheet_*(path, compression := ..., threads := ...)`.
pub struct ReadSeasonVTab<R>(PhantomData<R>);

fn resolve_compression_mode(bind: &BindInfo) -> Result<CompressionMode, Box<dyn Error>> {
    match get_named_parameter_varchar(bind, "compression")? {
        NamedParameter::Missing | NamedParameter::Null => Ok(CompressionMode::Plain),
        NamedParameter::Value(raw) if raw.trim().eq_ignore_ascii_case("null") => {
            Ok(CompressionMode::Plain)
        }
        NamedParameter::Value(raw) => Ok(CompressionMode::parse(&raw)?),
    }
}

fn parse_threads(raw: i64) -> Result<usize, String> {
    usize::try_from(raw)
        .ok()
        .filter(|threads| *threads > 0)
        .ok_or_else(|| {
            format!(
                "Invalid threads value {}. Supported values: a positive integer or NULL/omitted.",
                raw
            )
        })
}

fn resolve_threads(bind: &BindInfo) -> Result<Option<usize>, Box<dyn Error>> {
    match get_named_parameter_bigint(bind, "threads")? {
        NamedParameter::Missing | NamedParameter::Null => Ok(None),
        NamedParameter::Value(raw) => Ok(Some(parse_threads(raw)?)),
    }
}

fn expand_path_pattern(pattern: &str) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    if pattern.contains('*') || pattern.contains('?') {
        Ok(glob::glob(pattern)?.filter_map(|entry| entry.ok()).collect())
    } else {
        Ok(vec![PathBuf::from(pattern)])
    }
}

fn sanitize_for_cstring(value: &str, field_name: &str, warnings: &mut ParseWarnings) -> String {
    if value.contains('\0') {
        warnings.push(&format!("Sanitized interior NUL in {}", field_name));
        value.replace('\0', " ")
    } else {
        value.to_string()
    }
}

pub struct ChunkWriter<'a> {
    output: &'a mut DataChunkHandle,
    columns: &'static [ColumnDef],
    row_count: usize,
}

impl<'a> ChunkWriter<'a> {
    fn new(output: &'a mut DataChunkHandle, columns: &'static [ColumnDef]) -> Self {
        Self {
            output,
            columns,
            row_count: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.row_count >= ROWS_PER_CHUNK
    }

    fn write_row<R: SeasonRowSet>(&mut self, row: &SeasonRow<R::Row>) -> Result<(), Box<dyn Error>> {
        match row {
            SeasonRow::Game(row) => self.write_game_row::<R>(row)?,
            SeasonRow::Failed(failed) => self.write_failed_row(failed)?,
        }
        self.row_count += 1;
        Ok(())
    }

    fn write_game_row<R: SeasonRowSet>(&mut self, row: &R::Row) -> Result<(), Box<dyn Error>> {
        let row_idx = self.row_count;
        let context = R::context(row);
        let mut warnings = ParseWarnings::default();
        if let Some(warning) = context.parse_warning.as_deref() {
            warnings.push(warning);
        }

        self.write_varchar(0, row_idx, Some(context.game_id.as_str()), &mut warnings)?;
        self.write_date(1, row_idx, context.date);
        self.write_varchar(2, row_idx, Some(context.team_code.as_str()), &mut warnings)?;
        self.write_varchar(3, row_idx, Some(context.opponent.as_str()), &mut warnings)?;
        self.write_boolean(4, row_idx, context.is_home);
        self.write_boolean(5, row_idx, context.is_doubleheader);
        self.write_boolean(6, row_idx, context.is_tripleheader);

        let warning_column = R::write_body(self, row_idx, row, &mut warnings)?;
        self.write_trailer(warning_column, row_idx, &context.source, warnings)
    }

    /// Game id, NULL statistics, and the failure reason as the row's warning.
    fn write_failed_row(&mut self, failed: &FailedGameRow) -> Result<(), Box<dyn Error>> {
        let row_idx = self.row_count;
        let warning_column = self.columns.len() - TRAILER_COLUMN_COUNT;
        let mut warnings = ParseWarnings::default();
        warnings.push(&failed.reason);

        self.write_varchar(0, row_idx, Some(failed.game_id.as_str()), &mut warnings)?;
        for column in 1..warning_column {
            self.write_null(column, row_idx);
        }
        self.write_trailer(warning_column, row_idx, &failed.source, warnings)
    }

    /// `parse_warning` then `Source`; the warning is written last so it can include problems
    /// found while writing the source.
    fn write_trailer(
        &mut self,
        warning_column: usize,
        row_idx: usize,
        source: &str,
        mut warnings: ParseWarnings,
    ) -> Result<(), Box<dyn Error>> {
        self.write_varchar(warning_column + 1, row_idx, Some(source), &mut warnings)?;
        let warning = warnings.take();
        self.write_varchar(
            warning_column,
            row_idx,
            warning.as_deref(),
            &mut ParseWarnings::default(),
        )
    }

    fn set_output_len(&mut self) {
        self.output.set_len(self.row_count);
    }

    fn write_varchar(
        &mut self,
        column: usize,
        row_idx: usize,
        value: Option<&str>,
        warnings: &mut ParseWarnings,
    ) -> Result<(), Box<dyn Error>> {
        let mut vector = self.output.flat_vector(column);
        match value {
            Some(value) => {
                let sanitized = sanitize_for_cstring(value, self.columns[column].name, warnings);
                vector.insert(row_idx, CString::new(sanitized)?);
            }
            None => vector.set_null(row_idx),
        }
        Ok(())
    }

    fn write_uinteger(&mut self, column: usize, row_idx: usize, value: u32) {
        self.output.flat_vector(column).as_mut_slice::<u32>()[row_idx] = value;
    }

    fn write_double(&mut self, column: usize, row_idx: usize, value: Option<f64>) {
        match value {
            Some(value) => self.output.flat_vector(column).as_mut_slice::<f64>()[row_idx] = value,
            None => self.write_null(column, row_idx),
        }
    }

    fn write_null(&mut self, column: usize, row_idx: usize) {
        self.output.flat_vector(column).set_null(row_idx);
    }

    fn write_boolean(&mut self, column: usize, row_idx: usize, value: bool) {
        self.output.flat_vector(column).as_mut_slice::<bool>()[row_idx] = value;
    }

    fn write_date(&mut self, column: usize, row_idx: usize, value: NaiveDate) {
        self.output.flat_vector(column).as_mut_slice::<duckdb_date>()[row_idx] =
            to_duckdb_date(value);
    }

    /// Writes `IP`, the counting columns and the rates, returning the next column index.
    fn write_pitching(&mut self, start: usize, row_idx: usize, line: &PitchingLine) -> usize {
        self.write_double(start, row_idx, Some(line.innings.thirds_notation()));
        let mut column = start + 1;
        for value in pitching_values(line) {
            self.write_uinteger(column, row_idx, value);
            column += 1;
        }
        self.write_double(column, row_idx, line.era());
        self.write_double(column + 1, row_idx, line.whip());
        column + 2
    }
}

/// Claims the next unread path and aggregates it. `Ok(None)` once every path is taken.
fn load_next_season<Row>(
    init_data: &ReadSeasonInitData<Row>,
    bind_data: &ReadSeasonBindData,
) -> Result<Option<SeasonOutput>, Box<dyn Error>> {
    let driver = SeasonDriver::new(bind_data.threads);
    loop {
        let path_idx = {
            let mut state = init_data
                .state
                .lock()
                .map_err(|_| "retrosheet reader state lock poisoned")?;
            if state.next_path_idx >= bind_data.paths.len() {
                return Ok(None);
            }
            state.next_path_idx += 1;
            state.next_path_idx - 1
        };

        let path = &bind_data.paths[path_idx];
        match driver.run_path(path, bind_data.compression) {
            Ok(output) => return Ok(Some(output)),
            Err(err) => {
                if bind_data.paths.len() == 1 {
                    return Err(err.into());
                }
                log::warn(format!("skipping season file: {}", err));
            }
        }
    }
}

fn next_row<Row>(
    init_data: &ReadSeasonInitData<Row>,
) -> Result<Option<Row>, Box<dyn Error>> {
    let mut state = init_data
        .state
        .lock()
        .map_err(|_| "retrosheet reader state lock poisoned")?;
    Ok(state.pending.pop_front())
}

impl<R: SeasonRowSet> VTab for ReadSeasonVTab<R> {
    type InitData = ReadSeasonInitData<SeasonRow<R::Row>>;
    type BindData = ReadSeasonBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let pattern = bind.get_parameter(PATH_PATTERN_PARAM_INDEX).to_string();
        let compression = resolve_compression_mode(bind)?;
        let threads = resolve_threads(bind)?;
        let paths = expand_path_pattern(&pattern)?;

        for column in R::columns() {
            bind.add_result_column(column.name, column.logical_type.to_handle());
        }

        Ok(ReadSeasonBindData {
            paths,
            compression,
            threads,
        })
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(ReadSeasonInitData {
            state: Mutex::new(SharedState {
                next_path_idx: 0,
                pending: VecDeque::new(),
            }),
        })
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn Error>> {
        let init_data = func.get_init_data();
        let bind_data = func.get_bind_data();
        let mut chunk_writer = ChunkWriter::new(output, R::columns());

        while !chunk_writer.is_full() {
            if let Some(row) = next_row(init_data)? {
                chunk_writer.write_row::<R>(&row)?;
                continue;
            }

            let Some(season) = load_next_season(init_data, bind_data)? else {
                break;
            };
            let rows = R::rows(&season);
            init_data
                .state
                .lock()
                .map_err(|_| "retrosheet reader state lock poisoned")?
                .pending
                .extend(rows);
        }

        chunk_writer.set_output_len();
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![
            LogicalTypeHandle::from(LogicalTypeId::Varchar), // path or glob pattern
        ])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![
            (
                "compression".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ),
            (
                "threads".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Bigint),
            ),
        ])
    }
}
