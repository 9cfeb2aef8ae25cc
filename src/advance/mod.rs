//! Baserunner advancement notation (`EVENT_TX`).
//!
//! Grammar of the advancement section (the text after the first `.`, or the whole text when
//! there is none):
//!
//! ```text
//! section   := token (';' token)*
//! token     := advance | out | implicit | play
//! advance   := origin '-' dest qualifier*       origin := 'B' | '1' | '2' | '3'
//! out       := <anything containing 'X'>         dest   := '1' | '2' | '3' | 'H' ...
//! implicit  := <no '-', ends with 'H'>           e.g. SBH (steal of home)
//! play      := <no '-', does not end with 'H'>   the primary play text, e.g. S8
//! qualifier := '(' ... ')'                       '(UR)' marks an unearned run
//! ```
//!
//! Tokens containing `-` that fit none of the shapes are reported as [`MalformedToken`] and
//! otherwise ignored.

use std::error::Error;
use std::sync::LazyLock;

use ::duckdb::vtab::arrow::WritableVector;
use ::duckdb::{
    Result,
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vscalar::{ScalarFunctionSignature, VScalar},
};
use regex::Regex;
use smallvec::SmallVec;

use crate::duckdb_impl::scalar::{
    invoke_unary_varchar_to_i64_default, invoke_unary_varchar_to_varchar,
};
use crate::types::Base;

mod json;

static ADVANCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([B123])-([123H])").expect("valid advance regex"));

static UNEARNED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(UR\)").expect("valid unearned marker regex"));

pub struct RetrosheetAdvancesJsonScalar;

impl VScalar for RetrosheetAdvancesJsonScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |event_text| {
            let parsed = parse_advances(event_text);
            Ok(json::advances_to_json(event_text, &parsed))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )]
    }
}

pub struct RetrosheetUnearnedRunsScalar;

impl VScalar for RetrosheetUnearnedRunsScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_i64_default(input, output, 0, |event_text| {
            i64::from(count_unearned_markers(event_text))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
            LogicalTypeHandle::from(LogicalTypeId::Bigint),
        )]
    }
}

/// Where the runner of an advance started the play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Batter,
    Base(Base),
    /// Scoring token without an explicit origin (`SBH`); the origin is implied by the play.
    Implicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoRun,
    RunnerOut,
    RunScored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub token: String,
    pub origin: Option<Origin>,
    pub outcome: Outcome,
    pub unearned: bool,
}

impl Advance {
    pub fn is_earned_run(&self) -> bool {
        self.outcome == Outcome::RunScored && !self.unearned
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed advance token '{token}': {reason}")]
pub struct MalformedToken {
    pub token: String,
    pub reason: &'static str,
}

pub type AdvanceList = SmallVec<[Advance; 4]>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAdvances {
    pub advances: AdvanceList,
    pub malformed: SmallVec<[MalformedToken; 1]>,
}

impl ParsedAdvances {
    /// Scoring tokens without the `(UR)` marker.
    pub fn earned_runs(&self) -> u32 {
        self.advances.iter().filter(|a| a.is_earned_run()).count() as u32
    }
}

/// The part of `EVENT_TX` that lists runner movement.
pub fn advance_section(event_text: &str) -> &str {
    match event_text.split_once('.') {
        Some((_, advances)) => advances,
        None => event_text,
    }
}

pub fn parse_advance(token: &str) -> Result<Advance, MalformedToken> {
    let token = token.trim();
    let unearned = UNEARNED_RE.is_match(token);

    let (origin, outcome) = if token.contains('X') {
        (token.chars().next().and_then(origin_from_char), Outcome::RunnerOut)
    } else if let Some(caps) = ADVANCE_RE.captures(token) {
        let origin = caps[1].chars().next().and_then(origin_from_char);
        let outcome = if &caps[2] == "H" {
            Outcome::RunScored
        } else {
            Outcome::NoRun
        };
        (origin, outcome)
    } else if token.contains('-') {
        return Err(MalformedToken {
            token: token.to_string(),
            reason: "expected <origin>-<destination> with origin B/1/2/3 and destination 1/2/3/H",
        });
    } else if token.ends_with('H') {
        (Some(Origin::Implicit), Outcome::RunScored)
    } else {
        (None, Outcome::NoRun)
    };

    Ok(Advance {
        token: token.to_string(),
        origin,
        outcome,
        unearned,
    })
}

pub fn parse_advances(event_text: &str) -> ParsedAdvances {
    let mut parsed = ParsedAdvances::default();

    for token in advance_section(event_text)
        .split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        match parse_advance(token) {
            Ok(advance) => parsed.advances.push(advance),
            Err(malformed) => parsed.malformed.push(malformed),
        }
    }

    parsed
}

/// Number of `(UR)` markers anywhere in the play text.
pub fn count_unearned_markers(event_text: &str) -> u32 {
    UNEARNED_RE.find_iter(event_text).count() as u32
}

fn origin_from_char(c: char) -> Option<Origin> {
    if c == 'B' {
        Some(Origin::Batter)
    } else {
        Base::from_digit(c).map(Origin::Base)
    }
}
