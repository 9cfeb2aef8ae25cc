use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de};

/// Retrosheet `EVENT_CD` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
#[repr(u8)]
pub enum EventType {
    Unknown = 0,
    NoPlay = 1,
    GenericOut = 2,
    Strikeout = 3,
    StolenBase = 4,
    DefensiveIndifference = 5,
    CaughtStealing = 6,
    PickoffError = 7,
    Pickoff = 8,
    WildPitch = 9,
    PassedBall = 10,
    Balk = 11,
    OtherAdvance = 12,
    FoulError = 13,
    Walk = 14,
    IntentionalWalk = 15,
    HitByPitch = 16,
    Interference = 17,
    FieldingError = 18,
    FieldersChoice = 19,
    Single = 20,
    Double = 21,
    Triple = 22,
    HomeRun = 23,
    MissingPlay = 24,
}

impl TryFrom<u8> for EventType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let event_type = match code {
            0 => Self::Unknown,
            1 => Self::NoPlay,
            2 => Self::GenericOut,
            3 => Self::Strikeout,
            4 => Self::StolenBase,
            5 => Self::DefensiveIndifference,
            6 => Self::CaughtStealing,
            7 => Self::PickoffError,
            8 => Self::Pickoff,
            9 => Self::WildPitch,
            10 => Self::PassedBall,
            11 => Self::Balk,
            12 => Self::OtherAdvance,
            13 => Self::FoulError,
            14 => Self::Walk,
            15 => Self::IntentionalWalk,
            16 => Self::HitByPitch,
            17 => Self::Interference,
            18 => Self::FieldingError,
            19 => Self::FieldersChoice,
            20 => Self::Single,
            21 => Self::Double,
            22 => Self::Triple,
            23 => Self::HomeRun,
            24 => Self::MissingPlay,
            other => return Err(format!("unknown EVENT_CD {other} (expected 0..=24)")),
        };
        Ok(event_type)
    }
}

impl EventType {
    pub fn is_walk(self) -> bool {
        matches!(self, Self::Walk | Self::IntentionalWalk)
    }
}

/// Which team is at bat (`BAT_HOME_ID`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub enum BattingSide {
    Away,
    Home,
}

impl TryFrom<u8> for BattingSide {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Away),
            1 => Ok(Self::Home),
            other => Err(format!("invalid BAT_HOME_ID {other} (expected 0 or 1)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    First,
    Second,
    Third,
}

impl Base {
    pub const ALL: [Base; 3] = [Base::First, Base::Second, Base::Third];

    pub fn from_digit(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::First),
            '2' => Some(Self::Second),
            '3' => Some(Self::Third),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// One play-by-play row of a Chadwick `cwevent` export.
///
/// Extra columns in the source file are ignored; every column named here is required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "GAME_ID")]
    pub game_id: String,
    #[serde(rename = "AWAY_TEAM_ID")]
    pub away_team_id: String,
    #[serde(rename = "INN_CT")]
    pub inning: u32,
    #[serde(rename = "BAT_HOME_ID")]
    pub batting_side: BattingSide,
    #[serde(rename = "OUTS_CT")]
    pub outs_before: u32,
    #[serde(rename = "EVENT_OUTS_CT")]
    pub event_outs: u32,
    #[serde(rename = "EVENT_CD")]
    pub event_type: EventType,
    #[serde(rename = "H_FL")]
    pub hit_value: u8,
    #[serde(rename = "AB_FL", deserialize_with = "deserialize_flag")]
    pub at_bat: bool,
    #[serde(rename = "GAME_PA_CT")]
    pub plate_appearance_index: u32,
    #[serde(rename = "EVENT_RUNS_CT")]
    pub runs: u32,
    #[serde(rename = "EVENT_TX")]
    pub event_text: String,
    #[serde(rename = "RESP_PIT_ID")]
    pub pitcher_id: String,
    #[serde(rename = "RESP_PIT_START_FL", deserialize_with = "deserialize_flag")]
    pub pitcher_started: bool,
    #[serde(rename = "RUN1_RESP_PIT_ID", deserialize_with = "deserialize_optional_id")]
    pub run1_pitcher_id: Option<String>,
    #[serde(rename = "RUN2_RESP_PIT_ID", deserialize_with = "deserialize_optional_id")]
    pub run2_pitcher_id: Option<String>,
    #[serde(rename = "RUN3_RESP_PIT_ID", deserialize_with = "deserialize_optional_id")]
    pub run3_pitcher_id: Option<String>,
}

impl EventRecord {
    /// Pitcher accountable for the runner on `base` before this play.
    pub fn responsible_pitcher(&self, base: Base) -> Option<&str> {
        let slots = [
            &self.run1_pitcher_id,
            &self.run2_pitcher_id,
            &self.run3_pitcher_id,
        ];
        slots[base.index()].as_deref()
    }

    /// Number of occupied bases whose runner is charged to `pitcher_id`.
    pub fn runners_charged_to(&self, pitcher_id: &str) -> u32 {
        Base::ALL
            .into_iter()
            .filter(|base| self.responsible_pitcher(*base) == Some(pitcher_id))
            .count() as u32
    }

    pub fn is_hit(&self) -> bool {
        self.hit_value != 0
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim() {
        "T" | "t" | "1" | "true" => Ok(true),
        "F" | "f" | "0" | "false" | "" => Ok(false),
        other => Err(de::Error::custom(format!(
            "invalid flag '{other}', expected 'T' or 'F'"
        ))),
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed game id '{raw}': {reason}")]
pub struct GameIdError {
    pub raw: String,
    pub reason: String,
}

/// `<home team:3><date:YYYYMMDD><game number:1>`, e.g. `NYA201904010`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameId {
    pub home_team: String,
    pub date: NaiveDate,
    pub game_number: u8,
}

impl GameId {
    pub fn parse(raw: &str) -> Result<Self, GameIdError> {
        let fail = |reason: String| GameIdError {
            raw: raw.to_string(),
            reason,
        };

        let s = raw.trim();
        if s.len() != 12 || !s.is_ascii() {
            return Err(fail(format!("expected 12 ASCII characters, got {}", s.len())));
        }

        let date = NaiveDate::parse_from_str(&s[3..11], "%Y%m%d")
            .map_err(|e| fail(format!("bad date '{}' (chrono: {e})", &s[3..11])))?;

        let game_number = s[11..]
            .parse::<u8>()
            .map_err(|_| fail(format!("bad game number '{}'", &s[11..])))?;

        Ok(Self {
            home_team: s[0..3].to_string(),
            date,
            game_number,
        })
    }

    pub fn is_doubleheader(&self) -> bool {
        self.game_number == 2
    }

    pub fn is_tripleheader(&self) -> bool {
        self.game_number == 3
    }
}
