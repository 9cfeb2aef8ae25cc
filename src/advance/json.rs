use super::{Advance, Origin, Outcome, ParsedAdvances};

fn quoted(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn advance_to_json(advance: &Advance) -> String {
    let origin = match advance.origin {
        Some(Origin::Batter) => r#""B""#.to_string(),
        Some(Origin::Base(base)) => format!(r#""{}""#, base.number()),
        Some(Origin::Implicit) | None => "null".to_string(),
    };
    let outcome = match advance.outcome {
        Outcome::NoRun => "none",
        Outcome::RunnerOut => "out",
        Outcome::RunScored => "run",
    };

    format!(
        r#"{{"token":{},"origin":{},"outcome":"{}","unearned":{}}}"#,
        quoted(&advance.token),
        origin,
        outcome,
        if advance.unearned { "true" } else { "false" }
    )
}

pub(super) fn advances_to_json(event_text: &str, parsed: &ParsedAdvances) -> String {
    let advances: Vec<String> = parsed.advances.iter().map(advance_to_json).collect();
    let malformed: Vec<String> = parsed.malformed.iter().map(|m| quoted(&m.token)).collect();

    format!(
        r#"{{"raw":{},"advances":[{}],"earned_runs":{},"malformed":[{}]}}"#,
        quoted(event_text),
        advances.join(","),
        parsed.earned_runs(),
        malformed.join(",")
    )
}
