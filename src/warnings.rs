/// Non-fatal problems found while building one output row: malformed advance tokens, a failed
/// game's reason, sanitized text. Joined with `"; "` into the `parse_warning` column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseWarnings(Option<String>);

impl ParseWarnings {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => self.0 = Some(msg.to_string()),
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}
