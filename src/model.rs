use std::collections::BTreeMap;

/// Mapping of keys to values accumulated from one source.
pub type EnvMap = BTreeMap<String, String>;

/// A parsed `KEY=VALUE` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub line: u32,
    /// The value's quote was still open at end of line. The value then starts
    /// with the quote character.
    pub unterminated_quote: bool,
}

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Entry(Entry),
    Blank,
    Comment,
    Malformed,
}

impl ParseOutcome {
    pub fn into_entry(self) -> Option<Entry> {
        match self {
            Self::Entry(entry) => Some(entry),
            _ => None,
        }
    }
}

/// What a read does with a line that is neither blank, a comment nor `KEY=VALUE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Fail the whole read and discard what was parsed so far.
    #[default]
    Strict,
    /// Log the line number and keep going.
    Lenient,
}

/// Summary of a merge into a [`TargetEnv`](crate::TargetEnv).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped_existing: usize,
    /// Keys or values the OS environment cannot hold (empty key, `=` or NUL).
    pub skipped_invalid: usize,
    pub files_read: usize,
}

impl LoadReport {
    pub(crate) fn absorb(&mut self, other: LoadReport) {
        self.loaded += other.loaded;
        self.skipped_existing += other.skipped_existing;
        self.skipped_invalid += other.skipped_invalid;
        self.files_read += other.files_read;
    }
}
