use crate::domain::course::CourseId;
use crate::error::{PurchaseError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandOp {
    Begin,
    Confirm,
}

/// One row of the purchase-command CSV:
/// `op, purchaser, courses, order, payment, signature`.
///
/// `courses` is a `;`-separated id list. The `order`, `payment` and
/// `signature` columns are only meaningful for `confirm` rows.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub op: CommandOp,
    pub purchaser: String,
    #[serde(default)]
    pub courses: String,
    #[serde(default)]
    pub order: String,
    #[serde(default)]
    pub payment: String,
    #[serde(default)]
    pub signature: String,
}

impl CommandRecord {
    pub fn course_ids(&self) -> Vec<CourseId> {
        self.courses
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(CourseId::new)
            .collect()
    }
}

/// Reads purchase commands from a CSV source.
///
/// Wraps `csv::Reader` and provides an iterator over `Result<CommandRecord>`,
/// handling whitespace trimming and flexible record lengths automatically.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes commands.
    pub fn commands(self) -> impl Iterator<Item = Result<CommandRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PurchaseError::from))
    }
}
