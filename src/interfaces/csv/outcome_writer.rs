use crate::domain::purchase::{CourseOutcome, EnrollmentReport, OrderHandle};
use crate::error::{PurchaseError, Result};
use std::io::Write;

/// Writes one CSV outcome row per processed command:
/// `op, purchaser, status, detail, amount, currency`.
///
/// `begin` rows carry the order id, amount and currency; `confirm` rows carry
/// the per-course outcomes as a `;`-separated `id=outcome` list. Failed
/// commands carry the machine-readable error kind and message.
pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_begin(&mut self, purchaser: &str, result: &Result<OrderHandle>) -> Result<()> {
        match result {
            Ok(handle) => {
                let amount = handle.amount.to_string();
                self.writer.write_record([
                    "begin",
                    purchaser,
                    "ok",
                    handle.id.as_str(),
                    amount.as_str(),
                    handle.currency.as_str(),
                ])?;
            }
            Err(err) => self.write_error("begin", purchaser, err)?,
        }
        Ok(())
    }

    pub fn write_confirm(
        &mut self,
        purchaser: &str,
        result: &Result<EnrollmentReport>,
    ) -> Result<()> {
        match result {
            Ok(report) => {
                let outcomes = course_outcomes(report);
                self.writer.write_record([
                    "confirm",
                    purchaser,
                    report.status().as_str(),
                    outcomes.as_str(),
                    "",
                    "",
                ])?;
            }
            Err(err) => self.write_error("confirm", purchaser, err)?,
        }
        Ok(())
    }

    fn write_error(&mut self, op: &str, purchaser: &str, err: &PurchaseError) -> Result<()> {
        let message = err.to_string();
        self.writer
            .write_record([op, purchaser, "error", err.kind(), message.as_str(), ""])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn course_outcomes(report: &EnrollmentReport) -> String {
    report
        .outcomes()
        .iter()
        .map(|(course, outcome)| {
            let token = match outcome {
                CourseOutcome::Enrolled { .. } => "enrolled".to_string(),
                CourseOutcome::AlreadyEnrolled => "already_enrolled".to_string(),
                CourseOutcome::Failed(err) => err.kind().to_string(),
            };
            format!("{course}={token}")
        })
        .collect::<Vec<_>>()
        .join(";")
}
