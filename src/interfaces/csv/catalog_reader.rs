use crate::domain::course::{Course, CourseId, Price};
use crate::error::{PurchaseError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of the catalog seed CSV: `course, title, price`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CatalogRecord {
    pub course: String,
    pub title: String,
    pub price: Decimal,
}

impl CatalogRecord {
    pub fn into_course(self) -> Result<Course> {
        Ok(Course::new(
            CourseId::new(self.course),
            self.title,
            Price::new(self.price)?,
        ))
    }
}

/// Reads catalog seed rows from a CSV source.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CatalogReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and validates courses.
    pub fn courses(self) -> impl Iterator<Item = Result<Course>> {
        self.reader.into_deserialize().map(|result| {
            result
                .map_err(PurchaseError::from)
                .and_then(CatalogRecord::into_course)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "course, title, price\nc1, Rust Basics, 500\nc2, Async Rust, 300";
        let reader = CatalogReader::new(data.as_bytes());
        let courses: Vec<Result<Course>> = reader.courses().collect();

        assert_eq!(courses.len(), 2);
        let c1 = courses[0].as_ref().unwrap();
        assert_eq!(c1.id, CourseId::new("c1"));
        assert_eq!(c1.title, "Rust Basics");
        assert_eq!(c1.price.value(), dec!(500));
    }

    #[test]
    fn test_reader_rejects_negative_price() {
        let data = "course, title, price\nc1, Rust Basics, -5";
        let reader = CatalogReader::new(data.as_bytes());
        let courses: Vec<Result<Course>> = reader.courses().collect();
        assert!(matches!(courses[0], Err(PurchaseError::InvalidRequest(_))));
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "course, title, price\nc1, Broken, not-a-number";
        let reader = CatalogReader::new(data.as_bytes());
        let courses: Vec<Result<Course>> = reader.courses().collect();
        assert!(courses[0].is_err());
    }
}
