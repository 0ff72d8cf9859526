use crate::domain::account::AccountId;
use crate::domain::course::{CURRENCY, CourseId, Price};
use crate::domain::ports::{CatalogStore, CatalogStoreRef};
use crate::domain::purchase::{PurchaseQuote, dedupe_preserving_order};
use crate::error::{PurchaseError, Result};

/// Prices a requested course set and rejects ineligible requests.
///
/// Read-only: prices are taken at request time and never locked, so a
/// concurrent price change before confirmation is an accepted race.
pub struct EligibilityChecker {
    catalog: CatalogStoreRef,
}

impl EligibilityChecker {
    pub fn new(catalog: CatalogStoreRef) -> Self {
        Self { catalog }
    }

    /// Validates every requested course and returns the priced quote.
    ///
    /// Fails fast with the first offending course: absent ids yield
    /// `CourseNotFound`, already-owned ones `AlreadyEnrolled`. Duplicate ids
    /// are collapsed before pricing so they cannot double-charge.
    pub async fn price_request(
        &self,
        purchaser: &AccountId,
        courses: &[CourseId],
    ) -> Result<PurchaseQuote> {
        if courses.is_empty() {
            return Err(PurchaseError::InvalidRequest(
                "course list must not be empty".to_string(),
            ));
        }

        let courses = dedupe_preserving_order(courses);
        let mut total = Price::ZERO;
        for id in &courses {
            let course = self
                .catalog
                .find_course(id)
                .await?
                .ok_or_else(|| PurchaseError::CourseNotFound(id.clone()))?;
            if course.owned_by(purchaser) {
                return Err(PurchaseError::AlreadyEnrolled(id.clone()));
            }
            total += course.price;
        }

        Ok(PurchaseQuote {
            purchaser: purchaser.clone(),
            courses,
            total,
            currency: CURRENCY.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::course::Course;
    use crate::infrastructure::in_memory::InMemoryCatalog;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    async fn checker_with_courses(courses: Vec<Course>) -> (EligibilityChecker, InMemoryCatalog) {
        let catalog = InMemoryCatalog::new();
        for course in courses {
            catalog.insert_course(course).await;
        }
        (EligibilityChecker::new(Arc::new(catalog.clone())), catalog)
    }

    fn course(id: &str, price: rust_decimal::Decimal) -> Course {
        Course::new(CourseId::new(id), format!("Course {id}"), Price::new(price).unwrap())
    }

    #[tokio::test]
    async fn test_total_is_sum_of_prices() {
        let (checker, _) =
            checker_with_courses(vec![course("c1", dec!(500)), course("c2", dec!(300))]).await;

        let quote = checker
            .price_request(&AccountId::new("u1"), &[CourseId::new("c1"), CourseId::new("c2")])
            .await
            .unwrap();
        assert_eq!(quote.total.value(), dec!(800));
        assert_eq!(quote.currency, CURRENCY);
        assert_eq!(quote.courses.len(), 2);
    }

    #[tokio::test]
    async fn test_total_is_order_independent() {
        let (checker, _) =
            checker_with_courses(vec![course("c1", dec!(500)), course("c2", dec!(300))]).await;
        let u1 = AccountId::new("u1");

        let forward = checker
            .price_request(&u1, &[CourseId::new("c1"), CourseId::new("c2")])
            .await
            .unwrap();
        let reverse = checker
            .price_request(&u1, &[CourseId::new("c2"), CourseId::new("c1")])
            .await
            .unwrap();
        assert_eq!(forward.total, reverse.total);
    }

    #[tokio::test]
    async fn test_duplicates_do_not_double_charge() {
        let (checker, _) = checker_with_courses(vec![course("c1", dec!(500))]).await;

        let quote = checker
            .price_request(
                &AccountId::new("u1"),
                &[CourseId::new("c1"), CourseId::new("c1")],
            )
            .await
            .unwrap();
        assert_eq!(quote.total.value(), dec!(500));
        assert_eq!(quote.courses, vec![CourseId::new("c1")]);
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let (checker, _) = checker_with_courses(vec![]).await;
        let result = checker.price_request(&AccountId::new("u1"), &[]).await;
        assert!(matches!(result, Err(PurchaseError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_course_names_offending_id() {
        let (checker, _) = checker_with_courses(vec![course("c1", dec!(500))]).await;
        let result = checker
            .price_request(&AccountId::new("u1"), &[CourseId::new("c1"), CourseId::new("c9")])
            .await;
        assert!(matches!(
            result,
            Err(PurchaseError::CourseNotFound(id)) if id == CourseId::new("c9")
        ));
    }

    #[tokio::test]
    async fn test_owned_course_rejected() {
        let (checker, catalog) = checker_with_courses(vec![course("c1", dec!(500))]).await;
        let u1 = AccountId::new("u1");
        catalog.enroll(&CourseId::new("c1"), &u1).await.unwrap();

        let result = checker.price_request(&u1, &[CourseId::new("c1")]).await;
        assert!(matches!(
            result,
            Err(PurchaseError::AlreadyEnrolled(id)) if id == CourseId::new("c1")
        ));
    }

    #[tokio::test]
    async fn test_pricing_has_no_side_effects() {
        let (checker, catalog) = checker_with_courses(vec![course("c1", dec!(500))]).await;
        let u1 = AccountId::new("u1");
        checker.price_request(&u1, &[CourseId::new("c1")]).await.unwrap();

        let course = catalog.find_course(&CourseId::new("c1")).await.unwrap().unwrap();
        assert!(course.enrolled.is_empty());
    }
}
