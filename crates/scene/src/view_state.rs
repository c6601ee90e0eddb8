use thiserror::Error;

use crate::dataset::{TierCategory, YearBucket};
use crate::visibility::CategoryFilter;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("year value {0:?} is not a bucket in 1..=6")]
    InvalidYear(String),
    #[error("category {0:?} is not one of the toggle values")]
    UnknownCategory(String),
}

/// Current control selections.
///
/// Owned by the map view and passed by reference into every bind and hover
/// call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub selected_year: YearBucket,
    pub selected_category: TierCategory,
}

impl ViewState {
    pub fn new(selected_year: YearBucket, selected_category: TierCategory) -> Self {
        Self {
            selected_year,
            selected_category,
        }
    }

    /// Applies a raw slider value. The state is unchanged on error.
    pub fn set_year(&mut self, raw: &str) -> Result<YearBucket, ViewError> {
        let year = YearBucket::parse(raw).ok_or_else(|| ViewError::InvalidYear(raw.to_string()))?;
        self.selected_year = year;
        Ok(year)
    }

    /// Applies a raw radio value; only the filter's toggle values are
    /// accepted.
    pub fn set_category(
        &mut self,
        raw: &str,
        filter: &CategoryFilter,
    ) -> Result<&TierCategory, ViewError> {
        let category = TierCategory::parse(raw);
        if !filter.is_toggle(&category) {
            return Err(ViewError::UnknownCategory(raw.to_string()));
        }
        self.selected_category = category;
        Ok(&self.selected_category)
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(YearBucket::FIRST, TierCategory::Tier2)
    }
}

#[cfg(test)]
mod tests {
    use super::{ViewError, ViewState};
    use crate::dataset::TierCategory;
    use crate::visibility::CategoryFilter;

    #[test]
    fn defaults_to_first_bucket() {
        let v = ViewState::default();
        assert_eq!(v.selected_year.get(), 1);
        assert_eq!(v.selected_category, TierCategory::Tier2);
    }

    #[test]
    fn bad_year_leaves_state_untouched() {
        let mut v = ViewState::default();
        assert_eq!(v.set_year("4").map(|y| y.get()), Ok(4));
        assert_eq!(
            v.set_year("7"),
            Err(ViewError::InvalidYear("7".to_string()))
        );
        assert_eq!(v.selected_year.get(), 4);
    }

    #[test]
    fn category_must_be_a_toggle() {
        let filter = CategoryFilter::default();
        let mut v = ViewState::default();
        assert_eq!(v.set_category("5", &filter), Ok(&TierCategory::Tier5));
        assert_eq!(
            v.set_category("4", &filter),
            Err(ViewError::UnknownCategory("4".to_string()))
        );
        assert_eq!(v.selected_category, TierCategory::Tier5);
    }
}
