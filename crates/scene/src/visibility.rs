use crate::dataset::TierCategory;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Visibility {
    pub visible: bool,
}

impl Visibility {
    pub fn visible() -> Self {
        Self { visible: true }
    }

    pub fn hidden() -> Self {
        Self { visible: false }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::visible()
    }
}

/// Two-way category toggle.
///
/// A record whose tier matches the selected toggle is shown and a record of
/// the other toggle is hidden. Tiers that are neither toggle are always shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    toggles: [TierCategory; 2],
}

impl CategoryFilter {
    pub fn new(a: TierCategory, b: TierCategory) -> Self {
        Self { toggles: [a, b] }
    }

    pub fn toggles(&self) -> &[TierCategory; 2] {
        &self.toggles
    }

    pub fn is_toggle(&self, tier: &TierCategory) -> bool {
        self.toggles.contains(tier)
    }

    pub fn visibility(&self, tier: &TierCategory, selected: &TierCategory) -> Visibility {
        if tier == selected || !self.is_toggle(tier) {
            Visibility::visible()
        } else {
            Visibility::hidden()
        }
    }
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self::new(TierCategory::Tier2, TierCategory::Tier5)
    }
}
