//! Usage flags: which optional features a document has used anywhere in its body.
//!
//! Flags only ever go from unset to set. The preamble reads them once, after the body is closed,
//! to decide which packages are actually needed.

use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[repr(u8)]
pub enum Feature {
    #[display(fmt = "hasFigure")]
    Figure,
    #[display(fmt = "hasFigureSeries")]
    FigureSeries,
    #[display(fmt = "hasTable")]
    Table,
    #[display(fmt = "hasMultiRowCell")]
    MultiRowCell,
    #[display(fmt = "hasMultiColCell")]
    MultiColCell,
    #[display(fmt = "hasCode")]
    Code,
    #[display(fmt = "hasTextSubOrSuperScript")]
    TextSubOrSuperScript,
    #[display(fmt = "hasColors")]
    Colors,
    #[display(fmt = "hasUnderlined")]
    Underlined,
    #[display(fmt = "needsAMSSymbols")]
    AmsSymbols,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::Figure,
        Feature::FigureSeries,
        Feature::Table,
        Feature::MultiRowCell,
        Feature::MultiColCell,
        Feature::Code,
        Feature::TextSubOrSuperScript,
        Feature::Colors,
        Feature::Underlined,
        Feature::AmsSymbols,
    ];

    /// The coarser feature that is always used together with this one
    pub const fn implied(self) -> Option<Feature> {
        match self {
            Feature::FigureSeries => Some(Feature::Figure),
            Feature::MultiRowCell | Feature::MultiColCell => Some(Feature::Table),
            _ => None,
        }
    }

    const fn bit(self) -> u16 {
        1 << self as u8
    }
}

/// A set of [`Feature`]s.
///
/// The same type serves as the per-document aggregator and as the static "write set" an element
/// kind declares, so both can be compared directly in tests.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UsageFlags(u16);

impl UsageFlags {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Const-friendly builder, used by element metadata.
    /// Applies implications exactly like [`UsageFlags::set`] does.
    pub const fn with(self, feature: Feature) -> Self {
        let mut bits = self.0 | feature.bit();
        if let Some(implied) = feature.implied() {
            bits |= implied.bit();
        }
        Self(bits)
    }

    /// Marks `feature` (and whatever it implies) as used. There is no way back.
    pub fn set(&mut self, feature: Feature) {
        *self = self.with(feature);
    }

    pub fn set_all(&mut self, other: UsageFlags) {
        // `other` was built through `with`/`set`, so its implications are already closed
        self.0 |= other.0;
    }

    pub const fn is_set(&self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|f| self.is_set(*f))
    }

    /// `true` if every feature of `other` is set here too
    pub const fn contains(&self, other: UsageFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Debug for UsageFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Feature> for UsageFlags {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        let mut flags = UsageFlags::empty();
        iter.into_iter().for_each(|f| flags.set(f));
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        // arrange
        let flags = UsageFlags::default();

        // act
        let set = flags.iter().count();

        // assert
        assert_eq!(set, 0);
        assert!(flags.is_empty());
    }

    #[test]
    fn figure_series_implies_figure() {
        // arrange
        let mut flags = UsageFlags::empty();

        // act
        flags.set(Feature::FigureSeries);

        // assert
        assert!(flags.is_set(Feature::FigureSeries));
        assert!(flags.is_set(Feature::Figure));
        assert!(!flags.is_set(Feature::Table));
    }

    #[test]
    fn spanning_cells_imply_table() {
        for cell in [Feature::MultiColCell, Feature::MultiRowCell] {
            // arrange
            let mut flags = UsageFlags::empty();

            // act
            flags.set(cell);

            // assert
            assert!(flags.is_set(Feature::Table), "{cell} must imply hasTable");
            assert_eq!(flags.iter().count(), 2);
        }
    }

    #[test]
    fn nothing_else_is_implied() {
        for feature in Feature::ALL {
            // arrange
            let mut flags = UsageFlags::empty();

            // act
            flags.set(feature);

            // assert
            let expected = 1 + feature.implied().map_or(0, |_| 1);
            assert_eq!(flags.iter().count(), expected, "{feature}");
        }
    }

    #[test]
    fn monotonic() {
        // arrange
        let mut flags = UsageFlags::empty();
        let mut seen = UsageFlags::empty();

        // act / assert
        for feature in Feature::ALL.into_iter().chain(Feature::ALL.into_iter().rev()) {
            flags.set(feature);
            assert!(flags.contains(seen), "a flag was cleared by setting {feature}");
            seen = flags;
        }
        assert_eq!(flags.iter().count(), Feature::ALL.len());
    }

    #[test]
    fn merge_keeps_both() {
        // arrange
        let mut left = UsageFlags::empty().with(Feature::Code);
        let right = UsageFlags::empty().with(Feature::MultiRowCell);

        // act
        left.set_all(right);

        // assert
        assert_eq!(
            left,
            [Feature::Code, Feature::MultiRowCell, Feature::Table]
                .into_iter()
                .collect()
        );
    }
}
