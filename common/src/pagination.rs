//! Abstractions for offset pagination.

use std::num::NonZeroU32;

use derive_more::Display;

/// Number of a page, starting from `1`.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Number(NonZeroU32);

impl Number {
    /// The first page.
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    /// Creates a new [`Number`], if the provided one is not zero.
    #[must_use]
    pub const fn new(n: u32) -> Option<Self> {
        match NonZeroU32::new(n) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Returns this [`Number`] as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Returns the previous page, if any.
    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        Self::new(self.get() - 1)
    }

    /// Returns the next page.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Clamps this [`Number`] to the last page of `total` items split into
    /// pages of the given [`Size`].
    #[must_use]
    pub fn clamp_to(self, total: u64, size: Size) -> Self {
        self.min(last_page(total, size))
    }
}

impl Default for Number {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Number of items on a page.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub struct Size(NonZeroU32);

impl Size {
    /// [`Size`] used when nothing else is configured.
    pub const DEFAULT: Self = match NonZeroU32::new(12) {
        Some(n) => Self(n),
        None => unreachable!(),
    };

    /// Creates a new [`Size`], if the provided one is not zero.
    #[must_use]
    pub const fn new(n: u32) -> Option<Self> {
        match NonZeroU32::new(n) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Returns this [`Size`] as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pagination arguments.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Arguments {
    /// Requested page.
    pub number: Number,

    /// Number of items per page.
    pub size: Size,
}

impl Arguments {
    /// Returns the number of items to skip before the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.number.get() - 1) * u64::from(self.size.get())
    }

    /// Returns the maximum number of items on the requested page.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.size.get()
    }
}

/// Returns the number of pages `total` items occupy, treating an empty set as
/// a single page.
#[must_use]
pub fn total_pages(total: u64, size: Size) -> u32 {
    let pages = total.div_ceil(u64::from(size.get())).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Returns the last page of `total` items split into pages of `size`.
#[must_use]
pub fn last_page(total: u64, size: Size) -> Number {
    Number::new(total_pages(total, size)).unwrap_or(Number::FIRST)
}

/// Number of page buttons shown before collapsing the rest into an ellipsis.
pub const DEFAULT_MAX_VISIBLE: usize = 5;

/// Visible part of a pagination control.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Window {
    /// Leading page numbers to show, in order.
    pub pages: Vec<Number>,

    /// Currently selected page.
    pub current: Number,

    /// Indicator whether a previous page exists.
    pub has_prev: bool,

    /// Indicator whether a next page exists.
    pub has_next: bool,

    /// Indicator whether an ellipsis and the [`Window::last_page`] follow
    /// the [`Window::pages`].
    pub show_ellipsis_and_last: bool,

    /// Last existing page.
    pub last_page: Number,
}

impl Window {
    /// Computes the [`Window`] for the `current` page of `total` items.
    ///
    /// Pages `1..=min(max_visible, total_pages)` are always shown. An empty
    /// result still produces a single (disabled) page.
    #[must_use]
    pub fn compute(
        current: Number,
        total: u64,
        size: Size,
        max_visible: usize,
    ) -> Self {
        let total_pages = total_pages(total, size);
        let visible = u32::try_from(max_visible.max(1))
            .unwrap_or(u32::MAX)
            .min(total_pages);

        Self {
            pages: (1..=visible).filter_map(Number::new).collect(),
            current,
            has_prev: current.get() > 1,
            has_next: current.get() < total_pages,
            show_ellipsis_and_last: total_pages > visible,
            last_page: last_page(total, size),
        }
    }

    /// Returns the total number of pages.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.last_page.get()
    }

    /// Iterates over the [`Entry`]s of this [`Window`] in display order.
    pub fn entries(&self) -> impl Iterator<Item = Entry> + '_ {
        let tail = self
            .show_ellipsis_and_last
            .then_some([Entry::Ellipsis, self.entry(self.last_page)]);
        self.pages
            .iter()
            .map(|n| self.entry(*n))
            .chain(tail.into_iter().flatten())
    }

    /// Creates a page [`Entry`] for the provided [`Number`].
    fn entry(&self, number: Number) -> Entry {
        Entry::Page {
            number,
            current: number == self.current,
        }
    }
}

/// Single element of a rendered [`Window`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Entry {
    /// Button leading to a page.
    Page {
        /// Page number.
        number: Number,

        /// Indicator whether this is the current page.
        current: bool,
    },

    /// Collapsed run of pages.
    Ellipsis,
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Entry, Number, Size, Window, DEFAULT_MAX_VISIBLE};

    fn n(n: u32) -> Number {
        Number::new(n).unwrap()
    }

    fn size(n: u32) -> Size {
        Size::new(n).unwrap()
    }

    fn window(page: u32, total: u64, per_page: u32) -> Window {
        Window::compute(n(page), total, size(per_page), DEFAULT_MAX_VISIBLE)
    }

    #[test]
    fn empty_result_is_single_disabled_page() {
        let w = window(1, 0, 12);

        assert_eq!(w.pages, vec![n(1)]);
        assert!(!w.has_prev);
        assert!(!w.has_next);
        assert!(!w.show_ellipsis_and_last);
        assert_eq!(w.last_page, n(1));
    }

    #[test]
    fn collapses_tail_into_ellipsis_and_last() {
        let w = window(3, 100, 12);

        assert_eq!(w.total_pages(), 9);
        assert_eq!(w.pages, (1..=5).map(n).collect::<Vec<_>>());
        assert!(w.show_ellipsis_and_last);
        assert_eq!(w.last_page, n(9));
        assert!(w.has_prev);
        assert!(w.has_next);
    }

    #[test]
    fn shows_all_pages_when_they_fit() {
        let w = window(5, 60, 12);

        assert_eq!(w.total_pages(), 5);
        assert_eq!(w.pages.len(), 5);
        assert!(!w.show_ellipsis_and_last);
        assert!(w.has_prev);
        assert!(!w.has_next);
    }

    #[test]
    fn entries_mark_current_page() {
        let w = window(9, 100, 12);
        let entries = w.entries().collect::<Vec<_>>();

        assert_eq!(entries.len(), 7);
        assert_eq!(entries[5], Entry::Ellipsis);
        assert_eq!(
            entries[6],
            Entry::Page {
                number: n(9),
                current: true,
            },
        );
        assert!(entries[..5].iter().all(|e| matches!(
            e,
            Entry::Page { current: false, .. },
        )));
    }

    #[test]
    fn offset_and_limit() {
        let args = Arguments {
            number: n(3),
            size: size(12),
        };

        assert_eq!(args.offset(), 24);
        assert_eq!(args.limit(), 12);
        assert_eq!(Arguments::default().offset(), 0);
    }

    #[test]
    fn clamps_to_last_page() {
        assert_eq!(n(7).clamp_to(30, size(12)), n(3));
        assert_eq!(n(2).clamp_to(30, size(12)), n(2));
        assert_eq!(n(4).clamp_to(0, size(12)), n(1));
    }

    #[test]
    fn navigation() {
        assert_eq!(Number::FIRST.prev(), None);
        assert_eq!(n(2).prev(), Some(n(1)));
        assert_eq!(n(2).next(), n(3));
        assert_eq!(Number::new(0), None);
    }
}
