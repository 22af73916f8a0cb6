//! [`Terminal`] rendition of a browse page.

use std::{fmt, io};

use common::pagination::{Entry, Window};
use itertools::Itertools as _;
use service::{
    browse::{
        render::{Card, EmptyState},
        Fragment, Notice, View,
    },
    domain::{
        facet::{Count, Kind},
        FacetOption,
    },
    query,
};
use tracing as log;

/// [`View`] printing a browse page as plain text.
#[derive(Debug)]
pub struct Terminal<W> {
    /// Output to print into.
    out: W,
}

impl<W: io::Write> Terminal<W> {
    /// Creates a new [`Terminal`] printing into the provided output.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns a reference to the output of this [`Terminal`].
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Returns the output of this [`Terminal`].
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints the [`FacetOption`]s matching a facet search.
    pub fn matches<'o>(
        &mut self,
        kind: Kind,
        needle: &str,
        options: impl IntoIterator<Item = &'o FacetOption>,
    ) {
        let found = options.into_iter().map(option).join(", ");
        if found.is_empty() {
            self.print(format_args!("No {kind} matches `{needle}`"));
        } else {
            self.print(format_args!("Matching {kind}: {found}"));
        }
    }

    /// Prints a single line.
    fn print(&mut self, line: fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{line}") {
            log::warn!("failed to print browse page: {e}");
        }
    }

    /// Prints a listing [`Card`].
    fn card(&mut self, card: &Card) {
        let Card {
            href,
            title,
            price,
            area,
            location,
            category,
            date,
            image,
        } = card;
        self.print(format_args!("{title}"));
        self.print(format_args!("  {price} | {area} | {location}"));
        self.print(format_args!("  {category} | {date}"));
        self.print(format_args!("  {href} ({image})"));
    }

    /// Prints an [`EmptyState`].
    fn empty(&mut self, state: &EmptyState) {
        let EmptyState {
            title,
            hint,
            clear_filters,
        } = state;
        self.print(format_args!("{title}"));
        self.print(format_args!("  {hint}"));
        self.print(format_args!("  [{clear_filters}]"));
    }
}

impl<W: io::Write> View for Terminal<W> {
    fn loading(&mut self) {
        self.print(format_args!("Loading..."));
    }

    fn results(
        &mut self,
        fragments: &[Fragment],
        window: &Window,
        total: u64,
    ) {
        self.print(format_args!("{total} listings"));
        for fragment in fragments {
            match fragment {
                Fragment::Card(card) => self.card(card),
                Fragment::Empty(state) => self.empty(state),
            }
        }
        let bar = pagination_bar(window);
        self.print(format_args!("{bar}"));
    }

    fn facets(&mut self, kind: Kind, options: &[FacetOption]) {
        if options.is_empty() {
            return;
        }
        let line = options.iter().map(option).join(", ");
        if kind != Kind::Status {
            self.print(format_args!("{kind}: {line}"));
            return;
        }
        // Status tabs sum up into the owner's total.
        let known = options
            .iter()
            .map(|o| match o.count {
                Count::Known(n) => Some(n),
                Count::Pending | Count::Uncounted => None,
            })
            .collect::<Option<Vec<_>>>();
        match known {
            Some(counts) => {
                let total = counts.iter().sum::<u64>();
                self.print(format_args!("{kind}: {line} | total {total}"));
            }
            None => self.print(format_args!("{kind}: {line}")),
        }
    }

    fn error(&mut self, error: &query::Error) {
        self.print(format_args!("Listings cannot be loaded: {error}"));
        self.print(format_args!("  [Retry]"));
    }

    fn notice(&mut self, notice: &Notice) {
        self.print(format_args!("Notice: {notice}"));
    }
}

/// Formats a single [`FacetOption`] along with its count, if any.
fn option(option: &FacetOption) -> String {
    let FacetOption {
        label, icon, count, ..
    } = option;
    let count = count.to_string();
    if count.is_empty() {
        format!("{icon} {label}")
    } else {
        format!("{icon} {label} ({count})")
    }
}

/// Formats the pagination bar of the provided [`Window`].
///
/// Disabled navigation buttons are left blank.
fn pagination_bar(window: &Window) -> String {
    let prev = if window.has_prev { "<" } else { " " };
    let next = if window.has_next { ">" } else { " " };
    let pages = window
        .entries()
        .map(|entry| match entry {
            Entry::Page {
                number,
                current: true,
            } => format!("[{number}]"),
            Entry::Page {
                number,
                current: false,
            } => number.to_string(),
            Entry::Ellipsis => "...".to_owned(),
        })
        .join(" ");
    format!("{prev} {pages} {next}")
}

#[cfg(test)]
mod spec {
    use common::pagination::{Number, Size, Window, DEFAULT_MAX_VISIBLE};
    use service::{
        browse::{render::EmptyState, Fragment, Notice, View as _},
        domain::{
            facet::{Count, Kind},
            FacetOption,
        },
    };

    use super::{pagination_bar, Terminal};

    fn window(page: u32, total: u64) -> Window {
        Window::compute(
            Number::new(page).unwrap(),
            total,
            Size::DEFAULT,
            DEFAULT_MAX_VISIBLE,
        )
    }

    fn output(terminal: Terminal<Vec<u8>>) -> String {
        String::from_utf8(terminal.into_inner()).unwrap()
    }

    #[test]
    fn prints_pagination_bar() {
        assert_eq!(pagination_bar(&window(1, 5)), "  [1]  ");
        assert_eq!(
            pagination_bar(&window(2, 120)),
            "< 1 [2] 3 4 5 ... 10 >",
        );
    }

    #[test]
    fn prints_empty_state() {
        let mut terminal = Terminal::new(Vec::new());

        terminal.results(
            &[Fragment::Empty(EmptyState::NO_RESULTS)],
            &window(1, 0),
            0,
        );

        let out = output(terminal);
        assert!(out.starts_with("0 listings\nNo listings found\n"));
        assert!(out.contains("[Clear filters]"));
    }

    #[test]
    fn hides_empty_facets() {
        let mut terminal = Terminal::new(Vec::new());

        terminal.facets(Kind::Subcategory, &[]);
        terminal.facets(
            Kind::Category,
            &[
                FacetOption {
                    id: 1_u32.into(),
                    label: "Food".to_owned(),
                    icon: "*".to_owned(),
                    count: Count::Known(2),
                },
                FacetOption {
                    id: 2_u32.into(),
                    label: "Retail".to_owned(),
                    icon: "*".to_owned(),
                    count: Count::Uncounted,
                },
            ],
        );
        terminal.notice(&Notice::CountsUnavailable(Kind::City));

        let out = output(terminal);
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(": * Food (2), * Retail"));
        assert!(lines[1].starts_with("Notice: "));
    }

    fn status(label: &str, count: Count) -> FacetOption {
        FacetOption {
            id: 1_u32.into(),
            label: label.to_owned(),
            icon: "#".to_owned(),
            count,
        }
    }

    #[test]
    fn sums_up_status_tabs() {
        let mut terminal = Terminal::new(Vec::new());

        terminal.facets(
            Kind::Status,
            &[status("active", Count::Pending), status("sold", Count::Pending)],
        );
        terminal.facets(
            Kind::Status,
            &[
                status("active", Count::Known(3)),
                status("sold", Count::Known(2)),
            ],
        );

        let out = output(terminal);
        let lines = out.lines().collect::<Vec<_>>();
        assert!(!lines[0].contains("total"));
        assert!(lines[1].ends_with("# sold (2) | total 5"), "{}", lines[1]);
    }
}
