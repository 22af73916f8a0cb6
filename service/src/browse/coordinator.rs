//! [`Coordinator`] of a browse page.

use std::{mem, rc::Rc};

use common::{
    pagination::{self, Window},
    DateTime,
};
use derive_more::{Debug, Display};
use futures::{
    future::LocalBoxFuture, stream::FuturesUnordered, FutureExt as _,
    StreamExt as _,
};
use smart_default::SmartDefault;
use tracing as log;

use crate::{
    browse::{
        facets,
        filter::{Filter, Patch, Range, ValidationError},
        render::{Fragment, Renderer},
        Description,
    },
    domain::{
        facet::{self, Kind, Selector},
        listing::Scope,
        FacetOption,
    },
    query::{self, Query},
    read::listing::list::Page,
};

/// [`Coordinator`] configuration.
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// Number of listings per page.
    #[default(pagination::Size::DEFAULT)]
    pub page_size: pagination::Size,

    /// Number of leading page buttons shown before the ellipsis.
    #[default(pagination::DEFAULT_MAX_VISIBLE)]
    pub max_visible_pages: usize,

    /// Buckets of the price facet. No edges hide it.
    pub price_buckets: facet::PriceBuckets,
}

/// Write-only sink of everything a browse page shows.
pub trait View {
    /// Indicates that a listings query is in flight.
    fn loading(&mut self);

    /// Shows rendered results along with the pagination [`Window`].
    fn results(&mut self, fragments: &[Fragment], window: &Window, total: u64);

    /// Shows the [`FacetOption`]s of the provided [`Kind`].
    ///
    /// No options means the facet should be hidden.
    fn facets(&mut self, kind: Kind, options: &[FacetOption]);

    /// Shows a failed listings query, offering to [retry][`Event::Retry`].
    fn error(&mut self, error: &query::Error);

    /// Shows a non-blocking [`Notice`].
    fn notice(&mut self, notice: &Notice);
}

/// Non-blocking notice of a degraded browse page.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Notice {
    /// Options of a facet cannot be loaded.
    #[display("{_0} options are unavailable")]
    FacetUnavailable(Kind),

    /// Counts of a facet cannot be loaded.
    #[display("{_0} counts are unavailable")]
    CountsUnavailable(Kind),

    /// Part of the user input was ignored.
    #[display("{_0}")]
    InvalidInput(ValidationError),
}

/// User intent changing what a browse page shows.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// Merge a [`Patch`] into the current [`Filter`].
    Apply(Patch),

    /// Merge textual parameters into the current [`Filter`].
    Params(Vec<(String, String)>),

    /// Select the price bucket with the provided [`facet::Id`], or any
    /// price for [`None`].
    PriceBucket(Option<facet::Id>),

    /// Navigate to a page.
    GoToPage(pagination::Number),

    /// Reset the [`Filter`] to its empty state.
    ClearFilters,

    /// Repeat the failed listings query.
    Retry,
}

/// State of the listings part of a browse page.
#[derive(Clone, Debug, Default)]
pub enum State {
    /// Nothing requested yet.
    #[default]
    Idle,

    /// Waiting for the listings query with the provided sequence number.
    Loading {
        /// Sequence number of the latest listings query.
        sequence: u64,

        /// [`Description`] of the latest listings query.
        description: Description,
    },

    /// Results of the latest listings query are shown.
    Rendered(Page),

    /// The latest listings query failed.
    Failed(Description),
}

/// Result of a background query.
enum Arrival {
    /// Page of listings.
    Listings {
        sequence: u64,
        description: Description,
        result: Result<Page, query::Error>,
    },

    /// Options of a facet.
    Options {
        selector: Selector,
        result: Result<Vec<FacetOption>, query::Error>,
    },

    /// Counts of a facet.
    Counts {
        kind: Kind,
        result: Result<facet::Counts, query::Error>,
    },
}

/// Every [`Query`] a [`Coordinator`] issues.
pub trait Queries:
    Query<query::listings::List, Ok = Page, Err = query::Error>
    + Query<query::facets::Options, Ok = Vec<FacetOption>, Err = query::Error>
    + Query<query::facets::Counts, Ok = facet::Counts, Err = query::Error>
    + 'static
{
}

impl<T> Queries for T where
    T: Query<query::listings::List, Ok = Page, Err = query::Error>
        + Query<
            query::facets::Options,
            Ok = Vec<FacetOption>,
            Err = query::Error,
        > + Query<query::facets::Counts, Ok = facet::Counts, Err = query::Error>
        + 'static
{
}

/// Owner of a browse page [`Filter`], turning [`Event`]s into queries and
/// their results into [`View`] updates.
///
/// Queries run concurrently on the current thread, driven by
/// [`Coordinator::next()`]. Only the latest listings query is ever shown:
/// results of superseded ones are dropped on arrival.
#[derive(Debug)]
pub struct Coordinator<S, V> {
    /// Service executing [`Query`]s.
    service: Rc<S>,

    /// [`View`] showing the page.
    view: V,

    /// [`Scope`] of browsable listings.
    scope: Scope,

    /// [`Config`] of this [`Coordinator`].
    config: Config,

    /// [`Renderer`] of result [`Page`]s.
    renderer: Renderer,

    /// Current [`Filter`].
    filter: Filter,

    /// Loaded facet options.
    facets: facets::Cache,

    /// Current [`State`].
    state: State,

    /// Sequence number of the latest listings query.
    sequence: u64,

    /// Last page of the latest rendered results.
    last_page: Option<pagination::Number>,

    /// Queries in flight.
    #[debug(skip)]
    pending: FuturesUnordered<LocalBoxFuture<'static, Arrival>>,
}

impl<S: Queries, V: View> Coordinator<S, V> {
    /// Creates a new idle [`Coordinator`].
    #[must_use]
    pub fn new(
        service: S,
        view: V,
        scope: Scope,
        config: Config,
        renderer: Renderer,
    ) -> Self {
        Self {
            service: Rc::new(service),
            view,
            scope,
            config,
            renderer,
            filter: Filter::default(),
            facets: facets::Cache::default(),
            state: State::Idle,
            sequence: 0,
            last_page: None,
            pending: FuturesUnordered::new(),
        }
    }

    /// Returns the current [`Filter`].
    #[must_use]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Returns the current [`State`].
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns the loaded facet options.
    #[must_use]
    pub fn facets(&self) -> &facets::Cache {
        &self.facets
    }

    /// Returns the [`View`].
    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Returns the [`View`] mutably, for showing things outside of the
    /// browse flow.
    #[must_use]
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Indicates whether no query is in flight.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Opens the browse page with the [`Filter`] described by the provided
    /// textual parameters (e.g. a deep link), loading facets and results.
    pub fn open<'p>(
        &mut self,
        params: impl IntoIterator<Item = (&'p str, &'p str)>,
    ) {
        let (filter, errors) = Filter::default().apply_params(params);
        self.report(errors);
        self.filter = filter;

        self.request_options(Selector::categories());
        self.request_options(Selector::cities());
        if let Some(id) = self.filter.single_category() {
            self.request_options(Selector::subcategories(id));
        }
        self.show_options(
            Selector::prices(),
            self.config.price_buckets.options(),
        );
        if self.scope.owner.is_some() {
            let statuses = self
                .scope
                .statuses
                .iter()
                .map(|s| FacetOption {
                    id: (*s).into(),
                    label: s.to_string(),
                    icon: Kind::Status.default_icon().to_owned(),
                    count: facet::Count::Uncounted,
                })
                .collect();
            self.show_options(Selector::statuses(), statuses);
        }
        self.request_listings();
    }

    /// Dispatches the provided [`Event`], issuing the queries it requires.
    pub fn dispatch(&mut self, event: Event) {
        log::debug!("dispatching {event:?}");

        match event {
            Event::Apply(patch) => self.change(self.filter.apply(patch)),
            Event::Params(params) => {
                let (filter, errors) = self
                    .filter
                    .apply_params(params.iter().map(|(k, v)| (&**k, &**v)));
                self.report(errors);
                self.change(filter);
            }
            Event::PriceBucket(id) => {
                let range = match id {
                    None => Range::UNBOUNDED,
                    Some(id) => {
                        let Some(bucket) = self.config.price_buckets.get(id)
                        else {
                            self.report(vec![ValidationError::Malformed {
                                name: "price".to_owned(),
                                expected: "a price bucket",
                                value: id.to_string(),
                            }]);
                            return;
                        };
                        bucket.into()
                    }
                };
                let patch = Patch::default().with_price(range);
                self.change(self.filter.apply(patch));
            }
            Event::GoToPage(number) => {
                let number = self.last_page.map_or(number, |l| number.min(l));
                let patch = Patch::default().with_page(number);
                self.change(self.filter.apply(patch));
            }
            Event::ClearFilters => self.change(Filter::default()),
            Event::Retry => match mem::take(&mut self.state) {
                State::Failed(description) => self.issue(description),
                state @ (State::Idle
                | State::Loading { .. }
                | State::Rendered(_)) => {
                    self.state = state;
                    self.request_listings();
                }
            },
        }
    }

    /// Waits for the next query to complete and commits its result.
    ///
    /// Returns `false` if no query is in flight.
    pub async fn next(&mut self) -> bool {
        let Some(arrival) = self.pending.next().await else {
            return false;
        };
        self.commit(arrival);
        true
    }

    /// Waits for every query in flight, including the ones issued while
    /// waiting.
    pub async fn settle(&mut self) {
        while self.next().await {}
    }

    /// Dispatches the provided [`Event`] and [settles][`Self::settle()`].
    pub async fn handle(&mut self, event: Event) {
        self.dispatch(event);
        self.settle().await;
    }

    /// Reports the provided [`ValidationError`]s as [`Notice`]s.
    fn report(&mut self, errors: Vec<ValidationError>) {
        for e in errors {
            log::debug!("ignoring invalid input: {e}");
            self.view.notice(&Notice::InvalidInput(e));
        }
    }

    /// Replaces the current [`Filter`] and queries listings matching it.
    fn change(&mut self, next: Filter) {
        let category = next.single_category();
        let category_changed = category != self.filter.single_category();
        self.filter = next;

        if category_changed {
            self.facets.discard_subcategories();
            self.view.facets(Kind::Subcategory, &[]);
            if let Some(id) = category {
                self.request_options(Selector::subcategories(id));
            }
        }
        self.request_listings();
    }

    /// Queries listings matching the current [`Filter`].
    fn request_listings(&mut self) {
        self.issue(Description::build(
            &self.filter,
            &self.scope,
            self.config.page_size,
        ));
    }

    /// Issues a listings query of the provided [`Description`], superseding
    /// any previous one.
    fn issue(&mut self, description: Description) {
        self.sequence += 1;
        let sequence = self.sequence;
        log::debug!("issuing listings query #{sequence}");

        self.state = State::Loading {
            sequence,
            description: description.clone(),
        };
        self.view.loading();

        let service = Rc::clone(&self.service);
        self.pending.push(
            async move {
                let result = <S as Query<query::listings::List>>::execute(
                    &service,
                    query::listings::List::by(description.clone()),
                )
                .await;
                Arrival::Listings {
                    sequence,
                    description,
                    result,
                }
            }
            .boxed_local(),
        );
    }

    /// Queries options picked by the provided [`Selector`].
    fn request_options(&mut self, selector: Selector) {
        let service = Rc::clone(&self.service);
        self.pending.push(
            async move {
                let result = <S as Query<query::facets::Options>>::execute(
                    &service,
                    query::facets::Options::by(selector),
                )
                .await;
                Arrival::Options { selector, result }
            }
            .boxed_local(),
        );
    }

    /// Queries counts of the options of the provided [`Kind`].
    ///
    /// Counts ignore the [`Filter`], status tabs included.
    fn request_counts(&mut self, kind: Kind) {
        let buckets = &self.config.price_buckets;
        let Some(group_by) = facet::GroupBy::of(kind, buckets) else {
            return;
        };
        let selector = facet::CountSelector {
            group_by,
            scope: self.scope.clone(),
        };
        let service = Rc::clone(&self.service);
        self.pending.push(
            async move {
                let result = <S as Query<query::facets::Counts>>::execute(
                    &service,
                    query::facets::Counts::by(selector),
                )
                .await;
                Arrival::Counts { kind, result }
            }
            .boxed_local(),
        );
    }

    /// Commits the provided [`Arrival`] to the [`State`] and the [`View`].
    fn commit(&mut self, arrival: Arrival) {
        match arrival {
            Arrival::Listings {
                sequence,
                description,
                result,
            } => {
                if sequence != self.sequence {
                    log::debug!(
                        "dropping listings query #{sequence} superseded by \
                         #{}",
                        self.sequence,
                    );
                    return;
                }
                match result {
                    Ok(page)
                        if page.is_out_of_range()
                            && page.last_page() < page.number =>
                    {
                        let last = page.last_page();
                        log::debug!(
                            "page {} is past the last one, clamping to {last}",
                            page.number,
                        );
                        self.filter =
                            self.filter.apply(Patch::default().with_page(last));
                        self.issue(description.with_page(last));
                    }
                    Ok(page) => self.render(page),
                    Err(e) => {
                        log::error!("listings query #{sequence} failed: {e}");
                        self.view.error(&e);
                        self.state = State::Failed(description);
                    }
                }
            }
            Arrival::Options { selector, result } => {
                let kind = selector.kind;
                if kind == Kind::Subcategory
                    && selector.parent != self.filter.single_category()
                {
                    log::debug!("dropping options of a deselected category");
                    return;
                }
                let options = match result {
                    Ok(options) => options,
                    Err(e) => {
                        log::warn!("`{kind}` options are unavailable: {e}");
                        self.view.notice(&Notice::FacetUnavailable(kind));
                        Vec::new()
                    }
                };
                self.show_options(selector, options);
            }
            Arrival::Counts { kind, result } => {
                match result {
                    Ok(counts) => self.facets.apply_counts(kind, &counts),
                    Err(e) => {
                        log::warn!("`{kind}` counts are unavailable: {e}");
                        self.facets.drop_counts(kind);
                        self.view.notice(&Notice::CountsUnavailable(kind));
                    }
                }
                self.view.facets(kind, self.facets.get(kind));
            }
        }
    }

    /// Stores and shows the provided options, querying their counts if
    /// needed.
    fn show_options(&mut self, selector: Selector, options: Vec<FacetOption>) {
        let kind = selector.kind;
        let counted = kind.is_counted() && !options.is_empty();

        self.facets.store(selector, options);
        self.view.facets(kind, self.facets.get(kind));
        if counted {
            self.request_counts(kind);
        }
    }

    /// Shows the provided [`Page`].
    fn render(&mut self, page: Page) {
        let fragments = self.renderer.render(&page, DateTime::now());
        let window = Window::compute(
            page.number,
            page.total_count,
            page.size,
            self.config.max_visible_pages,
        );
        log::debug!(
            "showing page {} of {} ({} listings in total)",
            page.number,
            window.total_pages(),
            page.total_count,
        );

        self.view.results(&fragments, &window, page.total_count);
        self.last_page = Some(page.last_page());
        self.state = State::Rendered(page);
    }
}

#[cfg(test)]
mod spec {
    use std::{cell::Cell, rc::Rc, time::Duration};

    use common::{
        money::Currency,
        operations::{By, Select},
        pagination::{Number, Size, Window},
    };
    use rust_decimal::Decimal;
    use tracerr::Traced;

    use crate::{
        browse::{
            description::Constraint,
            filter::{Patch, Range, ValidationError},
            render::{EmptyState, Fragment, Renderer},
            Description,
        },
        domain::{
            facet::{self, Count, Kind},
            listing::{Scope, Status},
            FacetOption,
        },
        infra::{
            backend::{self, memory::spec::memory},
            Backend, Memory,
        },
        query,
        read::listing::list::Page,
        Config, Service,
    };

    use super::{Coordinator, Event, Notice, State, View};

    /// [`Memory`] backend with scripted delays and failures.
    #[derive(Clone, Debug)]
    struct Scripted {
        memory: Memory,
        delay: Rc<Cell<Duration>>,
        fail_listings: Rc<Cell<bool>>,
        fail_options: Rc<Cell<bool>>,
        fail_counts: Rc<Cell<bool>>,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                memory: memory(),
                delay: Rc::default(),
                fail_listings: Rc::default(),
                fail_options: Rc::default(),
                fail_counts: Rc::default(),
            }
        }

        fn failure() -> Traced<backend::Error> {
            let e = serde_json::from_str::<()>("").unwrap_err();
            tracerr::new!(backend::Error::Decode(e))
        }
    }

    impl Backend<Select<By<Page, Description>>> for Scripted {
        type Ok = Page;
        type Err = Traced<backend::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<Page, Description>>,
        ) -> Result<Self::Ok, Self::Err> {
            let slow = Constraint::Text("slow".to_owned());
            let delay = if by.inner().constraints.contains(&slow) {
                Duration::from_secs(5)
            } else {
                self.delay.get()
            };
            tokio::time::sleep(delay).await;

            if self.fail_listings.get() {
                return Err(Self::failure());
            }
            self.memory.execute(Select(by)).await
        }
    }

    impl Backend<Select<By<Vec<FacetOption>, facet::Selector>>> for Scripted {
        type Ok = Vec<FacetOption>;
        type Err = Traced<backend::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<Vec<FacetOption>, facet::Selector>>,
        ) -> Result<Self::Ok, Self::Err> {
            if self.fail_options.get() {
                return Err(Self::failure());
            }
            self.memory.execute(Select(by)).await
        }
    }

    impl Backend<Select<By<facet::Counts, facet::CountSelector>>> for Scripted {
        type Ok = facet::Counts;
        type Err = Traced<backend::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<facet::Counts, facet::CountSelector>>,
        ) -> Result<Self::Ok, Self::Err> {
            if self.fail_counts.get() {
                return Err(Self::failure());
            }
            self.memory.execute(Select(by)).await
        }
    }

    /// [`View`] recording everything shown.
    #[derive(Debug, Default)]
    struct Recorder {
        loading: usize,
        results: Vec<(Vec<Fragment>, Window, u64)>,
        facets: Vec<(Kind, Vec<FacetOption>)>,
        errors: Vec<String>,
        notices: Vec<Notice>,
    }

    impl Recorder {
        /// Every showing of the facet of the provided [`Kind`], oldest first.
        fn facet_history(&self, kind: Kind) -> Vec<&[FacetOption]> {
            self.facets
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, o)| o.as_slice())
                .collect()
        }

        fn last_facets(&self, kind: Kind) -> Option<&[FacetOption]> {
            self.facet_history(kind).last().copied()
        }

        fn facets_of(&self, kind: Kind) -> &[FacetOption] {
            self.last_facets(kind).unwrap()
        }

        fn last_results(&self) -> &(Vec<Fragment>, Window, u64) {
            self.results.last().unwrap()
        }

        fn cards(&self) -> usize {
            self.last_results()
                .0
                .iter()
                .filter(|f| matches!(f, Fragment::Card(_)))
                .count()
        }
    }

    impl View for Recorder {
        fn loading(&mut self) {
            self.loading += 1;
        }

        fn results(
            &mut self,
            fragments: &[Fragment],
            window: &Window,
            total: u64,
        ) {
            self.results.push((fragments.to_vec(), window.clone(), total));
        }

        fn facets(&mut self, kind: Kind, options: &[FacetOption]) {
            self.facets.push((kind, options.to_vec()));
        }

        fn error(&mut self, error: &query::Error) {
            self.errors.push(error.to_string());
        }

        fn notice(&mut self, notice: &Notice) {
            self.notices.push(notice.clone());
        }
    }

    type TestCoordinator = Coordinator<Service<Scripted>, Recorder>;

    fn coordinator(backend: &Scripted) -> TestCoordinator {
        coordinator_with(backend, super::Config::default(), Config::default())
    }

    fn coordinator_with(
        backend: &Scripted,
        config: super::Config,
        service: Config,
    ) -> TestCoordinator {
        Coordinator::new(
            Service::new(service, backend.clone()),
            Recorder::default(),
            Scope::default(),
            config,
            Renderer::default(),
        )
    }

    async fn opened(backend: &Scripted) -> TestCoordinator {
        let mut c = coordinator(backend);
        c.open([]);
        c.settle().await;
        c
    }

    #[tokio::test(start_paused = true)]
    async fn opens_with_facets_and_results() {
        let c = opened(&Scripted::new()).await;

        assert!(c.is_settled());
        assert!(matches!(c.state(), State::Rendered(_)));
        assert_eq!(c.view().results.len(), 1);
        assert_eq!(c.view().cards(), 3);
        assert_eq!(c.view().last_results().2, 3);

        let counts = c.view().facets_of(Kind::Category)
            .iter()
            .map(|o| (o.label.as_str(), o.count))
            .collect::<Vec<_>>();
        assert_eq!(
            counts,
            [
                ("Food", Count::Known(2)),
                ("Retail", Count::Known(1)),
                ("Services", Count::Known(0)),
            ],
        );
        assert!(c.view().facets_of(Kind::City)
            .iter()
            .all(|o| o.count == Count::Uncounted));
        assert!(c.view().last_facets(Kind::Subcategory).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn latest_request_wins() {
        let mut c = opened(&Scripted::new()).await;

        c.dispatch(Event::Apply(Patch::default().with_search("slow")));
        c.dispatch(Event::Apply(Patch::default().with_search("cafe")));
        c.settle().await;

        assert_eq!(c.view().results.len(), 2);
        assert_eq!(c.view().cards(), 2);
        assert_eq!(c.filter().search(), "cafe");
        let State::Rendered(page) = c.state() else {
            panic!("not rendered: {:?}", c.state());
        };
        assert_eq!(page.total_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn category_without_subcategories() {
        let mut c = opened(&Scripted::new()).await;

        c.handle(Event::Apply(
            Patch::default().with_categories([facet::Id::from(2)]),
        ))
        .await;

        assert!(c.view().facets_of(Kind::Subcategory).is_empty());
        assert_eq!(c.facets().subcategories_of(), Some(2.into()));
        assert_eq!(c.view().cards(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn loads_subcategories_of_selected_category() {
        let mut c = opened(&Scripted::new()).await;

        c.handle(Event::Apply(
            Patch::default().with_categories([facet::Id::from(1)]),
        ))
        .await;

        let labels = c.view().facets_of(Kind::Subcategory)
            .iter()
            .map(|o| o.label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(labels, ["Bakery", "Cafe"]);

        c.handle(Event::Apply(Patch::default().with_categories([])))
            .await;

        assert!(c.view().facets_of(Kind::Subcategory).is_empty());
        assert_eq!(c.facets().subcategories_of(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn drops_subcategories_of_deselected_category() {
        let mut c = opened(&Scripted::new()).await;

        c.dispatch(Event::Apply(
            Patch::default().with_categories([facet::Id::from(1)]),
        ));
        c.dispatch(Event::Apply(
            Patch::default().with_categories([facet::Id::from(2)]),
        ));
        c.settle().await;

        assert_eq!(c.facets().subcategories_of(), Some(2.into()));
        assert!(c.view().facets_of(Kind::Subcategory).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn renders_empty_state() {
        let mut c = opened(&Scripted::new()).await;

        c.handle(Event::Apply(Patch::default().with_search("submarine")))
            .await;

        let (fragments, window, total) = c.view().last_results();
        assert_eq!(fragments, &[Fragment::Empty(EmptyState::NO_RESULTS)]);
        assert_eq!(*total, 0);
        assert_eq!(window.pages, [Number::FIRST]);
        assert!(!window.has_prev);
        assert!(!window.has_next);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_failed_query() {
        let backend = Scripted::new();
        let mut c = opened(&backend).await;

        backend.fail_listings.set(true);
        c.handle(Event::Apply(Patch::default().with_search("cafe")))
            .await;

        assert_eq!(c.view().errors.len(), 1);
        let State::Failed(description) = c.state().clone() else {
            panic!("not failed: {:?}", c.state());
        };

        backend.fail_listings.set(false);
        c.dispatch(Event::Retry);
        let State::Loading {
            description: retried,
            ..
        } = c.state()
        else {
            panic!("not loading: {:?}", c.state());
        };
        assert_eq!(*retried, description);

        c.settle().await;
        assert!(matches!(c.state(), State::Rendered(_)));
        assert_eq!(c.view().cards(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_slow_backend() {
        let backend = Scripted::new();
        let mut c = coordinator_with(
            &backend,
            super::Config::default(),
            Config {
                timeout: Duration::from_secs(1),
            },
        );
        backend.delay.set(Duration::from_secs(30));

        c.open([]);
        c.settle().await;

        assert!(matches!(c.state(), State::Failed(_)));
        assert_eq!(c.view().errors.len(), 1);
        assert!(
            c.view().errors[0].contains("did not answer"),
            "{}",
            c.view().errors[0],
        );
    }

    #[tokio::test(start_paused = true)]
    async fn facet_failure_does_not_block_results() {
        let backend = Scripted::new();
        backend.fail_options.set(true);

        let c = opened(&backend).await;

        let notices = &c.view().notices;
        assert!(notices.contains(&Notice::FacetUnavailable(Kind::Category)));
        assert!(notices.contains(&Notice::FacetUnavailable(Kind::City)));
        assert!(c.view().facets_of(Kind::Category).is_empty());
        assert_eq!(c.view().cards(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn count_failure_keeps_options() {
        let backend = Scripted::new();
        backend.fail_counts.set(true);

        let c = opened(&backend).await;

        let notices = &c.view().notices;
        assert_eq!(notices.len(), 2, "{notices:?}");
        assert!(notices.contains(&Notice::CountsUnavailable(Kind::Category)));
        assert!(notices.contains(&Notice::CountsUnavailable(Kind::Price)));
        let categories = c.view().facets_of(Kind::Category);
        assert_eq!(categories.len(), 3);
        assert!(categories.iter().all(|o| o.count == Count::Uncounted));
    }

    #[tokio::test(start_paused = true)]
    async fn clamps_deep_linked_page() {
        let mut c = coordinator(&Scripted::new());

        c.open([("page", "5")]);
        c.settle().await;

        assert_eq!(c.filter().page(), Number::FIRST);
        assert_eq!(c.view().results.len(), 1);
        assert_eq!(c.view().cards(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn navigates_within_known_pages() {
        let backend = Scripted::new();
        let mut c = coordinator_with(
            &backend,
            super::Config {
                page_size: Size::new(1).unwrap(),
                max_visible_pages: 2,
                ..super::Config::default()
            },
            Config::default(),
        );
        c.open([]);
        c.settle().await;

        let window = &c.view().last_results().1;
        assert_eq!(window.total_pages(), 3);
        assert!(window.show_ellipsis_and_last);

        c.handle(Event::GoToPage(Number::new(10).unwrap())).await;

        assert_eq!(c.filter().page(), Number::new(3).unwrap());
        assert_eq!(c.view().last_results().1.current, Number::new(3).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn clears_filters() {
        let mut c = opened(&Scripted::new()).await;
        c.handle(Event::Params(vec![
            ("search".to_owned(), "cafe".to_owned()),
            ("category".to_owned(), "1".to_owned()),
        ]))
        .await;
        assert_eq!(c.view().cards(), 1);

        c.handle(Event::ClearFilters).await;

        assert_eq!(c.filter(), &super::Filter::default());
        assert_eq!(c.view().cards(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_invalid_input() {
        let mut c = opened(&Scripted::new()).await;

        c.handle(Event::Params(vec![(
            "sort".to_owned(),
            "random".to_owned(),
        )]))
        .await;

        assert!(matches!(
            c.view().notices.as_slice(),
            [Notice::InvalidInput(ValidationError::Malformed { .. })],
        ));
        assert_eq!(c.view().cards(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn counted_options_show_pending_then_known() {
        let c = opened(&Scripted::new()).await;

        let history = c.view().facet_history(Kind::Category);
        assert_eq!(history.len(), 2);
        assert!(history[0].iter().all(|o| o.count == Count::Pending));
        assert!(history[1].iter().all(|o| matches!(o.count, Count::Known(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn shows_price_buckets_with_counts() {
        let c = opened(&Scripted::new()).await;

        let counts = c
            .view()
            .facets_of(Kind::Price)
            .iter()
            .map(|o| o.count)
            .collect::<Vec<_>>();
        assert_eq!(
            counts,
            [
                Count::Known(1),
                Count::Known(0),
                Count::Known(1),
                Count::Known(0),
                Count::Known(0),
            ],
        );
        let first = &c.view().facets_of(Kind::Price)[0];
        assert_eq!(first.label, "₺0 - ₺500.000");
    }

    #[tokio::test(start_paused = true)]
    async fn hides_price_facet_without_buckets() {
        let mut c = coordinator_with(
            &Scripted::new(),
            super::Config {
                price_buckets: facet::PriceBuckets::new(
                    Vec::<Decimal>::new(),
                    Currency::Try,
                ),
                ..super::Config::default()
            },
            Config::default(),
        );
        c.open([]);
        c.settle().await;

        assert!(c.view().facets_of(Kind::Price).is_empty());
        assert!(!c.view().notices.iter().any(|n| matches!(
            n,
            Notice::CountsUnavailable(Kind::Price),
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn selects_price_bucket() {
        let mut c = opened(&Scripted::new()).await;

        c.handle(Event::PriceBucket(Some(1.into()))).await;

        assert_eq!(
            c.filter().price(),
            Range::new(Some(Decimal::ZERO), Some(Decimal::from(500_000))),
        );
        assert_eq!(c.view().cards(), 1);

        c.handle(Event::PriceBucket(Some(9.into()))).await;
        assert!(matches!(
            c.view().notices.as_slice(),
            [Notice::InvalidInput(ValidationError::Malformed { .. })],
        ));
        assert_eq!(c.view().cards(), 1);

        c.handle(Event::PriceBucket(None)).await;
        assert!(c.filter().price().is_unbounded());
        assert_eq!(c.view().cards(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn public_page_has_no_status_tabs() {
        let c = opened(&Scripted::new()).await;

        assert!(c.view().last_facets(Kind::Status).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn owner_page_has_status_tabs() {
        let owner = "20000000-0000-0000-0000-000000000000".parse().unwrap();
        let backend = Scripted::new();
        let mut c = Coordinator::new(
            Service::new(Config::default(), backend.clone()),
            Recorder::default(),
            Scope::owned_by(owner),
            super::Config::default(),
            Renderer::default(),
        );
        c.open([]);
        c.settle().await;

        let tabs = c
            .view()
            .facets_of(Kind::Status)
            .iter()
            .map(|o| (o.label.as_str(), o.count))
            .collect::<Vec<_>>();
        assert_eq!(
            tabs,
            [
                ("active", Count::Known(1)),
                ("pending", Count::Known(0)),
                ("sold", Count::Known(1)),
                ("inactive", Count::Known(0)),
            ],
        );
        assert_eq!(c.view().cards(), 2);

        c.handle(Event::Apply(
            Patch::default().with_status(Some(Status::Sold)),
        ))
        .await;

        assert_eq!(c.view().cards(), 1);
        assert_eq!(c.view().last_results().2, 1);
        assert_eq!(c.view().facet_history(Kind::Status).len(), 2);
    }
}
