use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinSet;

use crate::catalog::{CatalogClient, CatalogFuture};
use crate::error::{Error, Result};
use crate::search::scheduler::SearchScheduler;
use crate::sink::{RequestId, ResultSink};

/// Issues catalog requests and reports them to the sink.
/// Shared between the session and the scheduler's trigger.
struct Issuer<C, S> {
    catalog: Arc<C>,
    sink: Arc<S>,
    runtime: Handle,
    /// Last id handed out; 0 means nothing issued yet
    issued: AtomicU64,
    /// Outstanding requests, aborted on teardown
    in_flight: Mutex<JoinSet<()>>,
    /// Set on teardown; a timer that already fired must not reach the sink
    closed: AtomicBool,
}

impl<C: CatalogClient, S: ResultSink> Issuer<C, S> {
    fn issue(&self, label: &str, request: impl FnOnce(&C) -> CatalogFuture) {
        // Holding the lock orders this against close
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if self.closed.load(Ordering::SeqCst) {
            tracing::debug!("Session closed, dropping catalog {}", label);
            return;
        }

        let id = RequestId(self.issued.fetch_add(1, Ordering::SeqCst).wrapping_add(1));
        tracing::debug!("Issuing catalog {} {}", label, id);

        self.sink.on_loading(id);
        let request = request(&self.catalog);
        let sink = Arc::clone(&self.sink);

        // Reap finished requests so the set only holds live ones
        while in_flight.try_join_next().is_some() {}
        in_flight.spawn_on(
            async move {
                match request.await {
                    Ok(products) => sink.on_success(id, products),
                    Err(e) => sink.on_error(id, e),
                }
            },
            &self.runtime,
        );
    }

    fn last_issued(&self) -> Option<RequestId> {
        match self.issued.load(Ordering::SeqCst) {
            0 => None,
            n => Some(RequestId(n)),
        }
    }

    fn close(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        self.closed.store(true, Ordering::SeqCst);
        if !in_flight.is_empty() {
            tracing::debug!("Aborting {} in-flight catalog requests", in_flight.len());
        }
        in_flight.abort_all();
    }
}

/// One search box bound to a catalog and a result sink.
///
/// Input is debounced through a [`SearchScheduler`]; each settled query and each
/// [`load_all`](Self::load_all) gets the next [`RequestId`], an immediate
/// `on_loading`, and exactly one terminal signal once the catalog answers.
/// Dropping the session cancels the armed timer and aborts in-flight requests,
/// after which the sink hears nothing more.
pub struct SearchSession<C: CatalogClient, S: ResultSink> {
    scheduler: SearchScheduler,
    issuer: Arc<Issuer<C, S>>,
}

impl<C: CatalogClient, S: ResultSink> SearchSession<C, S> {
    pub fn new(catalog: Arc<C>, sink: Arc<S>, delay: Duration) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let issuer = Arc::new(Issuer {
            catalog,
            sink,
            runtime: runtime.clone(),
            issued: AtomicU64::new(0),
            in_flight: Mutex::new(JoinSet::new()),
            closed: AtomicBool::new(false),
        });

        let trigger = Arc::clone(&issuer);
        let scheduler = SearchScheduler::with_handle(runtime, delay, move |query: String| {
            trigger.issue("search", |catalog| catalog.search(&query));
        });

        Ok(Self { scheduler, issuer })
    }

    /// Fetch the unfiltered catalog right away.
    pub fn load_all(&self) {
        self.issuer.issue("list", |catalog| catalog.list_all());
    }

    pub fn on_input(&mut self, text: impl Into<String>) {
        self.scheduler.on_input(text);
    }

    pub fn cancel(&mut self) {
        self.scheduler.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn last_issued(&self) -> Option<RequestId> {
        self.issuer.last_issued()
    }
}

impl<C: CatalogClient, S: ResultSink> Drop for SearchSession<C, S> {
    fn drop(&mut self) {
        self.scheduler.reset();
        self.issuer.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::catalog::Product;
    use crate::error::{CatalogError, CatalogErrorKind};

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Loading(u64),
        Success(u64, Vec<String>),
        Error(u64, CatalogErrorKind),
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ResultSink for RecordingSink {
        fn on_loading(&self, id: RequestId) {
            self.events.lock().unwrap().push(Event::Loading(id.0));
        }

        fn on_success(&self, id: RequestId, products: Vec<Product>) {
            let names = products.into_iter().map(|p| p.name).collect();
            self.events.lock().unwrap().push(Event::Success(id.0, names));
        }

        fn on_error(&self, id: RequestId, error: CatalogError) {
            self.events.lock().unwrap().push(Event::Error(id.0, error.kind()));
        }
    }

    /// In-memory catalog with per-query latency and optional failure
    #[derive(Default)]
    struct FakeCatalog {
        products: Vec<Product>,
        latency: HashMap<String, Duration>,
        failure: Option<CatalogError>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn stocked() -> Self {
            let product = |id: &str, name: &str, category: &str| Product {
                id: id.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                cost: 100.0,
                rating: 4,
                image: "https://i.imgur.com/lulqWzW.jpg".to_string(),
            };
            Self {
                products: vec![
                    product("1", "iPhone XR", "Phones"),
                    product("2", "Basketball", "Sports"),
                    product("3", "Pixel 7", "Phones"),
                ],
                ..Self::default()
            }
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }

        fn respond(&self, key: &str, products: Vec<Product>) -> CatalogFuture {
            self.queries.lock().unwrap().push(key.to_string());
            let latency = self.latency.get(key).copied().unwrap_or(Duration::from_millis(10));
            let outcome = match &self.failure {
                Some(e) => Err(e.clone()),
                None => Ok(products),
            };
            Box::pin(async move {
                tokio::time::sleep(latency).await;
                outcome
            })
        }
    }

    impl CatalogClient for FakeCatalog {
        fn list_all(&self) -> CatalogFuture {
            self.respond("<all>", self.products.clone())
        }

        fn search(&self, query: &str) -> CatalogFuture {
            let needle = query.to_lowercase();
            let matches = self
                .products
                .iter()
                .filter(|p| {
                    p.name.to_lowercase().contains(&needle)
                        || p.category.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect();
            self.respond(query, matches)
        }
    }

    const DELAY: Duration = Duration::from_millis(500);

    fn session(
        catalog: FakeCatalog,
    ) -> (
        SearchSession<FakeCatalog, RecordingSink>,
        Arc<FakeCatalog>,
        Arc<RecordingSink>,
    ) {
        let catalog = Arc::new(catalog);
        let sink = Arc::new(RecordingSink::default());
        let session = SearchSession::new(Arc::clone(&catalog), Arc::clone(&sink), DELAY).unwrap();
        (session, catalog, sink)
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn load_all_reports_full_catalog() {
        let (session, catalog, sink) = session(FakeCatalog::stocked());
        session.load_all();
        assert_eq!(sink.events(), vec![Event::Loading(1)]);

        sleep_ms(50).await;
        assert_eq!(catalog.queries(), vec!["<all>"]);
        assert_eq!(
            sink.events(),
            vec![
                Event::Loading(1),
                Event::Success(
                    1,
                    vec!["iPhone XR".into(), "Basketball".into(), "Pixel 7".into()]
                ),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn burst_reaches_catalog_once() {
        let (mut session, catalog, sink) = session(FakeCatalog::stocked());
        session.on_input("p");
        sleep_ms(100).await;
        session.on_input("ph");
        sleep_ms(100).await;
        session.on_input("phones");
        sleep_ms(400).await;
        assert!(sink.events().is_empty());

        sleep_ms(200).await;
        assert_eq!(catalog.queries(), vec!["phones"]);
        assert_eq!(
            sink.events(),
            vec![
                Event::Loading(1),
                Event::Success(1, vec!["iPhone XR".into(), "Pixel 7".into()]),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_query_is_searched() {
        let (mut session, catalog, sink) = session(FakeCatalog::stocked());
        session.on_input("");
        sleep_ms(600).await;

        assert_eq!(catalog.queries(), vec![""]);
        assert!(matches!(sink.events().last(), Some(Event::Success(1, names)) if names.len() == 3));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_reach_the_sink() {
        let (mut session, _catalog, sink) = session(FakeCatalog {
            failure: Some(CatalogError::request_setup("endpoint cannot carry a path")),
            ..FakeCatalog::stocked()
        });
        session.on_input("phone");
        sleep_ms(600).await;

        assert_eq!(
            sink.events(),
            vec![
                Event::Loading(1),
                Event::Error(1, CatalogErrorKind::RequestSetup)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_input_emits_nothing() {
        let (mut session, catalog, sink) = session(FakeCatalog::stocked());
        session.on_input("x");
        assert!(session.is_pending());
        sleep_ms(50).await;
        session.cancel();

        sleep_ms(2_000).await;
        assert!(catalog.queries().is_empty());
        assert!(sink.events().is_empty());
        assert_eq!(session.last_issued(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn request_ids_increase_per_issue() {
        let (mut session, _catalog, sink) = session(FakeCatalog::stocked());
        session.load_all();
        sleep_ms(50).await;
        session.on_input("ball");
        sleep_ms(600).await;
        session.on_input("pixel");
        sleep_ms(600).await;

        assert_eq!(session.last_issued(), Some(RequestId(3)));
        let loading: Vec<u64> = sink
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::Loading(id) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(loading, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn completions_are_not_reordered() {
        let catalog = FakeCatalog {
            latency: HashMap::from([
                ("slow".to_string(), Duration::from_millis(1_000)),
                ("fast".to_string(), Duration::from_millis(10)),
            ]),
            ..FakeCatalog::stocked()
        };
        let (mut session, _catalog, sink) = session(catalog);
        session.on_input("slow");
        sleep_ms(600).await;
        session.on_input("fast");
        sleep_ms(2_000).await;

        assert_eq!(
            sink.events(),
            vec![
                Event::Loading(1),
                Event::Loading(2),
                Event::Success(2, vec![]),
                Event::Success(1, vec![]),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn drop_silences_in_flight_requests() {
        let catalog = FakeCatalog {
            latency: HashMap::from([("lamp".to_string(), Duration::from_millis(1_000))]),
            ..FakeCatalog::stocked()
        };
        let (mut session, _catalog, sink) = session(catalog);
        session.on_input("lamp");
        sleep_ms(600).await;
        assert_eq!(sink.events(), vec![Event::Loading(1)]);

        drop(session);
        sleep_ms(2_000).await;
        assert_eq!(sink.events(), vec![Event::Loading(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn issue_after_close_reaches_nobody() {
        let (session, catalog, sink) = session(FakeCatalog::stocked());
        // A trigger already past its timer when the session goes away
        let issuer = Arc::clone(&session.issuer);
        drop(session);

        issuer.issue("search", |catalog| catalog.search("phone"));
        sleep_ms(100).await;
        assert!(catalog.queries().is_empty());
        assert!(sink.events().is_empty());
        assert_eq!(issuer.last_issued(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_armed_timer() {
        let (mut session, catalog, sink) = session(FakeCatalog::stocked());
        session.on_input("watch");
        drop(session);

        sleep_ms(2_000).await;
        assert!(catalog.queries().is_empty());
        assert!(sink.events().is_empty());
    }
}
