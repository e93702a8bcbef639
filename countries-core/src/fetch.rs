//! Fetch lifecycle tracking with supersede-and-cancel semantics.
//!
//! A [`Loader`] owns at most one in-flight fetch for one resource.
//! Starting a new fetch supersedes the previous one; cancelling returns
//! the loader to idle. Either way the superseded task is aborted and any
//! completion it still manages to deliver is discarded by generation
//! check, so a stale result can never mutate state.
//!
//! Cancellation is not a failure: it produces no `Failed` state and no
//! warn-level log.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::api::WeatherProvider;
use crate::error::ApiError;
use crate::model::{Country, WeatherSnapshot};

/// Lifecycle of a fetched resource.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Ready(T),
    /// User-facing failure message; the underlying error was already
    /// logged where it surfaced.
    Failed(String),
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Tracks a single resource fetched at most once at a time.
#[derive(Debug)]
pub struct Loader<T> {
    state: FetchState<T>,
    generation: u64,
    task: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<(u64, Result<T, ApiError>)>,
    rx: mpsc::UnboundedReceiver<(u64, Result<T, ApiError>)>,
}

impl<T> Default for Loader<T> {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { state: FetchState::Idle, generation: 0, task: None, tx, rx }
    }
}

impl<T: Send + 'static> Loader<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Start a fetch, superseding (aborting) any fetch still in flight.
    pub fn start<F>(&mut self, fut: F)
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.abort_in_flight();
        self.generation += 1;
        self.state = FetchState::Loading;

        let generation = self.generation;
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            // The receiver ignores this if the fetch was superseded.
            let _ = tx.send((generation, fut.await));
        }));
    }

    /// Abort any in-flight fetch and return to idle. A response that
    /// slips through anyway is dropped by the generation check in
    /// [`Self::settle`].
    pub fn cancel(&mut self) {
        self.abort_in_flight();
        if self.state.is_loading() {
            self.state = FetchState::Idle;
        }
    }

    /// Drop the held value (and any in-flight fetch) entirely.
    pub fn clear(&mut self) {
        self.abort_in_flight();
        self.state = FetchState::Idle;
    }

    /// Wait until the current fetch resolves, then apply its outcome.
    /// Returns immediately when nothing is loading. Stale completions
    /// from superseded fetches are discarded without touching state.
    pub async fn settle(&mut self) {
        while self.state.is_loading() {
            match self.rx.recv().await {
                Some((generation, result)) if generation == self.generation => {
                    self.apply(result);
                }
                Some(_) => {} // superseded fetch; discard
                None => break,
            }
        }
        self.task = None;
    }

    fn apply(&mut self, result: Result<T, ApiError>) {
        match result {
            Ok(value) => self.state = FetchState::Ready(value),
            Err(err) => {
                warn!(%err, "fetch failed");
                self.state = FetchState::Failed(err.to_string());
            }
        }
    }

    fn abort_in_flight(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Point a weather loader at `country`'s capital city.
///
/// A country without a capital issues no lookup at all and clears any
/// previously held weather; otherwise the first capital entry becomes
/// the query key and any in-flight lookup is superseded.
pub fn request_capital_weather<P>(
    loader: &mut Loader<WeatherSnapshot>,
    provider: &P,
    country: &Country,
) where
    P: WeatherProvider + Clone + 'static,
{
    match country.capital_city() {
        Some(capital) => {
            let provider = provider.clone();
            let capital = capital.to_string();
            loader.start(async move { provider.current_weather(&capital).await });
        }
        None => loader.clear(),
    }
}

impl<T> Drop for Loader<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_country;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[derive(Debug, Clone, Default)]
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WeatherProvider for CountingProvider {
        async fn current_weather(&self, _city: &str) -> Result<WeatherSnapshot, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherSnapshot {
                temperature_c: 20.0,
                condition: "Clear".to_string(),
                description: "clear sky".to_string(),
                observed_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn successful_fetch_reaches_ready() {
        let mut loader: Loader<u32> = Loader::new();
        assert_eq!(*loader.state(), FetchState::Idle);

        loader.start(async { Ok(7) });
        assert!(loader.state().is_loading());

        loader.settle().await;
        assert_eq!(loader.state().ready(), Some(&7));
    }

    #[tokio::test]
    async fn failed_fetch_reaches_failed_with_message() {
        let mut loader: Loader<u32> = Loader::new();
        loader.start(async { Err(ApiError::MissingCity) });
        loader.settle().await;

        let message = loader.state().failure().expect("must be failed");
        assert!(message.contains("city name is required"));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_fetch_result_is_discarded() {
        let mut loader: Loader<u32> = Loader::new();

        loader.start(async {
            sleep(Duration::from_secs(5)).await;
            Ok(1)
        });
        loader.start(async { Ok(2) });

        loader.settle().await;
        assert_eq!(loader.state().ready(), Some(&2));

        // Even after the first fetch's deadline, the state stays at the
        // newer result.
        sleep(Duration::from_secs(10)).await;
        loader.settle().await;
        assert_eq!(loader.state().ready(), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_returns_to_idle_not_failed() {
        let mut loader: Loader<u32> = Loader::new();
        loader.start(async {
            sleep(Duration::from_secs(5)).await;
            Ok(1)
        });

        loader.cancel();
        assert_eq!(*loader.state(), FetchState::Idle);

        sleep(Duration::from_secs(10)).await;
        loader.settle().await;
        assert_eq!(*loader.state(), FetchState::Idle);
    }

    #[tokio::test]
    async fn country_with_capital_triggers_one_lookup() {
        let provider = CountingProvider::default();
        let mut country = test_country("FIN", "Finland", "Europe", 5_500_000);
        country.capital = vec!["Helsinki".to_string()];

        let mut loader: Loader<WeatherSnapshot> = Loader::new();
        request_capital_weather(&mut loader, &provider, &country);
        loader.settle().await;

        assert!(loader.state().ready().is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn country_without_capital_issues_no_lookup() {
        let provider = CountingProvider::default();
        let country = test_country("ATA", "Antarctica", "Antarctic", 1_000);

        let mut loader: Loader<WeatherSnapshot> = Loader::new();
        // Pretend a previous view left weather behind; it must be cleared.
        loader.start(async {
            Ok(WeatherSnapshot {
                temperature_c: 1.0,
                condition: "Clear".to_string(),
                description: "clear sky".to_string(),
                observed_at: Utc::now(),
            })
        });
        loader.settle().await;
        assert!(loader.state().ready().is_some());

        request_capital_weather(&mut loader, &provider, &country);
        loader.settle().await;

        assert_eq!(*loader.state(), FetchState::Idle);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clear_drops_a_ready_value() {
        let mut loader: Loader<u32> = Loader::new();
        loader.start(async { Ok(3) });
        loader.settle().await;
        assert!(loader.state().ready().is_some());

        loader.clear();
        assert_eq!(*loader.state(), FetchState::Idle);
    }
}
