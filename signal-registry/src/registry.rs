// Signal Registry
// Authoritative in-memory signal set for the current trading day

use super::config::RegistryConfig;
use super::error::{RegistryError, RegistryResult};
use super::feed::{FeedEvent, SignalFeed};
use super::update::SignalUpdate;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use common::{truncate_to_minute, Signal, SignalWithStatus, Uuid};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Owns the day's signals and answers availability queries for them.
///
/// One instance per session. The set is replaced wholesale by [`load`] and
/// otherwise only changes through [`update_signal`] and [`apply_feed_event`].
///
/// [`load`]: SignalRegistry::load
/// [`update_signal`]: SignalRegistry::update_signal
/// [`apply_feed_event`]: SignalRegistry::apply_feed_event
pub struct SignalRegistry {
    config: RegistryConfig,
    timezone: Tz,
    feed: Arc<dyn SignalFeed>,
    signals: Vec<SignalWithStatus>,
    trading_date: Option<NaiveDate>,
}

impl SignalRegistry {
    /// Create an empty registry over `feed`
    pub fn new(config: RegistryConfig, feed: Arc<dyn SignalFeed>) -> anyhow::Result<Self> {
        config.validate()?;
        let timezone = config.timezone()?;

        info!(
            "Signal registry using feed '{}' in {} (cutoff {}s)",
            feed.name(),
            timezone,
            config.availability_cutoff_secs
        );

        Ok(Self {
            config,
            timezone,
            feed,
            signals: Vec::new(),
            trading_date: None,
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Current signal set, in feed order
    pub fn signals(&self) -> &[SignalWithStatus] {
        &self.signals
    }

    /// Owned copy of the current set
    pub fn snapshot(&self) -> Vec<SignalWithStatus> {
        self.signals.clone()
    }

    pub fn get(&self, id: Uuid) -> Option<&SignalWithStatus> {
        self.signals.iter().find(|signal| signal.id() == id)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Trading day of the loaded set, `None` before the first successful load
    pub fn trading_date(&self) -> Option<NaiveDate> {
        self.trading_date
    }

    /// Calendar date of `instant` in the trading timezone
    pub fn trading_date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// Load the signals for the trading day containing `reference`.
    ///
    /// When none of that day's signals is still ahead of `reference`, the next
    /// day is fetched and adopted if it has any signals. Otherwise the original
    /// day's set is kept, even when empty.
    pub async fn load(&mut self, reference: DateTime<Utc>) -> RegistryResult<&[SignalWithStatus]> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.load_with_cancel(reference, cancel_rx).await
    }

    /// [`load`](SignalRegistry::load) that gives up once `cancel` turns `true`
    pub async fn load_with_cancel(
        &mut self,
        reference: DateTime<Utc>,
        mut cancel: watch::Receiver<bool>,
    ) -> RegistryResult<&[SignalWithStatus]> {
        self.signals.clear();
        self.trading_date = None;

        let outcome = tokio::select! {
            outcome = self.fetch_with_fallover(reference) => outcome,
            _ = cancelled(&mut cancel) => Err(RegistryError::Cancelled),
        };

        let (date, fetched) = match outcome {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Signal load failed: {}", e);
                return Err(e);
            }
        };

        let mut seen = HashSet::new();
        self.signals = fetched
            .into_iter()
            .filter(|signal| {
                let fresh = seen.insert(signal.id);
                if !fresh {
                    warn!("Dropping duplicate signal {} from feed", signal.id);
                }
                fresh
            })
            .map(SignalWithStatus::waiting)
            .collect();
        self.trading_date = Some(date);

        info!("Loaded {} signals for {}", self.signals.len(), date);
        Ok(&self.signals)
    }

    async fn fetch_with_fallover(
        &self,
        reference: DateTime<Utc>,
    ) -> RegistryResult<(NaiveDate, Vec<Signal>)> {
        let date = self.trading_date_of(reference);
        let signals = self.fetch_day(date).await?;

        if signals.iter().any(|signal| signal.date > reference) {
            return Ok((date, signals));
        }

        let Some(next) = date.succ_opt() else {
            return Ok((date, signals));
        };

        debug!("No signals left for {}, trying {}", date, next);
        let next_signals = self.fetch_day(next).await?;

        if next_signals.is_empty() {
            debug!("No signals published for {}, keeping {}", next, date);
            Ok((date, signals))
        } else {
            Ok((next, next_signals))
        }
    }

    async fn fetch_day(&self, date: NaiveDate) -> RegistryResult<Vec<Signal>> {
        let timeout = self.config.fetch_timeout();

        match tokio::time::timeout(timeout, self.feed.fetch_signals(date)).await {
            Ok(Ok(signals)) => {
                debug!("Feed '{}' returned {} signals for {}", self.feed.name(), signals.len(), date);
                Ok(signals.into_iter().map(normalize).collect())
            }
            Ok(Err(e)) => Err(RegistryError::FeedUnavailable {
                date,
                reason: format!("{:#}", e),
            }),
            Err(_) => Err(RegistryError::FeedUnavailable {
                date,
                reason: format!("timed out after {:?}", timeout),
            }),
        }
    }

    /// Merge `update` into the signal with `id`.
    ///
    /// Fails with `SignalNotFound` for an unknown id, `InvalidTransition` for a
    /// status change outside the lifecycle (when enforced) and `InvalidUpdate`
    /// when the merge would leave a result on an unsettled signal. The set is
    /// untouched on error.
    pub fn update_signal(
        &mut self,
        id: Uuid,
        update: SignalUpdate,
    ) -> RegistryResult<&SignalWithStatus> {
        let index = self
            .signals
            .iter()
            .position(|signal| signal.id() == id)
            .ok_or(RegistryError::SignalNotFound(id))?;

        let current = &self.signals[index];
        let merged = update.merge_into(current);

        if self.config.enforce_transitions && !current.status.can_transition_to(merged.status) {
            return Err(RegistryError::InvalidTransition {
                id,
                from: current.status,
                to: merged.status,
            });
        }

        if merged.result.is_some() && !merged.status.is_settled() {
            return Err(RegistryError::InvalidUpdate {
                id,
                reason: format!("result present on {} signal", merged.status),
            });
        }

        debug!("Signal {} {} -> {}", id, current.status, merged.status);
        self.signals[index] = merged;
        Ok(&self.signals[index])
    }

    /// Apply a push event from a live feed.
    ///
    /// New signals are appended while the loaded set belongs to the current
    /// trading day and replace the set otherwise. Updates overwrite the core
    /// fields of a known signal, keeping its status, info and result.
    pub fn apply_feed_event(&mut self, event: FeedEvent, now: DateTime<Utc>) -> RegistryResult<()> {
        match event {
            FeedEvent::New(signals) => {
                let today = self.trading_date_of(now);

                if self.trading_date != Some(today) {
                    info!("Feed moved to {}, replacing {} signals", today, self.signals.len());
                    self.signals.clear();
                    self.trading_date = Some(today);
                }

                let mut seen: HashSet<Uuid> = self.signals.iter().map(|s| s.id()).collect();
                let before = self.signals.len();

                for signal in signals {
                    if seen.insert(signal.id) {
                        self.signals.push(SignalWithStatus::waiting(normalize(signal)));
                    } else {
                        warn!("Ignoring already known signal {}", signal.id);
                    }
                }

                debug!("Feed published {} new signals", self.signals.len() - before);
                Ok(())
            }
            FeedEvent::Update(signal) => {
                let id = signal.id;
                let entry = self
                    .signals
                    .iter_mut()
                    .find(|entry| entry.id() == id)
                    .ok_or(RegistryError::SignalNotFound(id))?;

                entry.signal = normalize(signal);
                debug!("Feed updated signal {}", id);
                Ok(())
            }
        }
    }

    /// Last instant at which the signal can still be canceled or resumed
    pub fn available_date(&self, signal: &SignalWithStatus) -> DateTime<Utc> {
        signal
            .date()
            .checked_sub_signed(self.config.availability_cutoff())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn has_result(&self, signal: &SignalWithStatus) -> bool {
        signal.status.has_result()
    }

    pub fn is_available_at(&self, signal: &SignalWithStatus, now: DateTime<Utc>) -> bool {
        now < self.available_date(signal) && !self.has_result(signal)
    }

    pub fn is_available(&self, signal: &SignalWithStatus) -> bool {
        self.is_available_at(signal, Utc::now())
    }

    /// Time left before the signal locks, `None` once locked
    pub fn countdown_at(&self, signal: &SignalWithStatus, now: DateTime<Utc>) -> Option<Duration> {
        self.is_available_at(signal, now)
            .then(|| self.available_date(signal) - now)
    }
}

fn normalize(mut signal: Signal) -> Signal {
    signal.date = truncate_to_minute(signal.date);
    signal
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let closed = cancel.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        // sender gone without cancelling
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::StaticFeed;
    use crate::update::ResultUpdate;
    use chrono::TimeZone;
    use common::{Active, Direction, Expiration, SignalResult, SignalStatus};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn tomorrow() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 11).unwrap()
    }

    /// 12:00 in Sao Paulo on `today()`
    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 15, 0, 0).unwrap()
    }

    fn signal_at(date: DateTime<Utc>) -> Signal {
        Signal::new(Active::EurUsd, date, Expiration::M5, Direction::Call)
    }

    fn registry(feed: StaticFeed) -> (SignalRegistry, Arc<StaticFeed>) {
        let feed = Arc::new(feed);
        let registry = SignalRegistry::new(RegistryConfig::default(), feed.clone()).unwrap();
        (registry, feed)
    }

    async fn loaded_registry() -> SignalRegistry {
        let signals = vec![
            signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 16, 0, 0).unwrap()),
            signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 17, 30, 0).unwrap()),
        ];
        let (mut registry, _) = registry(StaticFeed::new().with_day(today(), signals));
        registry.load(reference()).await.unwrap();
        registry
    }

    #[tokio::test]
    async fn test_load_keeps_today_when_signals_remain() {
        let past = signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 13, 0, 0).unwrap());
        let future = signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 16, 0, 0).unwrap());
        let feed = StaticFeed::new()
            .with_day(today(), vec![past.clone(), future.clone()])
            .with_day(tomorrow(), vec![signal_at(Utc.with_ymd_and_hms(2024, 5, 11, 13, 0, 0).unwrap())]);
        let (mut registry, feed) = registry(feed);

        let loaded = registry.load(reference()).await.unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].signal, past);
        assert_eq!(loaded[1].signal, future);
        assert!(loaded.iter().all(|s| s.status == SignalStatus::Waiting && s.result.is_none()));
        assert_eq!(registry.trading_date(), Some(today()));
        assert_eq!(feed.fetched_dates().await, vec![today()]);
    }

    #[tokio::test]
    async fn test_load_falls_over_to_tomorrow() {
        let past = signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 13, 0, 0).unwrap());
        let next = vec![
            signal_at(Utc.with_ymd_and_hms(2024, 5, 11, 4, 27, 0).unwrap()),
            signal_at(Utc.with_ymd_and_hms(2024, 5, 11, 7, 42, 0).unwrap()),
        ];
        let feed = StaticFeed::new()
            .with_day(today(), vec![past])
            .with_day(tomorrow(), next.clone());
        let (mut registry, feed) = registry(feed);

        let loaded: Vec<Signal> = registry
            .load(reference())
            .await
            .unwrap()
            .iter()
            .map(|s| s.signal.clone())
            .collect();

        assert_eq!(loaded, next);
        assert_eq!(registry.trading_date(), Some(tomorrow()));
        assert_eq!(feed.fetched_dates().await, vec![today(), tomorrow()]);
    }

    #[tokio::test]
    async fn test_signal_exactly_at_reference_is_not_remaining() {
        let at_reference = signal_at(reference());
        let next = signal_at(Utc.with_ymd_and_hms(2024, 5, 11, 13, 0, 0).unwrap());
        let feed = StaticFeed::new()
            .with_day(today(), vec![at_reference])
            .with_day(tomorrow(), vec![next.clone()]);
        let (mut registry, _) = registry(feed);

        let loaded = registry.load(reference()).await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].signal, next);
    }

    #[tokio::test]
    async fn test_load_keeps_past_day_when_tomorrow_empty() {
        let past = vec![
            signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 11, 0, 0).unwrap()),
            signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 13, 0, 0).unwrap()),
        ];
        let (mut registry, _) = registry(StaticFeed::new().with_day(today(), past.clone()));

        let loaded: Vec<Signal> = registry
            .load(reference())
            .await
            .unwrap()
            .iter()
            .map(|s| s.signal.clone())
            .collect();

        assert_eq!(loaded, past);
        assert_eq!(registry.trading_date(), Some(today()));
    }

    #[tokio::test]
    async fn test_load_empty_feed_is_not_an_error() {
        let (mut registry, _) = registry(StaticFeed::new());

        let loaded = registry.load(reference()).await.unwrap();

        assert!(loaded.is_empty());
        assert_eq!(registry.trading_date(), Some(today()));
    }

    #[tokio::test]
    async fn test_trading_day_follows_trading_timezone() {
        // 01:30 UTC on the 11th is still the 10th in Sao Paulo
        let late = Utc.with_ymd_and_hms(2024, 5, 11, 1, 30, 0).unwrap();
        let (registry, _) = registry(StaticFeed::new());

        assert_eq!(registry.trading_date_of(late), today());
    }

    #[tokio::test]
    async fn test_load_propagates_feed_failure() {
        let (mut registry, _) = registry(StaticFeed::new().failing_on(today()));

        let err = registry.load(reference()).await.unwrap_err();

        assert!(matches!(err, RegistryError::FeedUnavailable { date, .. } if date == today()));
        assert!(registry.is_empty());
        assert_eq!(registry.trading_date(), None);
    }

    #[tokio::test]
    async fn test_load_propagates_failure_of_fallover_day() {
        let past = signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 13, 0, 0).unwrap());
        let feed = StaticFeed::new()
            .with_day(today(), vec![past])
            .failing_on(tomorrow());
        let (mut registry, _) = registry(feed);

        let err = registry.load(reference()).await.unwrap_err();

        assert!(matches!(err, RegistryError::FeedUnavailable { date, .. } if date == tomorrow()));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_load_times_out_slow_feed() {
        let config = RegistryConfig {
            fetch_timeout_secs: 1,
            ..Default::default()
        };
        let feed = Arc::new(StaticFeed::new().with_delay(std::time::Duration::from_secs(30)));
        let mut registry = SignalRegistry::new(config, feed).unwrap();

        let err = registry.load(reference()).await.unwrap_err();

        match err {
            RegistryError::FeedUnavailable { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_load_can_be_cancelled() {
        let feed = StaticFeed::new().with_delay(std::time::Duration::from_secs(30));
        let (mut registry, _) = registry(feed);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();

        let err = registry.load_with_cancel(reference(), cancel_rx).await.unwrap_err();

        assert!(matches!(err, RegistryError::Cancelled));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_reload_replaces_previous_set() {
        let mut registry = loaded_registry().await;
        let first = registry.signals()[0].id();
        registry
            .update_signal(first, SignalUpdate::status(SignalStatus::Canceled))
            .unwrap();

        registry.load(reference()).await.unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get(first).is_some());
        assert!(registry.signals().iter().all(|s| s.status == SignalStatus::Waiting));
    }

    #[tokio::test]
    async fn test_load_normalizes_and_dedupes() {
        let mut signal = signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 16, 0, 0).unwrap());
        signal.date = Utc.with_ymd_and_hms(2024, 5, 10, 16, 0, 37).unwrap();
        let feed = StaticFeed::new().with_day(today(), vec![signal.clone(), signal.clone()]);
        let (mut registry, _) = registry(feed);

        let loaded = registry.load(reference()).await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].date(), Utc.with_ymd_and_hms(2024, 5, 10, 16, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_update_status_keeps_other_fields() {
        let mut registry = loaded_registry().await;
        let id = registry.signals()[1].id();
        registry
            .update_signal(id, SignalUpdate::status(SignalStatus::InProgress))
            .unwrap();
        let before = registry.signals()[1].clone();

        let updated = registry
            .update_signal(before.id(), SignalUpdate::status(SignalStatus::Loss))
            .unwrap()
            .clone();

        assert_eq!(updated.status, SignalStatus::Loss);
        assert_eq!(updated.signal, before.signal);
        assert_eq!(updated.info, before.info);
        assert_eq!(updated.result, before.result);
        assert_eq!(registry.signals()[1], updated);
    }

    #[tokio::test]
    async fn test_update_unknown_signal_fails_loudly() {
        let mut registry = loaded_registry().await;
        let before = registry.snapshot();
        let unknown = Uuid::new_v4();

        let err = registry
            .update_signal(unknown, SignalUpdate::status(SignalStatus::Canceled))
            .unwrap_err();

        assert!(matches!(err, RegistryError::SignalNotFound(id) if id == unknown));
        assert_eq!(registry.snapshot(), before);
    }

    #[tokio::test]
    async fn test_cancel_and_resume() {
        let mut registry = loaded_registry().await;
        let id = registry.signals()[0].id();

        registry.update_signal(id, SignalUpdate::status(SignalStatus::Canceled)).unwrap();
        assert_eq!(registry.get(id).unwrap().status, SignalStatus::Canceled);

        registry.update_signal(id, SignalUpdate::status(SignalStatus::Waiting)).unwrap();
        assert_eq!(registry.get(id).unwrap().status, SignalStatus::Waiting);
    }

    #[tokio::test]
    async fn test_settlement_merges_result() {
        let mut registry = loaded_registry().await;
        let id = registry.signals()[0].id();

        registry.update_signal(id, SignalUpdate::status(SignalStatus::InProgress)).unwrap();
        registry
            .update_signal(id, SignalUpdate::settled(SignalStatus::Win, 1, dec!(8.70)))
            .unwrap();
        let updated = registry
            .update_signal(
                id,
                SignalUpdate {
                    result: Some(ResultUpdate {
                        profit: Some(dec!(9.10)),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.status, SignalStatus::Win);
        assert_eq!(
            updated.result,
            Some(SignalResult {
                martingales: 1,
                profit: dec!(9.10),
            })
        );
    }

    #[tokio::test]
    async fn test_backward_transition_rejected() {
        let mut registry = loaded_registry().await;
        let id = registry.signals()[0].id();
        registry
            .update_signal(id, SignalUpdate::status(SignalStatus::InProgress))
            .unwrap();
        registry
            .update_signal(id, SignalUpdate::settled(SignalStatus::Win, 0, dec!(8.70)))
            .unwrap();
        let before = registry.snapshot();

        let err = registry
            .update_signal(id, SignalUpdate::status(SignalStatus::Waiting))
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::InvalidTransition { from: SignalStatus::Win, to: SignalStatus::Waiting, .. }
        ));
        assert_eq!(registry.snapshot(), before);
    }

    #[tokio::test]
    async fn test_waiting_signal_cannot_settle_directly() {
        let mut registry = loaded_registry().await;
        let id = registry.signals()[0].id();
        let before = registry.snapshot();

        let err = registry
            .update_signal(id, SignalUpdate::status(SignalStatus::Win))
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::InvalidTransition { from: SignalStatus::Waiting, to: SignalStatus::Win, .. }
        ));
        assert_eq!(registry.snapshot(), before);
    }

    #[tokio::test]
    async fn test_result_requires_settled_status() {
        let mut registry = loaded_registry().await;
        let id = registry.signals()[0].id();

        let err = registry
            .update_signal(id, SignalUpdate::settled(SignalStatus::InProgress, 0, dec!(1)))
            .unwrap_err();

        assert!(matches!(err, RegistryError::InvalidUpdate { .. }));
        assert!(registry.get(id).unwrap().result.is_none());
    }

    #[tokio::test]
    async fn test_unenforced_transitions() {
        let config = RegistryConfig {
            enforce_transitions: false,
            ..Default::default()
        };
        let signals = vec![signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 16, 0, 0).unwrap())];
        let feed = Arc::new(StaticFeed::new().with_day(today(), signals));
        let mut registry = SignalRegistry::new(config, feed).unwrap();
        registry.load(reference()).await.unwrap();
        let id = registry.signals()[0].id();

        registry.update_signal(id, SignalUpdate::status(SignalStatus::Expired)).unwrap();
        let updated = registry.update_signal(id, SignalUpdate::status(SignalStatus::Waiting)).unwrap();

        assert_eq!(updated.status, SignalStatus::Waiting);
    }

    #[tokio::test]
    async fn test_availability_window() {
        let registry = loaded_registry().await;
        let signal = registry.signals()[0].clone();
        let t = signal.date();

        assert_eq!(registry.available_date(&signal), t - Duration::seconds(20));
        assert!(registry.is_available_at(&signal, t - Duration::seconds(25)));
        assert!(!registry.is_available_at(&signal, t - Duration::seconds(15)));
        assert!(!registry.is_available_at(&signal, t - Duration::seconds(20)));
        assert_eq!(
            registry.countdown_at(&signal, t - Duration::seconds(25)),
            Some(Duration::seconds(5))
        );
        assert_eq!(registry.countdown_at(&signal, t), None);
    }

    #[test]
    fn test_registry_rejects_oversized_cutoff() {
        let config = RegistryConfig {
            availability_cutoff_secs: 9_000_000_000_000,
            ..Default::default()
        };
        assert!(SignalRegistry::new(config, Arc::new(StaticFeed::new())).is_err());
    }

    #[tokio::test]
    async fn test_oversized_cutoff_locks_instead_of_panicking() {
        let mut registry = loaded_registry().await;
        registry.config.availability_cutoff_secs = 9_000_000_000_000;
        let signal = registry.signals()[0].clone();

        assert_eq!(registry.available_date(&signal), DateTime::<Utc>::MIN_UTC);
        assert!(!registry.is_available_at(&signal, reference()));
        assert_eq!(registry.countdown_at(&signal, reference()), None);
    }

    #[tokio::test]
    async fn test_result_makes_signal_unavailable() {
        let registry = loaded_registry().await;
        let mut signal = registry.signals()[0].clone();
        let early = signal.date() - Duration::hours(2);

        for status in SignalStatus::ALL {
            signal.status = status;
            if registry.has_result(&signal) {
                assert!(!registry.is_available_at(&signal, early));
            }
        }

        signal.status = SignalStatus::Canceled;
        assert!(!registry.has_result(&signal));
        assert!(registry.is_available_at(&signal, early));
    }

    #[tokio::test]
    async fn test_feed_event_appends_on_same_day() {
        let mut registry = loaded_registry().await;
        let known = registry.signals()[0].signal.clone();
        let fresh = signal_at(Utc.with_ymd_and_hms(2024, 5, 10, 19, 0, 0).unwrap());

        registry
            .apply_feed_event(FeedEvent::New(vec![known, fresh.clone()]), reference())
            .unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(fresh.id).unwrap().status, SignalStatus::Waiting);
    }

    #[tokio::test]
    async fn test_feed_event_replaces_other_day() {
        let mut registry = loaded_registry().await;
        let next_day = Utc.with_ymd_and_hms(2024, 5, 11, 12, 0, 0).unwrap();
        let fresh = signal_at(Utc.with_ymd_and_hms(2024, 5, 11, 13, 0, 0).unwrap());

        registry
            .apply_feed_event(FeedEvent::New(vec![fresh.clone()]), next_day)
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.signals()[0].signal, fresh);
        assert_eq!(registry.trading_date(), Some(tomorrow()));
    }

    #[tokio::test]
    async fn test_feed_update_keeps_lifecycle_state() {
        let mut registry = loaded_registry().await;
        let id = registry.signals()[0].id();
        registry.update_signal(id, SignalUpdate::status(SignalStatus::Canceled)).unwrap();

        let mut corrected = registry.signals()[0].signal.clone();
        corrected.active = Active::EurUsdOtc;
        corrected.direction = Direction::Put;
        registry
            .apply_feed_event(FeedEvent::Update(corrected.clone()), reference())
            .unwrap();

        let entry = registry.get(id).unwrap();
        assert_eq!(entry.signal, corrected);
        assert_eq!(entry.status, SignalStatus::Canceled);
    }

    #[tokio::test]
    async fn test_template_day_rolls_over_after_last_signal() {
        let template = include_str!("../../config/signals.txt");
        let feed = crate::feed::TemplateFeed::new(template, chrono_tz::America::Sao_Paulo).unwrap();
        let mut registry = SignalRegistry::new(RegistryConfig::default(), Arc::new(feed)).unwrap();

        // 17:00 in Sao Paulo, after the 15:52 signal
        let evening = Utc.with_ymd_and_hms(2024, 5, 10, 20, 0, 0).unwrap();
        let loaded = registry.load(evening).await.unwrap();

        assert_eq!(loaded.len(), 30);
        assert!(loaded.iter().all(|s| s.date() > evening));
        assert_eq!(registry.trading_date(), Some(tomorrow()));

        // 12:00 in Sao Paulo, the 13:02 and later signals are still ahead
        registry.load(reference()).await.unwrap();
        assert_eq!(registry.trading_date(), Some(today()));
        assert!(registry.signals().iter().any(|s| s.date() > reference()));
    }

    #[tokio::test]
    async fn test_feed_update_unknown_signal() {
        let mut registry = loaded_registry().await;
        let stranger = signal_at(reference());

        let err = registry
            .apply_feed_event(FeedEvent::Update(stranger), reference())
            .unwrap_err();

        assert!(matches!(err, RegistryError::SignalNotFound(_)));
    }
}
