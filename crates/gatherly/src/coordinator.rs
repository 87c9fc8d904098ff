//! Request coalescing.
//!
//! A [`RequestCoordinator`] guarantees that at most one producer runs per key
//! at any instant. Callers arriving while a producer is running await the same
//! result instead of starting their own.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{FutureExt, Shared};
use thiserror::Error;
use tokio::sync::oneshot;

type InFlight<T> = Shared<oneshot::Receiver<T>>;
type InFlightMap<T> = Arc<Mutex<HashMap<String, Record<T>>>>;

/// A registered producer. The id tells a record apart from a newer one
/// registered under the same key after the first was forgotten.
struct Record<T> {
    id: u64,
    receiver: InFlight<T>,
}

/// The producer for a key stopped without producing a value (it panicked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("in-flight request was abandoned before it settled")]
pub struct Abandoned;

/// Deduplicates concurrent work by key.
///
/// The coordinator only transports values; it never caches them. Whatever the
/// producer returns (including a failure value) is handed to every caller
/// that was waiting on that key.
pub struct RequestCoordinator<T> {
    in_flight: InFlightMap<T>,
    next_id: AtomicU64,
}

impl<T> RequestCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Returns the result of the producer registered for `key`, starting
    /// `producer` if none is registered.
    ///
    /// A started producer runs as its own task: it runs to completion even if
    /// every caller stops waiting. Its in-flight record is removed before the
    /// result is published, so a caller that arrives after settlement always
    /// starts a fresh producer.
    pub async fn coordinate<F, Fut>(&self, key: &str, producer: F) -> Result<T, Abandoned>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (receiver, sender) = {
            let mut in_flight = lock(&self.in_flight);
            match in_flight.get(key) {
                Some(existing) => {
                    tracing::trace!(key, "Joining in-flight request");
                    (existing.receiver.clone(), None)
                }
                None => {
                    let (sender, receiver) = oneshot::channel();
                    let receiver = receiver.shared();
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    in_flight.insert(
                        key.to_string(),
                        Record {
                            id,
                            receiver: receiver.clone(),
                        },
                    );
                    (receiver, Some((id, sender)))
                }
            }
        };

        if let Some((id, sender)) = sender {
            let guard = InFlightGuard {
                in_flight: Arc::clone(&self.in_flight),
                key: key.to_string(),
                id,
                sender: Some(sender),
            };
            let work = producer();
            tokio::spawn(async move {
                let value = work.await;
                guard.settle(value);
            });
        }

        receiver.await.map_err(|_| Abandoned)
    }

    /// Detaches the running producer for `key`, if any.
    ///
    /// Callers already waiting still receive its result. The next caller for
    /// `key` starts a fresh producer.
    pub fn forget(&self, key: &str) -> bool {
        let removed = lock(&self.in_flight).remove(key);
        removed.is_some()
    }

    /// Detaches every running producer whose key matches `predicate`.
    pub fn forget_where(&self, predicate: impl Fn(&str) -> bool) -> usize {
        let removed: Vec<Record<T>> = {
            let mut in_flight = lock(&self.in_flight);
            let keys: Vec<String> = in_flight
                .keys()
                .filter(|key| predicate(key.as_str()))
                .cloned()
                .collect();
            keys.iter()
                .filter_map(|key| in_flight.remove(key))
                .collect()
        };
        removed.len()
    }

    /// Number of keys with a running producer.
    pub fn in_flight_count(&self) -> usize {
        lock(&self.in_flight).len()
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        lock(&self.in_flight).contains_key(key)
    }
}

impl<T> Default for RequestCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(map: &Mutex<T>) -> MutexGuard<'_, T> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the sending half of an in-flight record.
///
/// Removing the record and releasing the sender always happen in that order,
/// whether the producer returned or unwound. A record that was forgotten and
/// replaced by a newer one is left alone.
struct InFlightGuard<T> {
    in_flight: InFlightMap<T>,
    key: String,
    id: u64,
    sender: Option<oneshot::Sender<T>>,
}

impl<T> InFlightGuard<T> {
    fn settle(mut self, value: T) {
        self.remove_record();
        if let Some(sender) = self.sender.take() {
            // Every caller may have gone away; the value is simply dropped.
            let _ = sender.send(value);
        }
    }

    fn remove_record(&self) {
        let mut in_flight = lock(&self.in_flight);
        if in_flight
            .get(&self.key)
            .is_some_and(|current| current.id == self.id)
        {
            in_flight.remove(&self.key);
        }
    }
}

impl<T> Drop for InFlightGuard<T> {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            tracing::warn!(key = %self.key, "In-flight request abandoned");
            self.remove_record();
            drop(sender);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::future::join_all;

    use super::*;

    fn counting_producer(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = &'static str> + Send>> {
        let calls = Arc::clone(calls);
        move || {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                value
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_producer() {
        let coordinator = RequestCoordinator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let callers = (0..10).map(|_| {
            coordinator.coordinate("event:evt-1", counting_producer(&calls, "payload"))
        });
        let results = join_all(callers).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|result| *result == Ok("payload")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_run_independently() {
        let coordinator = RequestCoordinator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            coordinator.coordinate("event:evt-1", counting_producer(&calls, "one")),
            coordinator.coordinate("event:evt-2", counting_producer(&calls, "two")),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(a, Ok("one"));
        assert_eq!(b, Ok("two"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_removed_after_success() {
        let coordinator = RequestCoordinator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        coordinator
            .coordinate("event:evt-1", counting_producer(&calls, "first"))
            .await
            .unwrap();
        assert_eq!(coordinator.in_flight_count(), 0);

        let second = coordinator
            .coordinate("event:evt-1", counting_producer(&calls, "second"))
            .await;
        assert_eq!(second, Ok("second"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_record_removed_after_failure_value() {
        let coordinator: RequestCoordinator<Result<u32, String>> = RequestCoordinator::new();

        let first = coordinator
            .coordinate("event:evt-1", || async { Err("boom".to_string()) })
            .await;
        assert_eq!(first, Ok(Err("boom".to_string())));
        assert!(!coordinator.is_in_flight("event:evt-1"));

        let second = coordinator
            .coordinate("event:evt-1", || async { Ok(7) })
            .await;
        assert_eq!(second, Ok(Ok(7)));
    }

    fn explode() -> u32 {
        panic!("producer failed")
    }

    #[tokio::test]
    async fn test_panicking_producer_is_abandoned() {
        let coordinator: RequestCoordinator<u32> = RequestCoordinator::new();

        let result = coordinator
            .coordinate("event:evt-1", || async { explode() })
            .await;

        assert_eq!(result, Err(Abandoned));
        assert_eq!(coordinator.in_flight_count(), 0);

        let retry = coordinator.coordinate("event:evt-1", || async { 1 }).await;
        assert_eq!(retry, Ok(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_visible_while_running() {
        let coordinator = Arc::new(RequestCoordinator::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let leader = {
            let coordinator = Arc::clone(&coordinator);
            let producer = counting_producer(&calls, "payload");
            tokio::spawn(async move { coordinator.coordinate("event:evt-1", producer).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(coordinator.is_in_flight("event:evt-1"));
        assert_eq!(leader.await.unwrap(), Ok("payload"));
        assert!(!coordinator.is_in_flight("event:evt-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_forgotten_record_is_replaced_not_joined() {
        let coordinator = Arc::new(RequestCoordinator::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let first = {
            let coordinator = Arc::clone(&coordinator);
            let producer = counting_producer(&calls, "old");
            tokio::spawn(async move { coordinator.coordinate("event:evt-1", producer).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(coordinator.forget("event:evt-1"));
        assert!(!coordinator.is_in_flight("event:evt-1"));

        let second = {
            let coordinator = Arc::clone(&coordinator);
            let producer = counting_producer(&calls, "new");
            tokio::spawn(async move { coordinator.coordinate("event:evt-1", producer).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(first.await.unwrap(), Ok("old"));
        // The first producer settled; the second record must survive it.
        assert!(coordinator.is_in_flight("event:evt-1"));
        assert_eq!(second.await.unwrap(), Ok("new"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forget_where_matches_keys() {
        let coordinator = Arc::new(RequestCoordinator::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for key in ["events:admin:a", "events:admin:b", "events:public:a"] {
            let coordinator = Arc::clone(&coordinator);
            let producer = counting_producer(&calls, "payload");
            tasks.push(tokio::spawn(async move {
                coordinator.coordinate(key, producer).await
            }));
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        let forgotten = coordinator.forget_where(|key| key.starts_with("events:admin:"));

        assert_eq!(forgotten, 2);
        assert!(coordinator.is_in_flight("events:public:a"));
        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok("payload"));
        }
        assert_eq!(coordinator.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_survives_dropped_caller() {
        let coordinator = RequestCoordinator::new();
        let finished = Arc::new(AtomicUsize::new(0));

        let producer = {
            let finished = Arc::clone(&finished);
            move || async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                "payload"
            }
        };

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            coordinator.coordinate("event:evt-1", producer),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.in_flight_count(), 0);
    }
}
