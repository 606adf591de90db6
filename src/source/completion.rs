//! Fetch functions and their completion handles

use std::future::Future;

use tokio::sync::oneshot;

/// One-shot handle a fetch uses to hand back its value
#[derive(Debug)]
pub struct Completion<V> {
    tx: oneshot::Sender<V>,
}

impl<V> Completion<V> {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<V>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Deliver the fetched value
    pub fn complete(self, value: V) {
        // The receiver is gone if the fetch timed out or the source was removed
        let _ = self.tx.send(value);
    }

    /// True once nobody is waiting for this completion anymore
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// An asynchronous value producer
///
/// `fetch` must not block; start the work and call
/// [`Completion::complete`] when the value is ready. Any
/// `Fn(Completion<V>)` closure is a data source.
pub trait DataSource<V>: Send + Sync + 'static {
    /// Start one fetch
    fn fetch(&self, completion: Completion<V>);
}

impl<V, F> DataSource<V> for F
where
    F: Fn(Completion<V>) + Send + Sync + 'static,
{
    fn fetch(&self, completion: Completion<V>) {
        self(completion)
    }
}

/// Data source backed by an async closure
///
/// Created with [`source_fn`].
pub struct FnSource<F> {
    f: F,
}

/// Wrap an async closure as a data source
///
/// The closure's future runs on the Tokio runtime. `Some(value)` completes
/// the fetch, `None` means no update this cycle.
pub fn source_fn<V, F, Fut>(f: F) -> FnSource<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<V>> + Send + 'static,
    V: Send + 'static,
{
    FnSource { f }
}

impl<V, F, Fut> DataSource<V> for FnSource<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<V>> + Send + 'static,
    V: Send + 'static,
{
    fn fetch(&self, completion: Completion<V>) {
        let fut = (self.f)();
        tokio::spawn(async move {
            if let Some(value) = fut.await {
                completion.complete(value);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closure_source_completes() {
        let source = |done: Completion<i32>| done.complete(7);
        let (completion, rx) = Completion::channel();

        source.fetch(completion);
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_source_fn_none_drops_completion() {
        let source = source_fn(|| async { None::<i32> });
        let (completion, rx) = Completion::channel();

        source.fetch(completion);
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_source_fn_some_completes() {
        let source = source_fn(|| async { Some("sunny".to_string()) });
        let (completion, rx) = Completion::channel();

        source.fetch(completion);
        assert_eq!(rx.await.unwrap(), "sunny");
    }

    #[test]
    fn test_abandoned_after_receiver_dropped() {
        let (completion, rx) = Completion::<i32>::channel();
        assert!(!completion.is_abandoned());

        drop(rx);
        assert!(completion.is_abandoned());
    }
}
