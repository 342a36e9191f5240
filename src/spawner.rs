//! Runtime glue: turn `async` or blocking predicates into callback
//! iteratees by spawning one task per dispatched entry, and wait for a
//! search from synchronous code.
use std::sync::Arc;

use futures::channel::oneshot;
use futures::Future;
use log::warn;

use crate::{FindError, Finder, IntoSequence, Limit, TaskCallback, Truthy};

pub trait Spawner<T> {
    type FutureOutput;
    type SpawnHandle: Future<Output = Self::FutureOutput> + Send;
    fn spawn<F: Future<Output = T> + Send + 'static>(&self, f: F) -> Self::SpawnHandle;
}

pub trait FuncSpawner<T> {
    type FutureOutput;
    type SpawnHandle: Future<Output = Self::FutureOutput> + Send;
    fn spawn_func<F: FnOnce() -> T + Send + 'static>(&self, f: F) -> Self::SpawnHandle;
}

pub trait Blocker {
    fn block_on<T, F: Future<Output = T>>(&self, f: F) -> T;

    /// Whether `block_on` may be called from the current thread.
    fn can_block(&self) -> Result<(), FindError> {
        Ok(())
    }
}

fn report<T: Truthy>(done: TaskCallback, verdict: T) {
    if let Err(err) = done.call(verdict) {
        warn!("entry {}: {}", done.index(), err);
    }
}

/// Adapt an `async` predicate into an iteratee: each dispatch spawns
/// the predicate's future and reports its output as the verdict.
///
/// The spawned tasks are detached, so predicates still running when a
/// match is found run to completion in the background.
pub fn spawn_iteratee<S, V, F, Fut>(
    spawner: S,
    predicate: F,
) -> impl Fn(&V, TaskCallback) + Send + Sync + 'static
where
    S: Spawner<()> + Send + Sync + 'static,
    V: 'static,
    F: Fn(&V) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Truthy,
{
    move |value: &V, done: TaskCallback| {
        let probe = predicate(value);
        let _detached = spawner.spawn(async move {
            let verdict = probe.await;
            report(done, verdict);
        });
    }
}

/// Adapt a blocking predicate into an iteratee that runs it on the
/// spawner's blocking pool.
pub fn spawn_blocking_iteratee<S, V, F, T>(
    spawner: S,
    predicate: F,
) -> impl Fn(&V, TaskCallback) + Send + Sync + 'static
where
    S: FuncSpawner<()> + Send + Sync + 'static,
    V: Clone + Send + 'static,
    F: Fn(&V) -> T + Send + Sync + 'static,
    T: Truthy,
{
    let predicate = Arc::new(predicate);
    move |value: &V, done: TaskCallback| {
        let predicate = predicate.clone();
        let value = value.clone();
        let _detached = spawner.spawn_func(move || {
            let verdict = (*predicate)(&value);
            report(done, verdict);
        });
    }
}

/// Run a search and block the current thread until it completes.
///
/// Fails with [`FindError::Abandoned`] if every callback of the run is
/// dropped without the run completing, and with whatever
/// [`Blocker::can_block`] reports, before dispatching anything, if the
/// current thread must not block.
pub fn find_blocking<B, C, F>(
    blocker: &B,
    collection: C,
    limit: Limit,
    iteratee: F,
) -> Result<Option<C::Value>, FindError>
where
    B: Blocker,
    C: IntoSequence,
    C::Position: Send + Sync + 'static,
    C::Value: Clone + Send + Sync + 'static,
    F: Fn(&C::Value, TaskCallback) + Send + Sync + 'static,
{
    blocker.can_block()?;
    let (tx, rx) = oneshot::channel();
    Finder::new(limit).find(
        collection,
        move |value, _, _, done| iteratee(value, done),
        move |result| {
            // The receiver only goes away once we stop blocking.
            let _ = tx.send(result);
        },
    );
    blocker.block_on(rx).map_err(|_| FindError::Abandoned)
}

cfg_async_std! {
    pub mod use_async_std {
        use super::*;
        use async_std::task::{block_on, spawn, spawn_blocking, JoinHandle};

        #[derive(Debug, Default, Clone, Copy)]
        pub struct AsyncStdSpawner;

        impl<T: Send + 'static> Spawner<T> for AsyncStdSpawner {
            type FutureOutput = T;
            type SpawnHandle = JoinHandle<T>;

            fn spawn<F: Future<Output = T> + Send + 'static>(&self, f: F) -> Self::SpawnHandle {
                spawn(f)
            }
        }
        impl<T: Send + 'static> FuncSpawner<T> for AsyncStdSpawner {
            type FutureOutput = T;
            type SpawnHandle = JoinHandle<T>;

            fn spawn_func<F: FnOnce() -> T + Send + 'static>(&self, f: F) -> Self::SpawnHandle {
                spawn_blocking(f)
            }
        }
        impl Blocker for AsyncStdSpawner {
            fn block_on<T, F: Future<Output = T>>(&self, f: F) -> T {
                block_on(f)
            }
        }
    }
}

cfg_tokio! {
    pub mod use_tokio {
        use super::*;
        use tokio::{
            runtime::{Handle, Runtime, RuntimeFlavor},
            task::{self as tokio_task, block_in_place},
        };

        pub struct TokioSpawner(Option<TokioRuntime>);

        impl Clone for TokioSpawner {
            fn clone(&self) -> Self {
                Self(self.0.as_ref().map(|rt| match rt {
                    TokioRuntime::ByHandle(handle) => TokioRuntime::ByHandle(handle.clone()),
                    TokioRuntime::Owned(runtime) => TokioRuntime::ByHandle(runtime.handle().clone()),
                }))
            }
        }

        const RUNTIME_INVARIANT_ERR: &str =
            "invariant: runtime must be available during the spawner's lifetime";

        impl Drop for TokioSpawner {
            /// Shut down an owned runtime without waiting on detached iteratees.
            fn drop(&mut self) {
                if let Some(TokioRuntime::Owned(rt)) = self.0.take() {
                    rt.shutdown_background()
                }
            }
        }

        impl TokioSpawner {
            pub fn new(rt_handle: Handle) -> Self {
                Self(Some(TokioRuntime::ByHandle(rt_handle)))
            }

            /// A spawner with its own current-thread runtime, timers and
            /// IO enabled. The runtime lives as long as this spawner.
            pub fn owned() -> std::io::Result<Self> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;
                Ok(Self(Some(TokioRuntime::Owned(runtime))))
            }

            fn handle(&self) -> &Handle {
                match &self.0.as_ref().expect(RUNTIME_INVARIANT_ERR) {
                    TokioRuntime::ByHandle(handle) => handle,
                    TokioRuntime::Owned(runtime) => runtime.handle(),
                }
            }
        }

        /// Variants of supplied tokio runtime.
        enum TokioRuntime {
            /// User provides its own runtime, we'll refer to it by handle.
            ByHandle(Handle),
            /// We've created our own ad-hoc runtime, so we'll own it.
            Owned(Runtime),
        }

        // Uses the ambient runtime when there is one, otherwise an
        // owned current-thread runtime.
        impl Default for TokioSpawner {
            fn default() -> Self {
                if let Ok(handle) = Handle::try_current() {
                    return Self::new(handle);
                }
                Self::owned().expect("failed to build a tokio runtime")
            }
        }

        impl<T: Send + 'static> Spawner<T> for TokioSpawner {
            type FutureOutput = Result<T, tokio_task::JoinError>;
            type SpawnHandle = tokio_task::JoinHandle<T>;

            fn spawn<F: Future<Output = T> + Send + 'static>(&self, f: F) -> Self::SpawnHandle {
                self.handle().spawn(f)
            }
        }

        impl<T: Send + 'static> FuncSpawner<T> for TokioSpawner {
            type FutureOutput = Result<T, tokio_task::JoinError>;
            type SpawnHandle = tokio_task::JoinHandle<T>;

            fn spawn_func<F: FnOnce() -> T + Send + 'static>(&self, f: F) -> Self::SpawnHandle {
                self.handle().spawn_blocking(f)
            }
        }

        impl Blocker for TokioSpawner {
            // `block_in_place` needs a multi-threaded runtime: on a
            // current-thread one the spawned iteratees would wait on the
            // very thread we block.
            fn can_block(&self) -> Result<(), FindError> {
                match Handle::try_current() {
                    Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::CurrentThread => {
                        Err(FindError::BlockingInRuntime)
                    }
                    _ => Ok(()),
                }
            }

            fn block_on<T, F: Future<Output = T>>(&self, f: F) -> T {
                block_in_place(|| match self.0.as_ref().expect(RUNTIME_INVARIANT_ERR) {
                    TokioRuntime::ByHandle(handle) => handle.block_on(f),
                    // An owned runtime must drive `block_on` itself, not via
                    // its handle, or spawned iteratees can't use its drivers.
                    TokioRuntime::Owned(runtime) => runtime.block_on(f),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    /// Drives blocking waits on the `futures` executor, spawning
    /// nothing of its own.
    struct LocalBlocker;

    impl Blocker for LocalBlocker {
        fn block_on<T, F: Future<Output = T>>(&self, f: F) -> T {
            futures::executor::block_on(f)
        }
    }

    /// One OS thread per iteratee, sleeping in proportion to `value`.
    fn threaded(order: Arc<Mutex<Vec<u64>>>) -> impl Fn(&u64, TaskCallback) + Send + Sync + 'static {
        move |value: &u64, done: TaskCallback| {
            let value = *value;
            let order = order.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(value * 30));
                order.lock().unwrap().push(value);
                done.call(value % 2).unwrap();
            });
        }
    }

    #[test]
    fn blocking_search_across_threads() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let found = find_blocking(
            &LocalBlocker,
            vec![2u64, 6, 3, 8],
            Limit::new(2).unwrap(),
            threaded(order.clone()),
        );
        assert_eq!(found, Ok(Some(3)));
        assert_eq!(order.lock().unwrap()[..2], [2, 3]);
    }

    #[test]
    fn blocking_search_without_match() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let found = find_blocking(
            &LocalBlocker,
            vec![4u64, 2, 6],
            Limit::Unbounded,
            threaded(order.clone()),
        );
        assert_eq!(found, Ok(None));
        assert_eq!(*order.lock().unwrap(), vec![2, 4, 6]);
    }

    #[test]
    fn dropped_callbacks_abandon_the_search() {
        let found = find_blocking(
            &LocalBlocker,
            vec![1u8, 2, 3],
            Limit::sequential(),
            |_: &u8, done: TaskCallback| drop(done),
        );
        assert_eq!(found, Err(FindError::Abandoned));
    }

    #[test]
    fn refusing_blocker_dispatches_nothing() {
        struct Refuse;

        impl Blocker for Refuse {
            fn block_on<T, F: Future<Output = T>>(&self, _: F) -> T {
                unreachable!("blocked after refusing")
            }

            fn can_block(&self) -> Result<(), FindError> {
                Err(FindError::BlockingInRuntime)
            }
        }

        let order = Arc::new(Mutex::new(Vec::new()));
        let found = find_blocking(&Refuse, vec![1u64, 2], Limit::Unbounded, threaded(order.clone()));
        assert_eq!(found, Err(FindError::BlockingInRuntime));
        thread::sleep(Duration::from_millis(90));
        assert!(order.lock().unwrap().is_empty());
    }

    #[cfg(feature = "use-tokio")]
    #[tokio::test]
    async fn tokio_refuses_current_thread_runtime() {
        use super::use_tokio::TokioSpawner;

        let spawner = TokioSpawner::default();
        assert_eq!(spawner.can_block(), Err(FindError::BlockingInRuntime));
    }

    #[cfg(feature = "use-async-std")]
    #[test]
    fn async_std_spawned_predicates() {
        use super::use_async_std::AsyncStdSpawner;

        let iteratee = spawn_iteratee(AsyncStdSpawner, |n: &u64| {
            let n = *n;
            async move {
                async_std::task::sleep(Duration::from_millis(n * 20)).await;
                n % 2
            }
        });
        let found = find_blocking(&AsyncStdSpawner, vec![5u64, 3, 2], Limit::Unbounded, iteratee);
        assert_eq!(found, Ok(Some(3)));

        let iteratee = spawn_blocking_iteratee(AsyncStdSpawner, |n: &u64| n % 3 == 0);
        let found = find_blocking(&AsyncStdSpawner, vec![1u64, 2, 4, 9], Limit::sequential(), iteratee);
        assert_eq!(found, Ok(Some(9)));
    }

    #[cfg(feature = "use-tokio")]
    #[test]
    fn tokio_spawned_predicates() {
        use super::use_tokio::TokioSpawner;

        let spawner = TokioSpawner::owned().unwrap();
        let iteratee = spawn_iteratee(spawner.clone(), |n: &u64| {
            let n = *n;
            async move {
                tokio::time::sleep(Duration::from_millis(n * 20)).await;
                n % 2
            }
        });
        let found = find_blocking(&spawner, vec![2u64, 5, 1], Limit::new(2).unwrap(), iteratee);
        assert_eq!(found, Ok(Some(1)));
    }
}
