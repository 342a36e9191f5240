//! Find the first element of a collection that satisfies an
//! asynchronous test, while controlling how many tests run at once.
//!
//! ## Motivation
//!
//! Searching with a slow or remote predicate (a network probe, a
//! file check, a lookup in another service) is naturally
//! concurrent, but unbounded fan-out is not always acceptable, and
//! sometimes the search must stop at the first match in position
//! order. This crate runs a caller-supplied *iteratee* over a
//! collection under one of three policies:
//!
//! - [`detect`]: every element is tested at once; the first test to
//!   report a match wins.
//! - [`detect_series`]: one element at a time, in order; the first
//!   matching element by position wins and nothing after it is tested.
//! - [`detect_limit`]: at most `limit` tests in flight; a finished test
//!   makes room for the next element.
//!
//! All three are the same engine ([`scheduler::find`]) with a
//! different [`Limit`], and share one completion contract: the
//! completion callback fires exactly once, with the matching value or
//! `None`.
//!
//! ## Iteratees
//!
//! An iteratee is called with a reference to the element and a
//! [`TaskCallback`]. It may report its verdict right away or hand the
//! callback to some other task, timer or thread and report later. Any
//! [`Truthy`] value is a verdict: zero, empty, `false`, `()` and `None`
//! are no match, everything else is a match.
//!
//! ```rust
//! use std::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel();
//! async_detect::detect_series(
//!     vec![2, 6, 7, 8],
//!     |n: &u32, done| done.call(n % 2).unwrap(),
//!     move |found| tx.send(found).unwrap(),
//! );
//! assert_eq!(rx.recv().unwrap(), Some(7));
//! ```
//!
//! Each callback must be called exactly once. A second call is a
//! contract violation and fails with [`FindError::DoubleCompletion`]
//! instead of reaching the search. An iteratee that never calls back
//! stalls the search; one that panics propagates the panic out of the
//! call that dispatched it.
//!
//! ## Context
//!
//! [`Finder`] exposes the full form of the engine: the iteratee also
//! receives the element's position (its index, or its key for maps)
//! and an optional shared context value.
//!
//! ## Async predicates
//!
//! [`detect_async`] is the same search for predicates written as
//! `async` functions, returning a future instead of taking a
//! completion callback. With the `use-async-std` or `use-tokio`
//! feature, [`spawner`] adapts `async` predicates into callback
//! iteratees that run as spawned tasks, and `detect_blocking` waits
//! for such a search from synchronous code.
#[macro_use]
mod utils;

mod entries;
mod error;
mod future;
mod guard;
mod policy;
mod verdict;

pub mod scheduler;
pub mod spawner;

pub use entries::{Entry, IntoSequence, Sequence};
pub use error::FindError;
pub use future::{detect_async, Detect};
pub use guard::TaskCallback;
pub use policy::Limit;
pub use verdict::Truthy;

cfg_async_std! {
    pub use spawner::use_async_std::AsyncStdSpawner;
    pub type DefaultSpawner = AsyncStdSpawner;
}

cfg_tokio! {
    pub use spawner::use_tokio::TokioSpawner;
}

cfg_tokio_only! {
    pub type DefaultSpawner = TokioSpawner;
}

/// A search configuration: a concurrency [`Limit`] and an optional
/// context handed to every iteratee call.
#[derive(Debug, Clone)]
pub struct Finder<X = ()> {
    limit: Limit,
    context: Option<X>,
}

impl Finder {
    pub fn new(limit: Limit) -> Self {
        Finder { limit, context: None }
    }

    pub fn unbounded() -> Self {
        Self::new(Limit::Unbounded)
    }

    pub fn sequential() -> Self {
        Self::new(Limit::sequential())
    }

    pub fn bounded(limit: usize) -> Result<Self, FindError> {
        Limit::new(limit).map(Self::new)
    }
}

impl<X> Finder<X> {
    /// Replace the context handed to the iteratee.
    pub fn with_context<Y>(self, context: Y) -> Finder<Y> {
        Finder {
            limit: self.limit,
            context: Some(context),
        }
    }

    /// Start the search. See [`scheduler::find`].
    pub fn find<C, F, D>(self, collection: C, iteratee: F, on_done: D)
    where
        C: IntoSequence,
        C::Position: Send + Sync + 'static,
        C::Value: Clone + Send + Sync + 'static,
        X: Send + Sync + 'static,
        F: Fn(&C::Value, &C::Position, Option<&X>, TaskCallback) + Send + Sync + 'static,
        D: FnOnce(Option<C::Value>) + Send + 'static,
    {
        scheduler::find(collection.into_sequence(), iteratee, self.limit, on_done, self.context)
    }
}

/// Test every element at once; `on_done` gets the first value to be
/// reported truthy, in completion order.
pub fn detect<C, F, D>(collection: C, iteratee: F, on_done: D)
where
    C: IntoSequence,
    C::Position: Send + Sync + 'static,
    C::Value: Clone + Send + Sync + 'static,
    F: Fn(&C::Value, TaskCallback) + Send + Sync + 'static,
    D: FnOnce(Option<C::Value>) + Send + 'static,
{
    Finder::unbounded().find(collection, move |value, _, _, done| iteratee(value, done), on_done)
}

/// Test one element at a time, in position order; `on_done` gets the
/// first truthy value by position.
pub fn detect_series<C, F, D>(collection: C, iteratee: F, on_done: D)
where
    C: IntoSequence,
    C::Position: Send + Sync + 'static,
    C::Value: Clone + Send + Sync + 'static,
    F: Fn(&C::Value, TaskCallback) + Send + Sync + 'static,
    D: FnOnce(Option<C::Value>) + Send + 'static,
{
    Finder::sequential().find(collection, move |value, _, _, done| iteratee(value, done), on_done)
}

/// Test at most `limit` elements at a time. A `limit` of zero is
/// rejected before anything is dispatched.
pub fn detect_limit<C, F, D>(
    collection: C,
    limit: usize,
    iteratee: F,
    on_done: D,
) -> Result<(), FindError>
where
    C: IntoSequence,
    C::Position: Send + Sync + 'static,
    C::Value: Clone + Send + Sync + 'static,
    F: Fn(&C::Value, TaskCallback) + Send + Sync + 'static,
    D: FnOnce(Option<C::Value>) + Send + 'static,
{
    Finder::bounded(limit)?.find(collection, move |value, _, _, done| iteratee(value, done), on_done);
    Ok(())
}

cfg_any_spawner! {
    /// Search with an `async` predicate spawned on the default runtime,
    /// blocking the current thread until the search completes.
    ///
    /// Called from within a tokio current-thread runtime (the default
    /// `#[tokio::test]` flavor) with only `use-tokio` enabled, this
    /// fails with [`FindError::BlockingInRuntime`] before anything is
    /// dispatched.
    pub fn detect_blocking<C, F, Fut>(
        collection: C,
        limit: Limit,
        predicate: F,
    ) -> Result<Option<C::Value>, FindError>
    where
        C: IntoSequence,
        C::Position: Send + Sync + 'static,
        C::Value: Clone + Send + Sync + 'static,
        F: Fn(&C::Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future + Send + 'static,
        Fut::Output: Truthy,
    {
        let runtime = DefaultSpawner::default();
        let iteratee = spawner::spawn_iteratee(runtime.clone(), predicate);
        spawner::find_blocking(&runtime, collection, limit, iteratee)
    }
}
