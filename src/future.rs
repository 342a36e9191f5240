use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::ready;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, trace};
use pin_project::pin_project;

use crate::{IntoSequence, Limit, Truthy};

/// Search a collection with an `async` predicate.
///
/// Entries are dispatched in position order, at most `limit` at a
/// time, when the returned future is first polled. It resolves to
/// the first value whose predicate output is truthy, in completion
/// order, or `None`. An empty collection resolves on the first poll.
///
/// Unlike [`find`](crate::scheduler::find), the returned future owns
/// the predicate futures it started: once it resolves (or is dropped)
/// the ones still in flight are dropped with it.
///
/// ```rust
/// # futures::executor::block_on(async {
/// use async_detect::{detect_async, Limit};
///
/// let found = detect_async(vec![2, 6, 7, 8], Limit::new(2)?, |n: &u32| {
///     let odd = n % 2;
///     async move { odd }
/// }).await;
/// assert_eq!(found, Some(7));
/// # Ok::<(), async_detect::FindError>(())
/// # }).unwrap();
/// ```
pub fn detect_async<C, F, Fut>(collection: C, limit: Limit, iteratee: F) -> Detect<C::Value, F, Fut>
where
    C: IntoSequence,
    F: FnMut(&C::Value) -> Fut,
    Fut: Future,
    Fut::Output: Truthy,
{
    let values: Vec<C::Value> = collection.into_sequence()
        .into_iter()
        .map(|entry| entry.value)
        .collect();
    Detect {
        window: limit.window(values.len()),
        values,
        cursor: 0,
        iteratee,
        in_flight: FuturesUnordered::new(),
        done: false,
    }
}

/// Future returned by [`detect_async`].
#[pin_project]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Detect<V, F, Fut> {
    values: Vec<V>,
    cursor: usize,
    window: usize,
    iteratee: F,
    in_flight: FuturesUnordered<Probe<Fut>>,
    done: bool,
}

impl<V, F, Fut> Detect<V, F, Fut> {
    /// Number of predicate futures currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of entries dispatched so far.
    pub fn dispatched(&self) -> usize {
        self.cursor
    }
}

impl<V, F, Fut> Future for Detect<V, F, Fut>
where
    F: FnMut(&V) -> Fut,
    Fut: Future,
    Fut::Output: Truthy,
{
    type Output = Option<V>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let this = self.project();
        assert!(!*this.done, "`Detect` polled after completion");

        loop {
            while this.in_flight.len() < *this.window && *this.cursor < this.values.len() {
                let index = *this.cursor;
                *this.cursor += 1;
                trace!("dispatching entry {}", index);
                let fut = (this.iteratee)(&this.values[index]);
                this.in_flight.push(Probe { index, fut });
            }

            match ready!(this.in_flight.poll_next_unpin(cx)) {
                Some((index, true)) => {
                    debug!("entry {} matched, dropping {} in flight", index, this.in_flight.len());
                    *this.done = true;
                    return Poll::Ready(std::mem::take(this.values).into_iter().nth(index));
                }
                Some((index, false)) => trace!("entry {} rejected", index),
                None => {
                    debug!("no match among {} entries", this.values.len());
                    *this.done = true;
                    return Poll::Ready(None);
                }
            }
        }
    }
}

/// One in-flight predicate, tagged with the entry it was started for.
#[pin_project]
struct Probe<Fut> {
    index: usize,
    #[pin]
    fut: Fut,
}

impl<Fut> Future for Probe<Fut>
where
    Fut: Future,
    Fut::Output: Truthy,
{
    type Output = (usize, bool);

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let this = self.project();
        let verdict = ready!(this.fut.poll(cx));
        Poll::Ready((*this.index, verdict.is_truthy()))
    }
}
