//! The bounded iteration scheduler.
//!
//! A run dispatches entries in position order, keeping at most
//! `limit` of them in flight, and reacts to each verdict as it
//! arrives: the first truthy verdict completes the run, a falsy one
//! frees a slot for the next entry. Once every entry has reported
//! falsy the run completes with no match. Either way the completion
//! callback fires exactly once.
//!
//! Verdicts may arrive from any thread, or synchronously from within
//! the iteratee call that dispatched the entry. Run state is guarded
//! by a mutex that is never held across a call into user code.
//! Dispatch happens in a single loop per run: a verdict that arrives
//! while the loop is active only frees its slot, and the active loop
//! picks it up, so synchronous completions do not recurse.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace, warn};

use crate::entries::{Entry, Sequence};
use crate::guard::{Settle, TaskCallback};
use crate::Limit;

#[derive(Debug, Default)]
struct RunState {
    in_flight: usize,
    cursor: usize,
    resolved: bool,
    completed: bool,
    pumping: bool,
}

enum Step {
    Dispatch(usize),
    Exhausted,
    Idle,
}

enum Verdict {
    Late,
    Found,
    Rejected,
}

struct Run<P, V, X, F, D> {
    entries: Vec<Entry<P, V>>,
    window: usize,
    iteratee: F,
    context: Option<X>,
    state: Mutex<RunState>,
    on_done: Mutex<Option<D>>,
}

/// Search `sequence` for the first entry whose verdict is truthy.
///
/// `iteratee` is called once per dispatched entry with its value,
/// its position, the optional `context`, and a fresh
/// [`TaskCallback`] through which it must report its verdict
/// exactly once. `on_done` receives a clone of the matching value,
/// or `None` if no entry matched. An empty sequence completes
/// before this function returns, without calling `iteratee`.
///
/// Entries already in flight when a match is reported keep running;
/// their verdicts are discarded.
pub fn find<P, V, X, F, D>(
    sequence: Sequence<P, V>,
    iteratee: F,
    limit: Limit,
    on_done: D,
    context: Option<X>,
) where
    P: Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    X: Send + Sync + 'static,
    F: Fn(&V, &P, Option<&X>, TaskCallback) + Send + Sync + 'static,
    D: FnOnce(Option<V>) + Send + 'static,
{
    let entries = sequence.into_entries();
    let window = limit.window(entries.len());
    debug!("searching {} entries with limit {}", entries.len(), limit);

    let run = Arc::new(Run {
        entries,
        window,
        iteratee,
        context,
        state: Mutex::new(RunState::default()),
        on_done: Mutex::new(Some(on_done)),
    });
    run.pump();
}

impl<P, V, X, F, D> Run<P, V, X, F, D>
where
    P: Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    X: Send + Sync + 'static,
    F: Fn(&V, &P, Option<&X>, TaskCallback) + Send + Sync + 'static,
    D: FnOnce(Option<V>) + Send + 'static,
{
    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dispatch until the window is full or the sequence is used up.
    fn pump(self: &Arc<Self>) {
        {
            let mut state = self.state();
            if state.pumping {
                return;
            }
            state.pumping = true;
        }

        loop {
            // Deciding to stop and clearing `pumping` must happen under
            // one lock, or a verdict arriving in between is lost.
            let step = {
                let mut state = self.state();
                if !state.completed
                    && state.cursor < self.entries.len()
                    && state.in_flight < self.window
                {
                    let index = state.cursor;
                    state.cursor += 1;
                    state.in_flight += 1;
                    Step::Dispatch(index)
                } else {
                    state.pumping = false;
                    if !state.completed
                        && state.cursor == self.entries.len()
                        && state.in_flight == 0
                    {
                        state.completed = true;
                        Step::Exhausted
                    } else {
                        Step::Idle
                    }
                }
            };

            match step {
                Step::Dispatch(index) => self.dispatch(index),
                Step::Exhausted => {
                    debug!("no match among {} entries", self.entries.len());
                    self.finish(None);
                    return;
                }
                Step::Idle => return,
            }
        }
    }

    fn dispatch(self: &Arc<Self>, index: usize) {
        let entry = &self.entries[index];
        trace!("dispatching entry {}", index);
        let run: Arc<dyn Settle> = self.clone();
        (self.iteratee)(
            &entry.value,
            &entry.position,
            self.context.as_ref(),
            TaskCallback::new(index, run),
        );
    }

    fn finish(&self, result: Option<V>) {
        let on_done = self.on_done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(on_done) = on_done {
            on_done(result);
        }
    }
}

impl<P, V, X, F, D> Settle for Run<P, V, X, F, D>
where
    P: Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    X: Send + Sync + 'static,
    F: Fn(&V, &P, Option<&X>, TaskCallback) + Send + Sync + 'static,
    D: FnOnce(Option<V>) + Send + 'static,
{
    fn settle(self: Arc<Self>, index: usize, verdict: bool) {
        let outcome = {
            let mut state = self.state();
            state.in_flight -= 1;
            if state.completed {
                Verdict::Late
            } else if verdict && !state.resolved {
                state.resolved = true;
                state.completed = true;
                Verdict::Found
            } else {
                Verdict::Rejected
            }
        };
        trace!("entry {} reported {}", index, verdict);

        match outcome {
            Verdict::Late => warn!("discarding verdict of entry {} after completion", index),
            Verdict::Found => {
                debug!("entry {} matched", index);
                self.finish(Some(self.entries[index].value.clone()));
            }
            Verdict::Rejected => self.pump(),
        }
    }
}
