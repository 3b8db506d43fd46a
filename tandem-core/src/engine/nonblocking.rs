//! Non-blocking iteration with a synchronous iterator.
//!
//! Elements run back to back until the time budget for the current turn is
//! spent, then control goes back to the event loop and iteration resumes on
//! the next turn. Input order is preserved across turn boundaries.

use std::ops::ControlFlow;
use std::time::Duration;

use crate::collection::{Collection, Gather, Results};
use crate::config::DEFAULT_TIME_BUDGET;
use crate::event_loop::{EventLoop, TokioLoop};

static DEFAULT_EVENT_LOOP: TokioLoop = TokioLoop::new(crate::config::DEFAULT_YIELD_DELAY);

// ════════════════════════════════════════════════════════════════════
// Step
// ════════════════════════════════════════════════════════════════════

/// What a `nonblocking_for_each` iterator asks for after an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

impl From<()> for Step {
    fn from(_: ()) -> Self {
        Step::Continue
    }
}

/// Only `false` stops.
impl From<bool> for Step {
    fn from(keep_going: bool) -> Self {
        if keep_going { Step::Continue } else { Step::Stop }
    }
}

impl<B> From<ControlFlow<B>> for Step {
    fn from(flow: ControlFlow<B>) -> Self {
        match flow {
            ControlFlow::Continue(()) => Step::Continue,
            ControlFlow::Break(_) => Step::Stop,
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Options
// ════════════════════════════════════════════════════════════════════

/// Context, time budget and event loop for a non-blocking call.
pub struct NonblockingOptions<'a, X: ?Sized = (), L: ?Sized = TokioLoop> {
    context: &'a X,
    time_budget: Duration,
    event_loop: &'a L,
}

impl NonblockingOptions<'static, (), TokioLoop> {
    /// No context, one second per turn, the shared tokio loop.
    pub fn new() -> Self {
        Self {
            context: &(),
            time_budget: DEFAULT_TIME_BUDGET,
            event_loop: &DEFAULT_EVENT_LOOP,
        }
    }
}

impl Default for NonblockingOptions<'static, (), TokioLoop> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, X: ?Sized, L: ?Sized + EventLoop> NonblockingOptions<'a, X, L> {
    pub fn context<'b, Y: ?Sized>(self, context: &'b Y) -> NonblockingOptions<'b, Y, L>
    where
        'a: 'b,
    {
        NonblockingOptions {
            context,
            time_budget: self.time_budget,
            event_loop: self.event_loop,
        }
    }

    /// A zero budget falls back to the default of one second.
    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = if budget.is_zero() {
            DEFAULT_TIME_BUDGET
        } else {
            budget
        };
        self
    }

    pub fn event_loop<'b, M: ?Sized + EventLoop>(
        self,
        event_loop: &'b M,
    ) -> NonblockingOptions<'b, X, M>
    where
        'a: 'b,
    {
        NonblockingOptions {
            context: self.context,
            time_budget: self.time_budget,
            event_loop,
        }
    }

    pub fn budget(&self) -> Duration {
        self.time_budget
    }
}

// ════════════════════════════════════════════════════════════════════
// Driver
// ════════════════════════════════════════════════════════════════════

async fn pace<C, X, L, F>(collection: &C, options: &NonblockingOptions<'_, X, L>, mut visit: F)
where
    C: Collection + ?Sized,
    X: ?Sized,
    L: ?Sized + EventLoop,
    F: FnMut(usize, &X, C::Item, C::Key, &C) -> Step,
{
    let keys = collection.keys();
    let total = keys.len();
    let budget = options.time_budget;
    let event_loop = options.event_loop;
    tracing::debug!(shape = %collection.shape(), total, ?budget, "nonblocking iteration started");

    let mut next = 0;
    let mut turns = 1;
    let mut turn_started = event_loop.now();

    loop {
        while next < total {
            let key = &keys[next];
            if let Some(value) = collection.get(key) {
                let step = visit(next, options.context, value.clone(), key.clone(), collection);
                if step == Step::Stop {
                    tracing::debug!(position = next, "nonblocking iteration stopped by iterator");
                    next = total;
                    break;
                }
            }
            next += 1;
            if event_loop.now().saturating_duration_since(turn_started) >= budget {
                break;
            }
        }

        if next >= total {
            break;
        }

        tracing::trace!(processed = next, total, turns, "time budget spent, yielding");
        event_loop.defer().await;
        turns += 1;
        turn_started = event_loop.now();
    }

    tracing::debug!(total, turns, "nonblocking iteration finished");
}

// ════════════════════════════════════════════════════════════════════
// Operations
// ════════════════════════════════════════════════════════════════════

pub async fn nonblocking_for_each<C, F, S>(collection: &C, mut iterator: F)
where
    C: Collection + ?Sized,
    F: FnMut(C::Item, C::Key, &C) -> S,
    S: Into<Step>,
{
    nonblocking_for_each_with(
        collection,
        NonblockingOptions::new(),
        |_, value, key, collection| iterator(value, key, collection),
    )
    .await
}

pub async fn nonblocking_for_each_with<C, X, L, F, S>(
    collection: &C,
    options: NonblockingOptions<'_, X, L>,
    mut iterator: F,
) where
    C: Collection + ?Sized,
    X: ?Sized,
    L: ?Sized + EventLoop,
    F: FnMut(&X, C::Item, C::Key, &C) -> S,
    S: Into<Step>,
{
    pace(collection, &options, |_, context, value, key, collection| {
        iterator(context, value, key, collection).into()
    })
    .await
}

pub async fn nonblocking_map<C, F, R>(collection: &C, mut iterator: F) -> C::Output
where
    C: Gather<R> + ?Sized,
    F: FnMut(C::Item, C::Key, &C) -> R,
{
    nonblocking_map_with(
        collection,
        NonblockingOptions::new(),
        |_, value, key, collection| iterator(value, key, collection),
    )
    .await
}

pub async fn nonblocking_map_with<C, X, L, F, R>(
    collection: &C,
    options: NonblockingOptions<'_, X, L>,
    mut iterator: F,
) -> C::Output
where
    C: Gather<R> + ?Sized,
    X: ?Sized,
    L: ?Sized + EventLoop,
    F: FnMut(&X, C::Item, C::Key, &C) -> R,
{
    let mut results = Results::with_len(collection.len());
    pace(collection, &options, |position, context, value, key, collection| {
        let output = iterator(context, value, key.clone(), collection);
        results.set(position, key, output);
        Step::Continue
    })
    .await;
    collection.gather(results)
}
