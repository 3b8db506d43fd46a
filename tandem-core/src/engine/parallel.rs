use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;

use crate::collection::{Collection, Gather, Results};

/// Invokes the iterator for every element before awaiting any of them, then
/// settles elements in completion order until the counter reaches the number
/// dispatched.
async fn dispatch<C, X, F, Fut, S>(collection: &C, context: &X, mut iterator: F, mut settle: S)
where
    C: Collection + ?Sized,
    X: ?Sized,
    F: FnMut(&X, C::Item, C::Key, &C) -> Fut,
    Fut: Future,
    S: FnMut(usize, C::Key, Fut::Output),
{
    let keys = collection.keys();
    let mut pending = FuturesUnordered::new();

    for (position, key) in keys.into_iter().enumerate() {
        let Some(value) = collection.get(&key).cloned() else {
            continue;
        };
        let future = iterator(context, value, key.clone(), collection);
        pending.push(async move { (position, key, future.await) });
    }

    let dispatched = pending.len();
    tracing::debug!(shape = %collection.shape(), dispatched, "parallel iteration dispatched");

    let mut completed = 0;
    while let Some((position, key, output)) = pending.next().await {
        completed += 1;
        tracing::trace!(position, completed, dispatched, "parallel element settled");
        settle(position, key, output);
    }

    tracing::debug!(completed, "parallel iteration finished");
}

pub async fn parallel_for_each<C, F, Fut>(collection: &C, mut iterator: F)
where
    C: Collection + ?Sized,
    F: FnMut(C::Item, C::Key, &C) -> Fut,
    Fut: Future<Output = ()>,
{
    parallel_for_each_with(collection, &(), |_, value, key, collection| {
        iterator(value, key, collection)
    })
    .await
}

pub async fn parallel_for_each_with<C, X, F, Fut>(collection: &C, context: &X, iterator: F)
where
    C: Collection + ?Sized,
    X: ?Sized,
    F: FnMut(&X, C::Item, C::Key, &C) -> Fut,
    Fut: Future<Output = ()>,
{
    dispatch(collection, context, iterator, |_, _, ()| {}).await
}

pub async fn parallel_map<C, F, Fut, R>(collection: &C, mut iterator: F) -> C::Output
where
    C: Gather<R> + ?Sized,
    F: FnMut(C::Item, C::Key, &C) -> Fut,
    Fut: Future<Output = R>,
{
    parallel_map_with(collection, &(), |_, value, key, collection| {
        iterator(value, key, collection)
    })
    .await
}

pub async fn parallel_map_with<C, X, F, Fut, R>(
    collection: &C,
    context: &X,
    iterator: F,
) -> C::Output
where
    C: Gather<R> + ?Sized,
    X: ?Sized,
    F: FnMut(&X, C::Item, C::Key, &C) -> Fut,
    Fut: Future<Output = R>,
{
    let mut results = Results::with_len(collection.len());
    dispatch(collection, context, iterator, |position, key, value| {
        results.set(position, key, value)
    })
    .await;
    collection.gather(results)
}
