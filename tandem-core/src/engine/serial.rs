use std::future::Future;

use crate::collection::{Collection, Gather, Results};

/// Awaits the iterator for one element at a time, in key order.
async fn drive<C, X, F, Fut, S>(collection: &C, context: &X, mut iterator: F, mut settle: S)
where
    C: Collection + ?Sized,
    X: ?Sized,
    F: FnMut(&X, C::Item, C::Key, &C) -> Fut,
    Fut: Future,
    S: FnMut(usize, C::Key, Fut::Output),
{
    let keys = collection.keys();
    let total = keys.len();
    tracing::debug!(shape = %collection.shape(), total, "serial iteration started");

    for (position, key) in keys.into_iter().enumerate() {
        let Some(value) = collection.get(&key).cloned() else {
            continue;
        };
        let output = iterator(context, value, key.clone(), collection).await;
        tracing::trace!(position, ?key, "serial element settled");
        settle(position, key, output);
    }

    tracing::debug!(total, "serial iteration finished");
}

pub async fn serial_for_each<C, F, Fut>(collection: &C, mut iterator: F)
where
    C: Collection + ?Sized,
    F: FnMut(C::Item, C::Key, &C) -> Fut,
    Fut: Future<Output = ()>,
{
    serial_for_each_with(collection, &(), |_, value, key, collection| {
        iterator(value, key, collection)
    })
    .await
}

pub async fn serial_for_each_with<C, X, F, Fut>(collection: &C, context: &X, iterator: F)
where
    C: Collection + ?Sized,
    X: ?Sized,
    F: FnMut(&X, C::Item, C::Key, &C) -> Fut,
    Fut: Future<Output = ()>,
{
    drive(collection, context, iterator, |_, _, ()| {}).await
}

pub async fn serial_map<C, F, Fut, R>(collection: &C, mut iterator: F) -> C::Output
where
    C: Gather<R> + ?Sized,
    F: FnMut(C::Item, C::Key, &C) -> Fut,
    Fut: Future<Output = R>,
{
    serial_map_with(collection, &(), |_, value, key, collection| {
        iterator(value, key, collection)
    })
    .await
}

pub async fn serial_map_with<C, X, F, Fut, R>(collection: &C, context: &X, iterator: F) -> C::Output
where
    C: Gather<R> + ?Sized,
    X: ?Sized,
    F: FnMut(&X, C::Item, C::Key, &C) -> Fut,
    Fut: Future<Output = R>,
{
    let mut results = Results::with_len(collection.len());
    drive(collection, context, iterator, |position, key, value| {
        results.set(position, key, value)
    })
    .await;
    collection.gather(results)
}
