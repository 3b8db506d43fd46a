use std::future::Future;

use super::parallel::parallel_map_with;

/// An outer element of `async_map`: a lone item or a group of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested<T> {
    Item(T),
    Group(Vec<T>),
}

impl<T> Nested<T> {
    pub fn is_group(&self) -> bool {
        matches!(self, Nested::Group(_))
    }

    /// A lone item becomes a one-element group.
    pub fn into_group(self) -> Vec<T> {
        match self {
            Nested::Item(item) => vec![item],
            Nested::Group(group) => group,
        }
    }
}

impl<T> From<Vec<T>> for Nested<T> {
    fn from(group: Vec<T>) -> Self {
        Nested::Group(group)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestedOutput<R> {
    /// No outer element was a group; one result per item.
    Flat(Vec<R>),
    /// One result group per outer element, in outer order.
    Grouped(Vec<Vec<R>>),
}

impl<R> NestedOutput<R> {
    pub fn into_flat(self) -> Vec<R> {
        match self {
            NestedOutput::Flat(results) => results,
            NestedOutput::Grouped(groups) => groups.into_iter().flatten().collect(),
        }
    }
}

pub async fn async_map<T, F, Fut, R>(items: Vec<Nested<T>>, mut iterator: F) -> NestedOutput<R>
where
    T: Clone,
    F: FnMut(T, usize, &Vec<T>) -> Fut,
    Fut: Future<Output = R>,
{
    async_map_with(items, &(), |_, value, key, group| iterator(value, key, group)).await
}

/// Parallel map, flattened one level.
///
/// When any outer element is a group, the outer elements are taken one at a
/// time and each group is mapped in parallel; the next group is not started
/// until the previous one has fully settled. Keys seen by the iterator are
/// positions inside the group.
pub async fn async_map_with<T, X, F, Fut, R>(
    items: Vec<Nested<T>>,
    context: &X,
    mut iterator: F,
) -> NestedOutput<R>
where
    T: Clone,
    X: ?Sized,
    F: FnMut(&X, T, usize, &Vec<T>) -> Fut,
    Fut: Future<Output = R>,
{
    if !items.iter().any(Nested::is_group) {
        let flat: Vec<T> = items.into_iter().flat_map(Nested::into_group).collect();
        return NestedOutput::Flat(parallel_map_with(&flat, context, iterator).await);
    }

    tracing::debug!(groups = items.len(), "async map over nested groups");
    let mut grouped = Vec::with_capacity(items.len());
    for item in items {
        let group = item.into_group();
        grouped.push(parallel_map_with(&group, context, &mut iterator).await);
    }
    NestedOutput::Grouped(grouped)
}
