//! Insertion-ordered grouping used to bucket records for display.

/// Bucket `items` by the key produced by `key_fn`.
///
/// Buckets appear in the order each key was first seen and items keep their
/// input order within a bucket. Used to group timetable slots by weekday and
/// attendance marks by status, where the input order is the display order.
pub fn group_by_key<T, K, F>(items: Vec<T>, key_fn: F) -> Vec<(K, Vec<T>)>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();

    for item in items {
        let key = key_fn(&item);

        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, bucket)) => bucket.push(item),
            None => groups.push((key, vec![item])),
        }
    }

    groups
}
