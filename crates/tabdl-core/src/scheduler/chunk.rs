//! Splitting the group list into one contiguous chunk per worker.

/// Cut `items` into at most `workers` contiguous chunks of `ceil(len / workers)`
/// items each. If the cut leaves more chunks than workers, the last chunk is
/// merged into the one before it. Order is preserved; no chunk is empty.
pub fn partition<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    let workers = workers.max(1);
    let size = items.len().div_ceil(workers);

    let mut chunks: Vec<Vec<T>> = Vec::with_capacity(workers);
    let mut rest = items.into_iter().peekable();
    while rest.peek().is_some() {
        chunks.push(rest.by_ref().take(size).collect());
    }
    if chunks.len() > workers {
        if let Some(last) = chunks.pop() {
            if let Some(prev) = chunks.last_mut() {
                prev.extend(last);
            }
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes<T>(chunks: &[Vec<T>]) -> Vec<usize> {
        chunks.iter().map(Vec::len).collect()
    }

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(partition(Vec::<u32>::new(), 4).is_empty());
    }

    #[test]
    fn even_and_uneven_splits() {
        assert_eq!(sizes(&partition((0..8).collect(), 4)), vec![2, 2, 2, 2]);
        assert_eq!(sizes(&partition((0..10).collect(), 4)), vec![3, 3, 3, 1]);
        assert_eq!(sizes(&partition((0..10).collect(), 3)), vec![4, 4, 2]);
    }

    #[test]
    fn fewer_items_than_workers() {
        assert_eq!(sizes(&partition((0..3).collect(), 8)), vec![1, 1, 1]);
    }

    #[test]
    fn zero_workers_means_one() {
        assert_eq!(partition((0..5).collect(), 0), vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn covers_input_once_in_order_and_never_exceeds_workers() {
        for len in 0..40usize {
            for workers in 1..12usize {
                let chunks = partition((0..len).collect(), workers);
                assert!(chunks.len() <= workers, "len={len} workers={workers}");
                assert!(chunks.iter().all(|c| !c.is_empty()));
                let flat: Vec<usize> = chunks.into_iter().flatten().collect();
                assert_eq!(flat, (0..len).collect::<Vec<_>>());
            }
        }
    }
}
