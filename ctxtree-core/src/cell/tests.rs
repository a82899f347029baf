#[cfg(test)]
mod tests {
    use super::super::*;
    use std::sync::Arc;

    #[test]
    fn test_load_store() {
        let cell = AtomicRef::empty();
        assert!(cell.is_empty());
        assert!(cell.load().is_none());

        cell.store(Some(Arc::new(7)));
        assert_eq!(cell.load().as_deref(), Some(&7));

        let previous = cell.swap(None);
        assert_eq!(previous.as_deref(), Some(&7));
        assert!(cell.is_empty());
    }

    #[test]
    fn test_compare_and_swap_is_by_identity() {
        let first = Arc::new(String::from("a"));
        let cell = AtomicRef::new(Arc::clone(&first));

        // Equal content, different allocation: must not match
        let lookalike = Some(Arc::new(String::from("a")));
        assert!(!cell.compare_and_swap(&lookalike, Some(Arc::new(String::from("b")))));
        assert_eq!(cell.load().as_deref().map(String::as_str), Some("a"));

        assert!(cell.compare_and_swap(&Some(first), Some(Arc::new(String::from("c")))));
        assert_eq!(cell.load().as_deref().map(String::as_str), Some("c"));
    }

    #[test]
    fn test_compare_and_swap_from_empty() {
        let cell: AtomicRef<u32> = AtomicRef::empty();
        assert!(cell.compare_and_swap(&None, Some(Arc::new(1))));
        assert!(!cell.compare_and_swap(&None, Some(Arc::new(2))));
        assert_eq!(cell.load().as_deref(), Some(&1));
    }

    #[test]
    fn test_get_or_publish_first_writer_wins() {
        let cell = Arc::new(AtomicRef::empty());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || cell.get_or_publish(Arc::new(i)))
            })
            .collect();

        let winners: Vec<Arc<i32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = cell.load().unwrap();
        assert!(winners.iter().all(|w| Arc::ptr_eq(w, &stored)));
    }
}
