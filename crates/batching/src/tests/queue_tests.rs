use super::*;

const WINDOW: Duration = Duration::from_secs(1);

#[test]
fn enqueue_keeps_the_first_payload_for_a_key() {
    let now = Instant::now();
    let mut queue = BatchQueue::new("test", WINDOW);
    assert!(queue.enqueue("k", 1, now));
    assert!(!queue.enqueue("k", 2, now));
    assert_eq!(queue.len(), 1);

    let flushed = queue.take_due(now + WINDOW);
    assert_eq!(flushed, vec![("k".to_string(), 1)]);
    assert!(queue.is_empty());
}

#[test]
fn overwrite_keeps_the_last_payload_for_a_key() {
    let now = Instant::now();
    let mut queue = BatchQueue::new("test", WINDOW);
    queue.overwrite("k", vec![1, 2], now);
    queue.overwrite("k", vec![2, 1], now + Duration::from_millis(300));
    assert_eq!(queue.payload("k"), Some(&vec![2, 1]));

    let flushed = queue.take_due(now + WINDOW);
    assert_eq!(flushed, vec![("k".to_string(), vec![2, 1])]);
}

#[test]
fn nothing_is_due_before_its_window_closes() {
    let start = Instant::now();
    let mut queue = BatchQueue::new("test", WINDOW);
    queue.enqueue("early", 1, start);
    queue.enqueue("late", 2, start + Duration::from_millis(600));

    assert!(queue.take_due(start + Duration::from_millis(999)).is_empty());
    assert_eq!(queue.len(), 2);

    let first = queue.take_due(start + WINDOW);
    assert_eq!(first, vec![("early".to_string(), 1)]);
    assert!(queue.contains("late"));

    let second = queue.take_due(start + Duration::from_millis(1_600));
    assert_eq!(second, vec![("late".to_string(), 2)]);
}

#[test]
fn due_entries_come_out_in_insertion_order() {
    let now = Instant::now();
    let mut queue = BatchQueue::new("test", WINDOW);
    for key in ["c", "a", "b"] {
        queue.enqueue(key, key.to_uppercase(), now);
    }
    let keys: Vec<String> = queue
        .take_due(now + WINDOW)
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    assert_eq!(keys, ["c", "a", "b"]);
}

#[test]
fn entries_added_after_a_flush_wait_for_the_next_window() {
    let now = Instant::now();
    let mut queue = BatchQueue::new("test", WINDOW);
    queue.enqueue("k", 1, now);
    assert_eq!(queue.take_due(now + WINDOW).len(), 1);

    assert!(queue.enqueue("k", 2, now + WINDOW));
    assert!(queue.take_due(now + WINDOW).is_empty());
    assert_eq!(
        queue.take_due(now + WINDOW * 2),
        vec![("k".to_string(), 2)]
    );
}

#[test]
fn cancel_and_drain_remove_pending_entries() {
    let now = Instant::now();
    let mut queue = BatchQueue::new("test", WINDOW);
    queue.enqueue("a", 1, now);
    queue.enqueue("b", 2, now);
    assert!(queue.cancel("a"));
    assert!(!queue.cancel("a"));
    assert_eq!(queue.drain(), vec![("b".to_string(), 2)]);
    assert!(queue.is_empty());
}
