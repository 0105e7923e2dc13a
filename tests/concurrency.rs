use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use rcu_idmap::{Key, RcuMap};
use test_log::test;

fn k(raw: usize) -> Key {
    Key::new(raw).expect("non-zero key")
}

// Values carry their own key so a reader can tell if it ever got the
// value stored under a different key.
#[derive(Clone, Debug, PartialEq)]
struct Tagged {
    key: usize,
    payload: u64,
}

#[test]
fn readers_never_see_wrong_entries_during_growth() {
    let m: Arc<RcuMap<Tagged>> = Arc::new(RcuMap::with_capacity(8));
    let n_readers = 4;
    let n_keys = 1_500;
    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(n_readers + 1));

    let mut readers = Vec::new();
    for t in 0..n_readers {
        let map = m.clone();
        let b = barrier.clone();
        let done = done.clone();
        readers.push(thread::spawn(move || {
            b.wait();
            let mut hits = 0usize;
            let mut i = t;
            while !done.load(Ordering::Acquire) {
                let raw = i % n_keys + 1;
                if let Some(v) = map.load(k(raw)) {
                    assert_eq!(v.key, raw, "value stored under another key");
                    assert_eq!(v.payload, raw as u64 * 7);
                    hits += 1;
                }
                i = i.wrapping_add(31);
            }
            hits
        }));
    }

    barrier.wait();
    for raw in 1..=n_keys {
        m.store(
            k(raw),
            Tagged {
                key: raw,
                payload: raw as u64 * 7,
            },
        );
        // Read-your-writes on the writer thread.
        assert_eq!(m.load(k(raw)).map(|v| v.key), Some(raw));
    }
    done.store(true, Ordering::Release);

    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(m.len(), n_keys);
    for raw in 1..=n_keys {
        assert_eq!(m.load(k(raw)).map(|v| v.payload), Some(raw as u64 * 7));
    }
}

#[test]
fn racing_load_or_store_agrees_on_one_value() {
    let m: Arc<RcuMap<usize>> = Arc::new(RcuMap::new());
    let n_threads = 8;
    let n_keys = 200;
    let barrier = Arc::new(Barrier::new(n_threads));
    let inserted = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for t in 0..n_threads {
        let map = m.clone();
        let b = barrier.clone();
        let inserted = inserted.clone();
        handles.push(thread::spawn(move || {
            b.wait();
            let mut seen = Vec::with_capacity(n_keys);
            for raw in 1..=n_keys {
                // Each thread offers its own candidate.
                let (v, loaded) = map.load_or_store(k(raw), t);
                if !loaded {
                    inserted.fetch_add(1, Ordering::Relaxed);
                }
                seen.push(v);
            }
            seen
        }));
    }

    let results: Vec<Vec<usize>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Exactly one insertion per key, and every thread saw the winner.
    assert_eq!(inserted.load(Ordering::Relaxed), n_keys);
    for raw in 1..=n_keys {
        let winner = m.load(k(raw)).expect("key present");
        for seen in &results {
            assert_eq!(seen[raw - 1], winner);
        }
    }
}

#[test]
fn load_or_store_with_runs_constructor_once_per_key() {
    let m: Arc<RcuMap<Arc<String>>> = Arc::new(RcuMap::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let n_threads = 6;
    let barrier = Arc::new(Barrier::new(n_threads));

    let mut handles = Vec::new();
    for _ in 0..n_threads {
        let map = m.clone();
        let calls = calls.clone();
        let b = barrier.clone();
        handles.push(thread::spawn(move || {
            b.wait();
            for raw in 1..=64usize {
                let (v, _) = map.load_or_store_with(k(raw), || {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Arc::new(format!("meta:{raw}"))
                });
                assert_eq!(*v, format!("meta:{raw}"));
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(calls.load(Ordering::Relaxed), 64);
    assert_eq!(m.len(), 64);
}

#[test]
fn concurrent_writers_serialize_without_losing_keys() {
    let m: Arc<RcuMap<u64>> = Arc::new(RcuMap::with_capacity(4));
    let n_threads = 4;
    let per_thread = 300;
    let barrier = Arc::new(Barrier::new(n_threads));

    let mut handles = Vec::new();
    for t in 0..n_threads {
        let map = m.clone();
        let b = barrier.clone();
        handles.push(thread::spawn(move || {
            b.wait();
            for i in 0..per_thread {
                let raw = t * per_thread + i + 1;
                map.store(k(raw), raw as u64);
                // Read-your-writes through a pinned snapshot.
                assert_eq!(map.snapshot().get(k(raw)), Some(&(raw as u64)));
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(m.len(), n_threads * per_thread);
    for raw in 1..=n_threads * per_thread {
        assert_eq!(m.load(k(raw)), Some(raw as u64));
    }
}
