use std::{
  cell::UnsafeCell,
  sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
  thread,
  time::Duration,
};

use aok::{OK, Void};
use log::info;
use pagemem_lock::{OffheapRwLock, TAG_LOCK_ALWAYS};

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

fn word(lock: &OffheapRwLock, tag: u16) -> AtomicU64 {
  let w = AtomicU64::new(0);
  lock.init(&w, tag);
  w
}

fn wait_until(f: impl Fn() -> bool) {
  while !f() {
    thread::sleep(Duration::from_millis(1));
  }
}

#[test]
fn test_init_tag() -> Void {
  let lock = OffheapRwLock::default();
  let w = word(&lock, 7);
  assert_eq!(OffheapRwLock::tag(&w), 7);
  assert!(!OffheapRwLock::is_write_locked(&w));
  assert_eq!(OffheapRwLock::read_holders(&w), 0);
  OK
}

#[test]
fn test_readers_share() -> Void {
  let lock = OffheapRwLock::new(4);
  let w = word(&lock, 1);
  assert!(lock.read_lock(&w, 1));
  assert!(lock.read_lock(&w, 1));
  assert_eq!(OffheapRwLock::read_holders(&w), 2);
  assert!(!lock.try_write_lock(&w, 1));
  lock.read_unlock(&w);
  lock.read_unlock(&w);
  assert!(lock.try_write_lock(&w, 1));
  assert!(OffheapRwLock::is_write_locked(&w));
  lock.write_unlock(&w, 1);
  OK
}

#[test]
fn test_try_write_contention() -> Void {
  let lock = OffheapRwLock::default();
  let w = word(&lock, 1);
  assert!(lock.write_lock(&w, 1));
  assert!(!lock.try_write_lock(&w, 1));
  assert!(!lock.try_write_lock(&w, TAG_LOCK_ALWAYS));
  lock.write_unlock(&w, 1);
  assert!(lock.try_write_lock(&w, TAG_LOCK_ALWAYS));
  lock.write_unlock(&w, 1);
  OK
}

#[test]
fn test_tag_mismatch_fails_fast() -> Void {
  let lock = OffheapRwLock::default();
  let w = word(&lock, 5);
  assert!(!lock.read_lock(&w, 4));
  assert!(!lock.write_lock(&w, 6));
  assert!(!lock.try_write_lock(&w, 6));
  assert!(lock.read_lock(&w, TAG_LOCK_ALWAYS));
  lock.read_unlock(&w);
  assert!(lock.write_lock(&w, TAG_LOCK_ALWAYS));
  lock.write_unlock(&w, 5);
  OK
}

#[test]
fn test_write_unlock_publishes_tag() -> Void {
  let lock = OffheapRwLock::default();
  let w = word(&lock, 1);
  assert!(lock.write_lock(&w, 1));
  lock.write_unlock(&w, 2);
  assert_eq!(OffheapRwLock::tag(&w), 2);
  assert!(!lock.read_lock(&w, 1));
  assert!(!lock.write_lock(&w, 1));
  assert!(lock.read_lock(&w, 2));
  lock.read_unlock(&w);
  OK
}

#[test]
#[should_panic(expected = "write unlock without write lock")]
fn test_write_unlock_unheld_is_fatal() {
  let lock = OffheapRwLock::default();
  let w = word(&lock, 1);
  lock.write_unlock(&w, 1);
}

#[test]
#[should_panic(expected = "read unlock without read lock")]
fn test_read_unlock_unheld_is_fatal() {
  let lock = OffheapRwLock::default();
  let w = word(&lock, 1);
  lock.read_unlock(&w);
}

struct Shared(UnsafeCell<u64>);
unsafe impl Sync for Shared {}

#[test]
fn test_writers_serialize() -> Void {
  const THREADS: usize = 8;
  const ROUNDS: usize = 2000;

  let lock = OffheapRwLock::new(2);
  let w = word(&lock, 3);
  let inside = AtomicBool::new(false);
  let counter = Shared(UnsafeCell::new(0));

  thread::scope(|s| {
    for _ in 0..THREADS {
      s.spawn(|| {
        let counter = &counter;
        for _ in 0..ROUNDS {
          assert!(lock.write_lock(&w, 3));
          assert!(!inside.swap(true, Ordering::AcqRel), "writers overlapped");
          unsafe { *counter.0.get() += 1 };
          inside.store(false, Ordering::Release);
          lock.write_unlock(&w, 3);
        }
      });
    }
  });

  assert_eq!(unsafe { *counter.0.get() }, (THREADS * ROUNDS) as u64);
  OK
}

#[test]
fn test_readers_and_writers_exclude() -> Void {
  let lock = OffheapRwLock::default();
  let w = word(&lock, 9);
  let readers = AtomicUsize::new(0);
  let writer = AtomicBool::new(false);

  thread::scope(|s| {
    for i in 0..6 {
      let (lock, w, readers, writer) = (&lock, &w, &readers, &writer);
      s.spawn(move || {
        for _ in 0..1000 {
          if i % 3 == 0 {
            assert!(lock.write_lock(w, 9));
            writer.store(true, Ordering::SeqCst);
            assert_eq!(readers.load(Ordering::SeqCst), 0);
            writer.store(false, Ordering::SeqCst);
            lock.write_unlock(w, 9);
          } else {
            assert!(lock.read_lock(w, 9));
            readers.fetch_add(1, Ordering::SeqCst);
            assert!(!writer.load(Ordering::SeqCst));
            readers.fetch_sub(1, Ordering::SeqCst);
            lock.read_unlock(w);
          }
        }
      });
    }
  });
  OK
}

#[test]
fn test_waiting_writer_blocks_new_readers() -> Void {
  let lock = OffheapRwLock::default();
  let w = word(&lock, 1);
  let reader_in = AtomicBool::new(false);
  let writer_done = AtomicBool::new(false);

  assert!(lock.read_lock(&w, 1));

  thread::scope(|s| {
    s.spawn(|| {
      assert!(lock.write_lock(&w, 1));
      writer_done.store(true, Ordering::SeqCst);
      lock.write_unlock(&w, 1);
    });

    wait_until(|| OffheapRwLock::has_waiting_writer(&w));

    s.spawn(|| {
      assert!(lock.read_lock(&w, 1));
      // Writer flagged intent first, so it must have run before us
      assert!(writer_done.load(Ordering::SeqCst));
      reader_in.store(true, Ordering::SeqCst);
      lock.read_unlock(&w);
    });

    thread::sleep(Duration::from_millis(50));
    assert!(!reader_in.load(Ordering::SeqCst));
    assert!(!writer_done.load(Ordering::SeqCst));

    lock.read_unlock(&w);
  });

  assert!(writer_done.load(Ordering::SeqCst));
  assert!(reader_in.load(Ordering::SeqCst));
  OK
}

#[test]
fn test_blocked_writer_fails_after_rotation() -> Void {
  let lock = OffheapRwLock::default();
  let w = word(&lock, 1);

  assert!(lock.write_lock(&w, 1));

  thread::scope(|s| {
    let stale = s.spawn(|| lock.write_lock(&w, 1));
    let reader = s.spawn(|| lock.read_lock(&w, 1));

    thread::sleep(Duration::from_millis(30));
    lock.write_unlock(&w, 2);

    assert!(!stale.join().unwrap());
    assert!(!reader.join().unwrap());
  });

  // Nothing left behind: a fresh reader with the new tag gets in
  assert!(lock.read_lock(&w, 2));
  lock.read_unlock(&w);
  assert!(!OffheapRwLock::has_waiting_writer(&w));
  info!("rotation rejected stale waiters");
  OK
}
