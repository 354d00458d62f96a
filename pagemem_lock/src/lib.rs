#![cfg_attr(docsrs, feature(doc_cfg))]

//! # pagemem_lock - Tagged reader/writer lock over a 64-bit word
//! 基于 64 位字的带标签读写锁
//!
//! Each page slot carries one `AtomicU64` holding reader count, writer flags
//! and the 16-bit tag of the slot's current incarnation. Acquisition fails
//! fast when the tag no longer matches, so handles to a rotated page cannot
//! lock it. Blocked threads spin, then park on a striped condvar.
//! 每个页槽位持有一个 `AtomicU64`，包含读者数、写者标志与当前标签。
//! 标签不匹配时立即失败，轮转后的旧句柄无法加锁。阻塞线程先自旋后挂起。

mod word;

use std::{
  hint,
  sync::atomic::{AtomicU64, AtomicUsize, Ordering::*},
  thread,
};

use log::error;
pub use pagemem_id::TAG_LOCK_ALWAYS;
use parking_lot::{Condvar, Mutex};
use word::{READERS_MASK, WAITING, WRITER, read_free, readers, tag_ok, with_tag, write_free};

/// Default number of parking stripes / 默认挂起分段数
pub const DEFAULT_STRIPES: usize = 64;

const SPINS: u32 = 64;
const YIELDS: u32 = SPINS + 16;

/// Parking slot shared by all words hashing to it
/// 哈希到同一分段的锁字共享的挂起槽
#[derive(Default)]
struct Stripe {
  mu: Mutex<()>,
  cv: Condvar,
  waiters: AtomicUsize,
}

/// Off-heap reader/writer lock / 堆外读写锁
///
/// Writers have preference once they flag intent.
/// 写者一旦标记意图即获得优先。
pub struct OffheapRwLock {
  stripes: Box<[Stripe]>,
  mask: usize,
}

impl Default for OffheapRwLock {
  fn default() -> Self {
    Self::new(DEFAULT_STRIPES)
  }
}

#[cold]
#[inline(never)]
fn fatal(msg: &str, s: u64) -> ! {
  error!("{msg}: lock word 0x{s:016x}");
  panic!("{msg}: lock word 0x{s:016x}");
}

impl OffheapRwLock {
  /// `stripes` must be a power of two / `stripes` 必须为 2 的幂
  pub fn new(stripes: usize) -> Self {
    assert!(stripes.is_power_of_two(), "stripes must be power of two");
    Self {
      stripes: (0..stripes).map(|_| Stripe::default()).collect(),
      mask: stripes - 1,
    }
  }

  #[inline]
  fn stripe(&self, lock: &AtomicU64) -> &Stripe {
    let a = (lock as *const AtomicU64 as usize) >> 3;
    &self.stripes[(a ^ (a >> 9)) & self.mask]
  }

  /// Reset word: unlocked, carrying `tag` / 重置锁字：未加锁，携带 `tag`
  #[inline]
  pub fn init(&self, lock: &AtomicU64, tag: u16) {
    lock.store(with_tag(0, tag), Release);
  }

  /// Current tag / 当前标签
  #[inline]
  pub fn tag(lock: &AtomicU64) -> u16 {
    word::tag(lock.load(Acquire))
  }

  #[inline]
  pub fn is_write_locked(lock: &AtomicU64) -> bool {
    lock.load(Acquire) & WRITER != 0
  }

  #[inline]
  pub fn has_waiting_writer(lock: &AtomicU64) -> bool {
    lock.load(Acquire) & WAITING != 0
  }

  #[inline]
  pub fn read_holders(lock: &AtomicU64) -> u16 {
    readers(lock.load(Acquire)) as u16
  }

  /// Shared lock, `false` on tag mismatch / 共享锁，标签不匹配返回 `false`
  pub fn read_lock(&self, lock: &AtomicU64, tag: u16) -> bool {
    let mut spins = 0;
    loop {
      let s = lock.load(Acquire);
      if !tag_ok(s, tag) {
        return false;
      }
      if read_free(s) {
        if readers(s) == READERS_MASK {
          fatal("too many readers", s);
        }
        if lock
          .compare_exchange_weak(s, s + 1, SeqCst, Relaxed)
          .is_ok()
        {
          return true;
        }
        continue;
      }
      self.pause(lock, &mut spins, |s| tag_ok(s, tag) && !read_free(s));
    }
  }

  pub fn read_unlock(&self, lock: &AtomicU64) {
    let mut s = lock.load(Acquire);
    loop {
      if readers(s) == 0 {
        fatal("read unlock without read lock", s);
      }
      match lock.compare_exchange_weak(s, s - 1, SeqCst, Acquire) {
        Ok(_) => break,
        Err(cur) => s = cur,
      }
    }
    // Last reader out lets a waiting writer in
    if readers(s) == 1 {
      self.wake(lock);
    }
  }

  /// Exclusive lock, `false` only on tag mismatch
  /// 排他锁，仅在标签不匹配时返回 `false`
  pub fn write_lock(&self, lock: &AtomicU64, tag: u16) -> bool {
    let mut spins = 0;
    loop {
      let s = lock.load(Acquire);
      if !tag_ok(s, tag) {
        if s & WAITING != 0 {
          self.withdraw(lock);
        }
        return false;
      }
      if write_free(s) {
        if lock
          .compare_exchange_weak(s, (s | WRITER) & !WAITING, SeqCst, Relaxed)
          .is_ok()
        {
          return true;
        }
        continue;
      }
      if s & WAITING == 0 {
        let _ = lock.compare_exchange_weak(s, s | WAITING, SeqCst, Relaxed);
        continue;
      }
      self.pause(lock, &mut spins, |s| tag_ok(s, tag) && !write_free(s));
    }
  }

  /// Single attempt, `false` on contention or tag mismatch
  /// 单次尝试，竞争或标签不匹配返回 `false`
  pub fn try_write_lock(&self, lock: &AtomicU64, tag: u16) -> bool {
    let s = lock.load(Acquire);
    tag_ok(s, tag)
      && write_free(s)
      && lock
        .compare_exchange(s, s | WRITER, SeqCst, Relaxed)
        .is_ok()
  }

  /// Release exclusive lock and publish `new_tag` atomically
  /// 释放排他锁并原子发布 `new_tag`
  pub fn write_unlock(&self, lock: &AtomicU64, new_tag: u16) {
    let mut s = lock.load(Acquire);
    loop {
      if s & WRITER == 0 {
        fatal("write unlock without write lock", s);
      }
      match lock.compare_exchange_weak(s, with_tag(s & !WRITER, new_tag), SeqCst, Acquire) {
        Ok(_) => break,
        Err(cur) => s = cur,
      }
    }
    self.wake(lock);
  }

  /// Clear writer intent left behind by a stale writer; live writers set it again
  /// 清除过期写者遗留的写意图，存活写者会重新设置
  fn withdraw(&self, lock: &AtomicU64) {
    let _ = lock.fetch_and(!WAITING, SeqCst);
    self.wake(lock);
  }

  /// Spin, yield, then park while `blocked` holds
  /// 在 `blocked` 成立时先自旋、让出，再挂起
  fn pause(&self, lock: &AtomicU64, spins: &mut u32, blocked: impl Fn(u64) -> bool) {
    if *spins < SPINS {
      *spins += 1;
      hint::spin_loop();
      return;
    }
    if *spins < YIELDS {
      *spins += 1;
      thread::yield_now();
      return;
    }

    let st = self.stripe(lock);
    let mut guard = st.mu.lock();
    st.waiters.fetch_add(1, SeqCst);
    // Re-check under the stripe mutex; a waker changes the word before locking it
    if blocked(lock.load(SeqCst)) {
      st.cv.wait(&mut guard);
    }
    st.waiters.fetch_sub(1, SeqCst);
  }

  #[inline]
  fn wake(&self, lock: &AtomicU64) {
    let st = self.stripe(lock);
    if st.waiters.load(SeqCst) > 0 {
      let _guard = st.mu.lock();
      st.cv.notify_all();
    }
  }
}
