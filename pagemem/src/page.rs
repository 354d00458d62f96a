//! Page handle 页句柄

use std::{cell::Cell, fmt, ops::Deref, ptr::NonNull, sync::atomic::Ordering::Release, thread};

use log::error;
use pagemem_alloc::{PageBuf, ReadBuf};
use pagemem_id::{FullPageId, PageId, TAG_LOCK_ALWAYS};
use pagemem_io::get_page_id;

use crate::{PageMemory, memory::fatal, segment::Slot};

/// Pinned page handle, borrows its manager
/// 已固定的页句柄，借用其管理器
///
/// Pinning keeps the slot resident; reading or writing the body additionally
/// needs the matching lock. View accessors hand out guards that unlock on
/// drop, so a view cannot outlive its lock. Pointer accessors lock without a
/// guard and must be paired with `release_read` / `release_write` before the
/// handle is closed or dropped.
/// 固定只保证槽位驻留；读写页体需另行加锁。视图接口返回守卫，丢弃即解锁，
/// 视图不会比锁活得久。指针接口不带守卫，须在关闭或丢弃前配对释放。
pub struct Page<'a> {
  mem: &'a PageMemory,
  slot: Slot<'a>,
  seg_idx: usize,
  cache_id: u32,
  page_id: PageId,
  no_tag_check: bool,
  /// Pointer read locks held 指针读锁数
  reads: Cell<u32>,
  /// Pointer write lock held 指针写锁
  write: Cell<bool>,
}

impl<'a> Page<'a> {
  pub(crate) fn new(
    mem: &'a PageMemory,
    seg_idx: usize,
    slot: Slot<'a>,
    cache_id: u32,
    page_id: PageId,
    no_tag_check: bool,
  ) -> Self {
    Self {
      mem,
      slot,
      seg_idx,
      cache_id,
      page_id,
      no_tag_check,
      reads: Cell::new(0),
      write: Cell::new(false),
    }
  }

  #[inline]
  pub fn id(&self) -> PageId {
    self.page_id
  }

  #[inline]
  pub fn full_id(&self) -> FullPageId {
    FullPageId::new(self.cache_id, self.page_id)
  }

  /// Page body size / 页体大小
  #[inline]
  pub fn size(&self) -> usize {
    self.mem.page_size()
  }

  #[inline]
  pub fn memory(&self) -> &'a PageMemory {
    self.mem
  }

  #[inline]
  pub fn segment_index(&self) -> usize {
    self.seg_idx
  }

  /// Start of the system header / 系统页头起始地址
  #[inline]
  pub fn absolute_pointer(&self) -> NonNull<u8> {
    self.slot.abs_ptr()
  }

  /// Body view without locking / 不加锁的页体视图
  ///
  /// # Safety
  /// Caller must hold a lock on this page for as long as the view lives and
  /// must not write through the view under a read lock.
  #[inline]
  pub unsafe fn page_buffer(&self) -> PageBuf<'_> {
    unsafe { self.slot.body() }
  }

  #[inline]
  fn write_tag(&self) -> u16 {
    if self.no_tag_check {
      TAG_LOCK_ALWAYS
    } else {
      self.page_id.tag()
    }
  }

  fn lock_read(&self) -> bool {
    // Own writer would block the reader forever
    if self.write.get() {
      fatal("read lock while write lock held by handle", self.page_id);
    }
    self.mem.lock.read_lock(self.slot.lock(), self.page_id.tag())
  }

  /// Shared access, `None` once the page was rotated. Unlocks on drop.
  /// 共享访问，页已轮转时返回 `None`。丢弃即解锁。
  pub fn get_for_read(&self) -> Option<ReadGuard<'_>> {
    self.lock_read().then(|| ReadGuard {
      page: self,
      buf: unsafe { self.slot.body() }.into_read(),
    })
  }

  /// Pair with `release_read` / 须配对调用 `release_read`
  pub fn get_for_read_pointer(&self) -> Option<NonNull<u8>> {
    if !self.lock_read() {
      return None;
    }
    self.reads.set(self.reads.get() + 1);
    Some(self.slot.body_ptr())
  }

  /// Release a lock taken by `get_for_read_pointer`
  /// 释放 `get_for_read_pointer` 获取的读锁
  pub fn release_read(&self) {
    let n = self.reads.get();
    if n == 0 {
      fatal("release read without read lock", self.page_id);
    }
    self.mem.lock.read_unlock(self.slot.lock());
    self.reads.set(n - 1);
  }

  fn lock_write(&self, blocking: bool) -> bool {
    if self.write.get() {
      fatal("write lock already held by handle", self.page_id);
    }
    if self.reads.get() > 0 {
      fatal("write lock while read lock held by handle", self.page_id);
    }
    let (lock, tag) = (self.slot.lock(), self.write_tag());
    let locked = if blocking {
      self.mem.lock.write_lock(lock, tag)
    } else {
      self.mem.lock.try_write_lock(lock, tag)
    };
    if !locked && blocking && self.no_tag_check {
      fatal("write lock failed without tag check", self.page_id);
    }
    locked
  }

  fn write_guard(&self) -> WriteGuard<'_> {
    WriteGuard {
      page: self,
      buf: unsafe { self.slot.body() },
    }
  }

  fn write_pointer(&self) -> NonNull<u8> {
    self.write.set(true);
    self.slot.body_ptr()
  }

  /// Exclusive access, `None` on tag mismatch. Unlocks on drop.
  /// 排他访问，标签不匹配返回 `None`。丢弃即解锁。
  pub fn get_for_write(&mut self) -> Option<WriteGuard<'_>> {
    self.lock_write(true).then(|| self.write_guard())
  }

  /// Pair with `release_write` / 须配对调用 `release_write`
  pub fn get_for_write_pointer(&mut self) -> Option<NonNull<u8>> {
    self.lock_write(true).then(|| self.write_pointer())
  }

  /// Non-blocking, `None` on contention too / 非阻塞，竞争时也返回 `None`
  pub fn try_get_for_write(&mut self) -> Option<WriteGuard<'_>> {
    self.lock_write(false).then(|| self.write_guard())
  }

  pub fn try_get_for_write_pointer(&mut self) -> Option<NonNull<u8>> {
    self.lock_write(false).then(|| self.write_pointer())
  }

  /// Release a lock taken by a write pointer accessor, publishing the tag of
  /// the page id now in the body. `mark_dirty` has no effect without a
  /// backing store.
  /// 释放写指针接口获取的写锁，发布页体中当前页 ID 的标签。无持久化时
  /// `mark_dirty` 无效。
  pub fn release_write(&self, mark_dirty: bool) {
    let _ = mark_dirty;
    if !self.write.get() {
      fatal("release write without write lock", self.page_id);
    }
    self.unlock_write();
    self.write.set(false);
  }

  /// Caller holds the write lock / 调用方持有写锁
  fn unlock_write(&self) {
    let updated = get_page_id(&unsafe { self.slot.body() });
    self.slot.page_id().store(updated.0, Release);
    self.mem.lock.write_unlock(self.slot.lock(), updated.tag());
  }

  /// Always `false`, nothing is written back / 始终为 `false`，无回写
  #[inline]
  pub fn is_dirty(&self) -> bool {
    false
  }

  /// Vestigial hook for stores that log full pages, always `None` here
  #[inline]
  pub fn full_page_wal_record_policy(&self) -> Option<bool> {
    None
  }

  #[inline]
  pub fn set_full_page_wal_record_policy(&self, plc: Option<bool>) {
    let _ = plc;
  }

  /// Unpin / 取消固定
  #[inline]
  pub fn close(self) {}
}

impl Drop for Page<'_> {
  fn drop(&mut self) {
    let (reads, write) = (self.reads.get(), self.write.get());
    let held = reads > 0 || write;
    if held {
      error!("{self} closed holding {reads} read locks, write lock {write}");
      for _ in 0..reads {
        self.mem.lock.read_unlock(self.slot.lock());
      }
      if write {
        self.unlock_write();
      }
      self.reads.set(0);
      self.write.set(false);
    }
    self.mem.unpin(self.page_id);
    if held && !thread::panicking() {
      panic!("page {} closed with locks held", self.page_id);
    }
  }
}

impl fmt::Display for Page<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Page [absPtr={:p}, segIdx={}, cacheId={}, pageId=0x{:x}]",
      self.slot.abs_ptr(),
      self.seg_idx,
      self.cache_id,
      self.page_id.0
    )
  }
}

impl fmt::Debug for Page<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(self, f)
  }
}

/// Shared lock on a page body, released on drop
/// 页体共享锁，丢弃即释放
///
/// The view borrows the guard, so it cannot be used after the release:
///
/// ```compile_fail
/// use pagemem::{Config, PageMemory};
///
/// let pm = PageMemory::new(Config::default()).unwrap();
/// let id = pm.allocate_page(1, 0, 0).unwrap();
/// let page = pm.acquire_page(1, id, false).unwrap();
/// let guard = page.get_for_read().unwrap();
/// let buf: &pagemem_alloc::PageBuf<'_> = &guard;
/// guard.release();
/// buf.get_u64(100);
/// ```
pub struct ReadGuard<'p> {
  page: &'p Page<'p>,
  buf: ReadBuf<'p>,
}

impl ReadGuard<'_> {
  #[inline]
  pub fn release(self) {}
}

impl<'p> Deref for ReadGuard<'p> {
  type Target = PageBuf<'p>;

  #[inline(always)]
  fn deref(&self) -> &PageBuf<'p> {
    &self.buf
  }
}

impl Drop for ReadGuard<'_> {
  fn drop(&mut self) {
    let page = self.page;
    page.mem.lock.read_unlock(page.slot.lock());
  }
}

impl fmt::Debug for ReadGuard<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ReadGuard({})", self.page)
  }
}

/// Exclusive lock on a page body. Dropping it publishes the tag of the page
/// id found in the body, like `Page::release_write`.
/// 页体排他锁。丢弃时发布页体中页 ID 的标签，同 `Page::release_write`。
///
/// A handle holds at most one, and views from `buf_mut` end with the guard:
///
/// ```compile_fail
/// use pagemem::{Config, PageMemory};
///
/// let pm = PageMemory::new(Config::default()).unwrap();
/// let id = pm.allocate_page(1, 0, 0).unwrap();
/// let mut page = pm.acquire_page(1, id, false).unwrap();
/// let mut guard = page.get_for_write().unwrap();
/// let mut buf = guard.buf_mut();
/// guard.release(true);
/// buf.put_u64(100, 0xdead);
/// ```
///
/// ```compile_fail
/// use pagemem::{Config, PageMemory};
///
/// let pm = PageMemory::new(Config::default()).unwrap();
/// let id = pm.allocate_page(1, 0, 0).unwrap();
/// let mut page = pm.acquire_page(1, id, false).unwrap();
/// let a = page.get_for_write().unwrap();
/// let b = page.get_for_write().unwrap();
/// drop((a, b));
/// ```
pub struct WriteGuard<'p> {
  page: &'p Page<'p>,
  buf: PageBuf<'p>,
}

impl WriteGuard<'_> {
  /// Writable view bound to this guard / 绑定本守卫的可写视图
  #[inline]
  pub fn buf_mut(&mut self) -> PageBuf<'_> {
    self.buf.reborrow()
  }

  /// `mark_dirty` has no effect without a backing store
  /// 无持久化时 `mark_dirty` 无效
  #[inline]
  pub fn release(self, mark_dirty: bool) {
    let _ = mark_dirty;
  }
}

impl<'p> Deref for WriteGuard<'p> {
  type Target = PageBuf<'p>;

  #[inline(always)]
  fn deref(&self) -> &PageBuf<'p> {
    &self.buf
  }
}

impl Drop for WriteGuard<'_> {
  fn drop(&mut self) {
    self.page.unlock_write();
  }
}

impl fmt::Debug for WriteGuard<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "WriteGuard({})", self.page)
  }
}
