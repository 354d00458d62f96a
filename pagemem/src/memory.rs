//! Page memory manager 页内存管理器

use std::{
  ptr::NonNull,
  sync::{
    OnceLock,
    atomic::{
      AtomicUsize,
      Ordering::{AcqRel, Acquire, Relaxed, Release},
    },
  },
};

use log::{debug, error, info, warn};
use pagemem_alloc::{PageBuf, wrap_pointer};
use pagemem_id::{PageId, TAG_LOCK_ALWAYS};
use pagemem_io::set_page_id;
use pagemem_lock::OffheapRwLock;
use parking_lot::Mutex;

use crate::{
  Config, Error, Page, Result,
  consts::{ALLOCATED_BIT, FIRST_TAG, PAGE_OVERHEAD, PIN_MASK, ROTATED_BIT},
  segment::{Segment, Slot},
};

/// Off-heap page memory without backing store
/// 无持久化存储的堆外页内存
///
/// Segments are appended on demand up to `max_segments` and never move, so a
/// slot address stays valid for the lifetime of the manager.
/// 段按需追加至 `max_segments`，地址不变，槽位地址在管理器存活期间有效。
pub struct PageMemory {
  cfg: Config,
  slots_per_seg: usize,
  segs: Box<[OnceLock<Segment>]>,
  /// Published segments 已发布段数
  seg_cnt: AtomicUsize,
  grow: Mutex<()>,
  allocated: AtomicUsize,
  pub(crate) lock: OffheapRwLock,
}

impl PageMemory {
  /// Create manager with its first segment / 创建管理器及首个段
  pub fn new(cfg: Config) -> Result<Self> {
    cfg.validate()?;
    let slots_per_seg = cfg.slots_per_segment();
    let first = Segment::new(0, slots_per_seg, cfg.slot_size())?;

    let segs: Box<[OnceLock<Segment>]> = (0..cfg.max_segments).map(|_| OnceLock::new()).collect();
    let _ = segs[0].set(first);

    info!(
      "page memory: page {} B, {} slots/segment, max {} segments",
      cfg.page_size, slots_per_seg, cfg.max_segments
    );

    Ok(Self {
      cfg,
      slots_per_seg,
      segs,
      seg_cnt: AtomicUsize::new(1),
      grow: Mutex::new(()),
      allocated: AtomicUsize::new(0),
      lock: OffheapRwLock::new(cfg.lock_stripes),
    })
  }

  #[inline]
  pub fn config(&self) -> &Config {
    &self.cfg
  }

  /// Page body size / 页体大小
  #[inline]
  pub fn page_size(&self) -> usize {
    self.cfg.page_size
  }

  /// Slot size including the system header / 含系统页头的槽位大小
  #[inline]
  pub fn system_page_size(&self) -> usize {
    self.cfg.page_size + PAGE_OVERHEAD
  }

  /// Segments in use / 已用段数
  #[inline]
  pub fn segments(&self) -> usize {
    self.seg_cnt.load(Acquire)
  }

  /// Pages allocated and not freed / 已分配且未释放的页数
  #[inline]
  pub fn allocated_pages(&self) -> usize {
    self.allocated.load(Relaxed)
  }

  /// Recycled slots waiting for reuse / 等待复用的回收槽位数
  pub fn free_slots(&self) -> usize {
    self.published().map(Segment::free_len).sum()
  }

  /// Pin count of the slot addressed by `page_id` / 页所在槽位的固定计数
  pub fn pinned(&self, page_id: PageId) -> Option<u32> {
    let (_, slot) = self.locate(page_id)?;
    Some(slot.state().load(Acquire) & PIN_MASK)
  }

  /// Zero-copy little-endian view over off-heap memory
  /// 堆外内存的零拷贝小端视图
  ///
  /// # Safety
  /// `ptr..ptr+len` must lie inside this manager's segments and the caller
  /// must hold the page lock covering it.
  #[inline]
  pub unsafe fn wrap_pointer(&self, ptr: NonNull<u8>, len: usize) -> PageBuf<'_> {
    unsafe { wrap_pointer(ptr, len) }
  }

  fn published(&self) -> impl Iterator<Item = &Segment> {
    self.segs[..self.segments()].iter().filter_map(OnceLock::get)
  }

  fn segment(&self, seg_idx: usize) -> Option<&Segment> {
    if seg_idx < self.segments() {
      self.segs[seg_idx].get()
    } else {
      None
    }
  }

  pub(crate) fn locate(&self, page_id: PageId) -> Option<(usize, Slot<'_>)> {
    let idx = page_id.page_index();
    let seg_idx = idx as usize / self.slots_per_seg;
    self.segment(seg_idx).map(|seg| (seg_idx, seg.slot(idx)))
  }

  /// Hand out a page and mint its id / 分配一页并生成页 ID
  ///
  /// A never-used slot starts at tag 1; a recycled slot keeps the tag its last
  /// free rotated to, so ids of the previous incarnation stay invalid.
  /// 新槽位标签为 1；回收槽位沿用释放时轮转后的标签，旧 ID 持续失效。
  pub fn allocate_page(&self, cache_id: u32, partition: u16, flag: u8) -> Result<PageId> {
    let (seg, idx) = self.take_slot()?;
    let slot = seg.slot(idx);

    let prev = PageId(slot.page_id().load(Acquire));
    let tag = if prev.is_zero() { FIRST_TAG } else { prev.tag() };
    let id = PageId::new(partition, flag, idx).with_tag(tag);

    // Stale handles may still lock this slot until the new tag is out
    if !self.lock.write_lock(slot.lock(), TAG_LOCK_ALWAYS) {
      fatal("allocate: write lock refused", id);
    }
    // SAFETY: write lock held
    let mut body = unsafe { slot.body() };
    body.fill(0, body.len(), 0);
    set_page_id(&mut body, id);
    slot.page_id().store(id.0, Release);
    slot.cache_id().store(cache_id, Release);
    slot.state().fetch_or(ALLOCATED_BIT, AcqRel);
    self.lock.write_unlock(slot.lock(), id.tag());

    self.allocated.fetch_add(1, Relaxed);
    Ok(id)
  }

  /// Recycled slot first, then a never-used one, then a new segment
  fn take_slot(&self) -> Result<(&Segment, u32)> {
    if let Some(hit) = self
      .published()
      .find_map(|seg| seg.pop_free().map(|idx| (seg, idx)))
    {
      return Ok(hit);
    }

    loop {
      let cnt = self.segments();
      if let Some(seg) = self.segment(cnt - 1)
        && let Some(idx) = seg.bump()
      {
        return Ok((seg, idx));
      }

      let _guard = self.grow.lock();
      if self.segments() != cnt {
        continue;
      }
      if cnt == self.cfg.max_segments {
        warn!("page memory exhausted: {cnt} segments");
        return Err(Error::OutOfMemory {
          segments: cnt,
          max: self.cfg.max_segments,
        });
      }
      let seg = Segment::new(cnt, self.slots_per_seg, self.cfg.slot_size())?;
      let _ = self.segs[cnt].set(seg);
      self.seg_cnt.store(cnt + 1, Release);
    }
  }

  /// Pin the slot of `page_id` and return a handle
  /// 固定 `page_id` 所在槽位并返回句柄
  ///
  /// `restore_mode` skips the allocation and cache checks and makes the
  /// handle's write acquisitions ignore the tag.
  /// `restore_mode` 跳过分配与缓存校验，句柄写锁不校验标签。
  pub fn acquire_page(&self, cache_id: u32, page_id: PageId, restore_mode: bool) -> Result<Page<'_>> {
    let (seg_idx, slot) = self.locate(page_id).ok_or(Error::PageNotFound(page_id))?;

    let state = slot.state();
    let mut s = state.load(Acquire);
    loop {
      if !restore_mode && s & ALLOCATED_BIT == 0 {
        return Err(Error::PageNotAllocated(page_id));
      }
      if s & PIN_MASK == PIN_MASK {
        fatal("pin count overflow", page_id);
      }
      match state.compare_exchange_weak(s, s + 1, AcqRel, Acquire) {
        Ok(_) => break,
        Err(cur) => s = cur,
      }
    }

    if !restore_mode {
      let actual = slot.cache_id().load(Acquire);
      if actual != cache_id {
        self.unpin(page_id);
        return Err(Error::CacheMismatch {
          page_id,
          expected: cache_id,
          actual,
        });
      }
    }

    Ok(Page::new(self, seg_idx, slot, cache_id, page_id, restore_mode))
  }

  /// Close `page`, unpinning its slot / 关闭句柄并取消固定
  #[inline]
  pub fn release_page(&self, page: Page<'_>) {
    debug_assert!(std::ptr::eq(page.memory(), self));
    page.close();
  }

  /// Drop one pin; the last unpin of a freed slot recycles it
  /// 取消一次固定；已释放槽位的最后一次取消固定将其回收
  pub(crate) fn unpin(&self, page_id: PageId) {
    let Some((seg_idx, slot)) = self.locate(page_id) else {
      return;
    };
    let state = slot.state();
    let mut s = state.load(Acquire);
    loop {
      let pins = s & PIN_MASK;
      if pins == 0 {
        fatal("unpin of unpinned page", page_id);
      }
      let recycle = pins == 1 && s & ROTATED_BIT != 0;
      let next = if recycle { (s - 1) & !ROTATED_BIT } else { s - 1 };
      match state.compare_exchange_weak(s, next, AcqRel, Acquire) {
        Ok(_) => {
          if recycle {
            self.recycle(seg_idx, page_id.page_index());
          }
          return;
        }
        Err(cur) => s = cur,
      }
    }
  }

  fn recycle(&self, seg_idx: usize, idx: u32) {
    if let Some(seg) = self.segment(seg_idx) {
      seg.push_free(idx);
      debug!("slot {idx} recycled to segment {seg_idx}");
    }
  }

  /// Free an allocated page: rotate its id so every handle minted against it
  /// fails, then recycle the slot once nothing pins it. Returns `false` when
  /// the page was already freed or belongs to another cache.
  /// 释放已分配页：轮转页 ID 使旧句柄全部失效，无固定后回收槽位。
  /// 页已被释放或属于其他缓存时返回 `false`。
  ///
  /// The caller must not hold a lock on this page.
  pub fn free_page(&self, cache_id: u32, page_id: PageId) -> bool {
    let Some((seg_idx, slot)) = self.locate(page_id) else {
      return false;
    };

    if !self.lock.write_lock(slot.lock(), TAG_LOCK_ALWAYS) {
      fatal("free: write lock refused", page_id);
    }
    let cur = PageId(slot.page_id().load(Acquire));
    let live = slot.state().load(Acquire) & ALLOCATED_BIT != 0;
    if !live || cur != page_id || slot.cache_id().load(Acquire) != cache_id {
      self.lock.write_unlock(slot.lock(), cur.tag());
      return false;
    }

    let rotated = page_id.rotate();
    // SAFETY: write lock held
    let mut body = unsafe { slot.body() };
    set_page_id(&mut body, rotated);
    slot.page_id().store(rotated.0, Release);
    self.lock.write_unlock(slot.lock(), rotated.tag());

    let state = slot.state();
    let mut s = state.load(Acquire);
    loop {
      let idle = s & PIN_MASK == 0;
      let next = if idle {
        s & !ALLOCATED_BIT
      } else {
        (s & !ALLOCATED_BIT) | ROTATED_BIT
      };
      match state.compare_exchange_weak(s, next, AcqRel, Acquire) {
        Ok(_) => {
          if idle {
            self.recycle(seg_idx, page_id.page_index());
          }
          break;
        }
        Err(cur) => s = cur,
      }
    }

    self.allocated.fetch_sub(1, Relaxed);
    true
  }
}

#[cold]
#[inline(never)]
pub(crate) fn fatal(msg: &str, page_id: PageId) -> ! {
  error!("{msg}: page {page_id}");
  panic!("{msg}: page {page_id}");
}
