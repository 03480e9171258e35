//! Borrowed references to caller-owned I/O memory.
//!
//! A read or write request does not own its buffer. The worker thread
//! reads from (`BufferRef`) or writes into (`BufferMut`) memory the caller
//! keeps alive until the request's completion callback has run.
//!
//! ```text
//!   BufferMut::from_mut_slice(&mut buf) ──▶ submit ──▶ worker writes ──▶ callback
//!   |◀──────────── caller must not touch or free `buf` ──────────────▶|
//! ```
//!
//! Both types are `Copy` and carry no lifetime, so the borrow is enforced
//! by the `unsafe` constructors' contract rather than the borrow checker.

use std::fmt;

/// Read-only reference to caller memory: the source of a write request.
#[derive(Clone, Copy)]
pub struct BufferRef {
    ptr: *const u8,
    len: usize,
}

// Safety: the constructor contract hands exclusive use of the memory to
// the request until completion; the pointer may cross to a worker thread.
unsafe impl Send for BufferRef {}

impl BufferRef {
    /// Reference `data` for the duration of one request.
    ///
    /// # Safety
    ///
    /// `data` must stay valid and must not be mutated until the completion
    /// callback of the request it is submitted with has returned.
    #[inline]
    pub unsafe fn from_slice(data: &[u8]) -> Self {
        Self { ptr: data.as_ptr(), len: data.len() }
    }

    /// Reference `len` bytes starting at `ptr`.
    ///
    /// # Safety
    ///
    /// Same contract as [`from_slice`](Self::from_slice); `ptr` must be
    /// readable for `len` bytes.
    #[inline]
    pub unsafe fn from_raw(ptr: *const u8, len: usize) -> Self {
        Self { ptr, len }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for BufferRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferRef")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

/// Writable reference to caller memory: the target of a read request.
#[derive(Clone, Copy)]
pub struct BufferMut {
    ptr: *mut u8,
    len: usize,
}

// Safety: see BufferRef.
unsafe impl Send for BufferMut {}

impl BufferMut {
    /// Reference `data` as a read target for the duration of one request.
    ///
    /// # Safety
    ///
    /// `data` must stay valid, and must be neither read nor written by
    /// anyone else, until the completion callback of the request it is
    /// submitted with has returned.
    #[inline]
    pub unsafe fn from_mut_slice(data: &mut [u8]) -> Self {
        Self { ptr: data.as_mut_ptr(), len: data.len() }
    }

    /// Reference `len` bytes starting at `ptr`.
    ///
    /// # Safety
    ///
    /// Same contract as [`from_mut_slice`](Self::from_mut_slice); `ptr`
    /// must be writable for `len` bytes.
    #[inline]
    pub unsafe fn from_raw(ptr: *mut u8, len: usize) -> Self {
        Self { ptr, len }
    }

    #[inline]
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for BufferMut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferMut")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}
