//! Request value object.
//!
//! A `Request` holds one operation's arguments, its owned path copy (if
//! any), the raw syscall result and the completion callback. It has no
//! behavior of its own: `execute` fills in the result, the completion
//! queue carries it back, and the drain loop runs the callback and drops it.
//!
//! Ownership moves with the `Box<Request>`: caller → executor → completion
//! queue → poller. A request is never cloned or reused.

use std::ffi::{CStr, CString};
use std::fmt;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::Path;

use crate::buffer::{BufferMut, BufferRef};
use crate::error::{AioError, Result};

/// Completion callback. Invoked exactly once, on the polling thread.
pub type Callback = Box<dyn FnOnce(&Request) + Send + 'static>;

/// Operation kind. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Read,
    Write,
    Open,
    Close,
    Mkdir,
    Rmdir,
}

impl OpKind {
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Read => "read",
            OpKind::Write => "write",
            OpKind::Open => "open",
            OpKind::Close => "close",
            OpKind::Mkdir => "mkdir",
            OpKind::Rmdir => "rmdir",
        }
    }

    /// Whether the operation takes a path rather than a descriptor.
    pub fn is_path_based(self) -> bool {
        matches!(self, OpKind::Open | OpKind::Mkdir | OpKind::Rmdir)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller memory referenced by read/write requests.
#[derive(Debug, Clone, Copy)]
pub(crate) enum IoBuffer {
    None,
    Source(BufferRef),
    Target(BufferMut),
}

/// A single in-flight file-system operation.
pub struct Request {
    pub(crate) kind: OpKind,
    pub(crate) fd: RawFd,
    pub(crate) path: Option<CString>,
    pub(crate) buffer: IoBuffer,
    pub(crate) size: usize,
    pub(crate) flags: libc::c_int,
    pub(crate) mode: libc::mode_t,
    pub(crate) result: i64,
    pub(crate) errno: i32,
    pub(crate) callback: Option<Callback>,
}

impl Request {
    /// Zero-initialised request of the given kind.
    fn new(kind: OpKind) -> Self {
        Self {
            kind,
            fd: -1,
            path: None,
            buffer: IoBuffer::None,
            size: 0,
            flags: 0,
            mode: 0,
            result: 0,
            errno: 0,
            callback: None,
        }
    }

    /// Copy a path into an owned, null-terminated string.
    fn with_path(kind: OpKind, path: &Path) -> Result<Self> {
        let path = CString::new(path.as_os_str().as_bytes()).map_err(|_| AioError::InvalidPath)?;
        let mut req = Self::new(kind);
        req.path = Some(path);
        Ok(req)
    }

    /// Read up to `buf.len()` bytes from `fd` into `buf`.
    pub fn read(fd: RawFd, buf: BufferMut) -> Self {
        let mut req = Self::new(OpKind::Read);
        req.fd = fd;
        req.size = buf.len();
        req.buffer = IoBuffer::Target(buf);
        req
    }

    /// Write `buf.len()` bytes from `buf` to `fd`.
    pub fn write(fd: RawFd, buf: BufferRef) -> Self {
        let mut req = Self::new(OpKind::Write);
        req.fd = fd;
        req.size = buf.len();
        req.buffer = IoBuffer::Source(buf);
        req
    }

    /// Open `path` with `open(2)` flags and creation mode.
    ///
    /// The path is copied; the caller may drop it as soon as this returns.
    pub fn open<P: AsRef<Path>>(path: P, flags: libc::c_int, mode: libc::mode_t) -> Result<Self> {
        let mut req = Self::with_path(OpKind::Open, path.as_ref())?;
        req.flags = flags;
        req.mode = mode;
        Ok(req)
    }

    pub fn close(fd: RawFd) -> Self {
        let mut req = Self::new(OpKind::Close);
        req.fd = fd;
        req
    }

    pub fn mkdir<P: AsRef<Path>>(path: P, mode: libc::mode_t) -> Result<Self> {
        let mut req = Self::with_path(OpKind::Mkdir, path.as_ref())?;
        req.mode = mode;
        Ok(req)
    }

    pub fn rmdir<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_path(OpKind::Rmdir, path.as_ref())
    }

    /// Attach the completion callback, replacing any previous one.
    pub fn on_finish<F>(mut self, finish: F) -> Self
    where
        F: FnOnce(&Request) + Send + 'static,
    {
        self.callback = Some(Box::new(finish));
        self
    }

    #[inline]
    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// Descriptor for read/write/close; `-1` for path-based requests.
    #[inline]
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Owned path copy for open/mkdir/rmdir.
    #[inline]
    pub fn path(&self) -> Option<&CStr> {
        self.path.as_deref()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn flags(&self) -> libc::c_int {
        self.flags
    }

    #[inline]
    pub fn mode(&self) -> libc::mode_t {
        self.mode
    }

    /// Raw return value of the syscall, exactly as the worker saw it.
    #[inline]
    pub fn result(&self) -> i64 {
        self.result
    }

    /// `errno` captured on the worker thread when `result` is negative, else 0.
    #[inline]
    pub fn errno(&self) -> i32 {
        self.errno
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.result < 0
    }

    #[inline]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// `result` as `io::Result`: byte count / descriptor on success, the
    /// captured errno on failure.
    pub fn io_result(&self) -> io::Result<usize> {
        if self.result < 0 {
            Err(io::Error::from_raw_os_error(self.errno))
        } else {
            Ok(self.result as usize)
        }
    }

    /// Bytes filled by a successful read.
    ///
    /// Returns `None` for other kinds or a failed read.
    ///
    /// # Safety
    ///
    /// The buffer the request was built with must still be alive, which the
    /// `BufferMut` contract guarantees while the completion callback runs.
    pub unsafe fn filled(&self) -> Option<&[u8]> {
        match self.buffer {
            IoBuffer::Target(buf) if self.result >= 0 => {
                let n = (self.result as usize).min(buf.len());
                Some(std::slice::from_raw_parts(buf.as_mut_ptr(), n))
            }
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn take_callback(&mut self) -> Option<Callback> {
        self.callback.take()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("kind", &self.kind)
            .field("fd", &self.fd)
            .field("path", &self.path)
            .field("buffer", &self.buffer)
            .field("size", &self.size)
            .field("flags", &self.flags)
            .field("mode", &self.mode)
            .field("result", &self.result)
            .field("errno", &self.errno)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
