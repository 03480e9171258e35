//! Execute phase.
//!
//! Runs on a worker thread and may block; that is the point. Dispatches on
//! the request kind, performs the syscall and records the raw return value.
//! No validation, retry or interpretation happens here, and the completion
//! queue is never touched.

use std::ptr;

use crate::request::{IoBuffer, OpKind, Request};

/// Perform the blocking syscall for `req` and store its result.
///
/// `errno` is read immediately after the call on the same thread, since
/// it is thread-local and would be lost once the request moves on.
pub fn execute(req: &mut Request) {
    let path = req.path.as_ref().map_or(ptr::null(), |p| p.as_ptr());

    // Safety: descriptors, paths and buffers are passed through verbatim.
    // Buffer validity is the caller's obligation under the BufferRef /
    // BufferMut contract; the path is owned by the request.
    let ret = unsafe {
        match req.kind {
            OpKind::Read => {
                let buf = match req.buffer {
                    IoBuffer::Target(b) => b.as_mut_ptr(),
                    _ => ptr::null_mut(),
                };
                libc::read(req.fd, buf as *mut libc::c_void, req.size) as i64
            }
            OpKind::Write => {
                let buf = match req.buffer {
                    IoBuffer::Source(b) => b.as_ptr(),
                    _ => ptr::null(),
                };
                libc::write(req.fd, buf as *const libc::c_void, req.size) as i64
            }
            OpKind::Close => libc::close(req.fd) as i64,
            OpKind::Open => libc::open(path, req.flags, req.mode as libc::c_uint) as i64,
            OpKind::Mkdir => libc::mkdir(path, req.mode) as i64,
            OpKind::Rmdir => libc::rmdir(path) as i64,
        }
    };

    req.errno = if ret < 0 { last_errno() } else { 0 };
    req.result = ret;
}

#[inline]
fn last_errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufferMut, BufferRef};
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::io::AsRawFd;
    use std::path::Path;

    fn cpath(p: &Path) -> CString {
        CString::new(p.as_os_str().as_bytes()).unwrap()
    }

    #[test]
    fn test_read_matches_direct_read() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data");
        std::fs::write(&file, b"0123456789").unwrap();

        let f1 = std::fs::File::open(&file).unwrap();
        let f2 = std::fs::File::open(&file).unwrap();

        let mut via_req = [0u8; 4];
        let mut req = Request::read(f1.as_raw_fd(), unsafe { BufferMut::from_mut_slice(&mut via_req) });
        execute(&mut req);

        let mut direct = [0u8; 4];
        let ret = unsafe { libc::read(f2.as_raw_fd(), direct.as_mut_ptr() as *mut libc::c_void, 4) };

        assert_eq!(req.result(), ret as i64);
        assert_eq!(req.errno(), 0);
        assert_eq!(via_req, direct);
        assert_eq!(&via_req, b"0123");
    }

    #[test]
    fn test_write_matches_direct_write() {
        let dir = tempfile::tempdir().unwrap();
        let a = std::fs::File::create(dir.path().join("a")).unwrap();
        let b = std::fs::File::create(dir.path().join("b")).unwrap();
        let payload = b"fsaio write";

        let mut req = Request::write(a.as_raw_fd(), unsafe { BufferRef::from_slice(payload) });
        execute(&mut req);
        let ret = unsafe {
            libc::write(b.as_raw_fd(), payload.as_ptr() as *const libc::c_void, payload.len())
        };

        assert_eq!(req.result(), ret as i64);
        assert_eq!(std::fs::read(dir.path().join("a")).unwrap(), payload);
    }

    #[test]
    fn test_open_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("created");

        let mut open = Request::open(&file, libc::O_CREAT | libc::O_WRONLY, 0o600).unwrap();
        execute(&mut open);
        assert!(open.result() >= 0, "open failed: errno {}", open.errno());
        assert!(file.exists());

        let mut close = Request::close(open.result() as i32);
        execute(&mut close);
        assert_eq!(close.result(), 0);

        let mut bad = Request::close(-1);
        execute(&mut bad);
        let ret = unsafe { libc::close(-1) };
        assert_eq!(bad.result(), ret as i64);
        assert_eq!(bad.errno(), libc::EBADF);
    }

    #[test]
    fn test_open_missing_forwards_errno() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let mut req = Request::open(&missing, libc::O_RDONLY, 0).unwrap();
        execute(&mut req);
        let ret = unsafe { libc::open(cpath(&missing).as_ptr(), libc::O_RDONLY) };

        assert_eq!(req.result(), ret as i64);
        assert_eq!(req.result(), -1);
        assert_eq!(req.errno(), libc::ENOENT);
    }

    #[test]
    fn test_mkdir_rmdir_match_direct() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");

        let mut mk = Request::mkdir(&sub, 0o755).unwrap();
        execute(&mut mk);
        assert_eq!(mk.result(), 0);
        assert!(sub.is_dir());

        let ret = unsafe { libc::mkdir(cpath(&sub).as_ptr(), 0o755) };
        let mut mk_again = Request::mkdir(&sub, 0o755).unwrap();
        execute(&mut mk_again);
        assert_eq!(mk_again.result(), ret as i64);
        assert_eq!(mk_again.errno(), libc::EEXIST);

        let mut rm = Request::rmdir(&sub).unwrap();
        execute(&mut rm);
        assert_eq!(rm.result(), 0);
        assert!(!sub.exists());

        let ret = unsafe { libc::rmdir(cpath(&sub).as_ptr()) };
        let mut rm_again = Request::rmdir(&sub).unwrap();
        execute(&mut rm_again);
        assert_eq!(rm_again.result(), ret as i64);
        assert_eq!(rm_again.errno(), libc::ENOENT);
    }
}
