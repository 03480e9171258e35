//! fsaio End-to-End Smoke Test
//!
//! Drives the full stack the way an event loop would:
//!   Part A (Setup): config, pool sizing, zero-worker rejection
//!   Part B (Operations): mkdir, open, write, close, read, rmdir
//!   Part C (Delivery): LIFO / FIFO ordering, many requests
//!   Part D (Notification): wait on notify_fd with poll(2), then drain
//!
//! Run: ./target/release/fsaio-smoke
//! Honors FSAIO_WORKERS, FSAIO_LOG_LEVEL, etc.

use fsaio::{Aio, AioConfig, AioError, BufferMut, BufferRef, DeliveryOrder, Request};

use std::os::unix::io::RawFd;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ── Test harness ──

struct TestRunner {
    total: usize,
    passed: usize,
    failed: usize,
}

const LINE: &str = "────────────────────────────────────────────────────────────";

impl TestRunner {
    fn new() -> Self {
        Self { total: 0, passed: 0, failed: 0 }
    }

    fn section(&self, name: &str) {
        println!("\n{}", LINE);
        println!("  {}", name);
        println!("{}", LINE);
    }

    fn pass(&mut self, name: &str) {
        self.total += 1;
        self.passed += 1;
        println!("  [{:2}] {:<52} PASS", self.total, name);
    }

    fn fail(&mut self, name: &str, reason: &str) {
        self.total += 1;
        self.failed += 1;
        println!("  [{:2}] {:<52} FAIL: {}", self.total, name, reason);
    }

    fn check(&mut self, name: &str, ok: bool, reason: &str) {
        if ok { self.pass(name); } else { self.fail(name, reason); }
    }

    fn summary(&self) {
        println!("\n{}", LINE);
        println!(
            "  Total: {}  Passed: {}  Failed: {}",
            self.total, self.passed, self.failed
        );
        println!("{}", LINE);
    }
}

/// (result, errno) captured by a callback.
type Slot = Arc<Mutex<Option<(i64, i32)>>>;

fn slot() -> Slot {
    Arc::new(Mutex::new(None))
}

fn record(s: &Slot) -> impl FnOnce(&Request) + Send + 'static {
    let s = Arc::clone(s);
    move |r: &Request| {
        if let Ok(mut g) = s.lock() {
            *g = Some((r.result(), r.errno()));
        }
    }
}

/// Helper: poll until `n` completions are delivered (with timeout).
fn drain(aio: &Aio, n: usize) -> usize {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut got = 0;
    while got < n && Instant::now() < deadline {
        got += aio.poll();
        if got < n {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
    got
}

/// Submit through `submit`, drain one completion, return what the callback saw.
fn roundtrip(aio: &Aio, submit: impl FnOnce(&Aio, &Slot) -> Result<(), AioError>) -> Option<(i64, i32)> {
    let s = slot();
    if submit(aio, &s).is_err() || drain(aio, 1) != 1 {
        return None;
    }
    let got = s.lock().ok()?.take();
    got
}

// ════════════════════════════════════════════════════════════
// Part A: Setup
// ════════════════════════════════════════════════════════════

fn test_setup(t: &mut TestRunner) -> Option<Aio> {
    t.section("Part A: Setup");

    let zero = Aio::with_config(AioConfig::new().num_workers(0));
    t.check(
        "zero workers rejected",
        matches!(zero, Err(AioError::InvalidWorkerCount(0))),
        &format!("{:?}", zero.err()),
    );

    let config = match AioConfig::try_from_env() {
        Ok(c) => c,
        Err(e) => { t.fail("AioConfig::try_from_env", &e.to_string()); return None; }
    };
    let aio = match Aio::with_config(config.clone()) {
        Ok(aio) => { t.pass("Aio::with_config(try_from_env)"); aio }
        Err(e) => { t.fail("Aio::with_config(try_from_env)", &e.to_string()); return None; }
    };
    t.check(
        "worker count matches config",
        aio.workers() == config.num_workers,
        &format!("{} vs {}", aio.workers(), config.num_workers),
    );
    t.check("poll() on idle system returns 0", aio.poll() == 0, "nonzero");
    Some(aio)
}

// ════════════════════════════════════════════════════════════
// Part B: Operations
// ════════════════════════════════════════════════════════════

fn test_operations(t: &mut TestRunner, aio: &Aio, root: &Path) {
    t.section("Part B: Operations");

    let dir = root.join("ops");
    let file = dir.join("file");

    let r = roundtrip(aio, |a, s| a.mkdir(&dir, 0o755, record(s)));
    t.check("mkdir", r == Some((0, 0)) && dir.is_dir(), &format!("{:?}", r));

    let r = roundtrip(aio, |a, s| a.mkdir(&dir, 0o755, record(s)));
    t.check("mkdir existing → EEXIST", r == Some((-1, libc::EEXIST)), &format!("{:?}", r));

    let r = roundtrip(aio, |a, s| a.open(&file, libc::O_CREAT | libc::O_RDWR, 0o644, record(s)));
    let fd = match r {
        Some((fd, 0)) if fd >= 0 => { t.pass("open O_CREAT"); fd as RawFd }
        other => { t.fail("open O_CREAT", &format!("{:?}", other)); return; }
    };

    let payload = b"fsaio smoke payload";
    let r = roundtrip(aio, |a, s| a.write(fd, unsafe { BufferRef::from_slice(payload) }, record(s)));
    t.check("write", r == Some((payload.len() as i64, 0)), &format!("{:?}", r));

    unsafe { libc::lseek(fd, 0, libc::SEEK_SET); }
    let mut buf = vec![0u8; 64];
    let r = roundtrip(aio, |a, s| a.read(fd, unsafe { BufferMut::from_mut_slice(&mut buf) }, record(s)));
    t.check(
        "read back",
        r == Some((payload.len() as i64, 0)) && &buf[..payload.len()] == payload,
        &format!("{:?}", r),
    );

    let r = roundtrip(aio, |a, s| a.close(fd, record(s)));
    t.check("close", r == Some((0, 0)), &format!("{:?}", r));

    let r = roundtrip(aio, |a, s| a.open(dir.join("missing"), libc::O_RDONLY, 0, record(s)));
    t.check("open missing → ENOENT", r == Some((-1, libc::ENOENT)), &format!("{:?}", r));

    let _ = std::fs::remove_file(&file);
    let r = roundtrip(aio, |a, s| a.rmdir(&dir, record(s)));
    t.check("rmdir", r == Some((0, 0)) && !dir.exists(), &format!("{:?}", r));
}

// ════════════════════════════════════════════════════════════
// Part C: Delivery
// ════════════════════════════════════════════════════════════

fn ordered(order: DeliveryOrder) -> Option<Vec<char>> {
    let aio = Aio::with_config(AioConfig::new().num_workers(1).delivery(order)).ok()?;
    let seen = Arc::new(Mutex::new(Vec::new()));
    for id in ['A', 'B', 'C'] {
        let seen = Arc::clone(&seen);
        aio.close(-1, move |_| {
            if let Ok(mut g) = seen.lock() {
                g.push(id);
            }
        })
        .ok()?;
    }
    let deadline = Instant::now() + Duration::from_secs(5);
    while aio.pending() < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(1));
    }
    aio.poll();
    let got = seen.lock().ok()?.clone();
    Some(got)
}

fn test_delivery(t: &mut TestRunner, aio: &Aio) {
    t.section("Part C: Delivery");

    let lifo = ordered(DeliveryOrder::Lifo);
    t.check("LIFO: A,B,C delivered C,B,A", lifo == Some(vec!['C', 'B', 'A']), &format!("{:?}", lifo));

    let fifo = ordered(DeliveryOrder::Fifo);
    t.check("FIFO: A,B,C delivered A,B,C", fifo == Some(vec!['A', 'B', 'C']), &format!("{:?}", fifo));

    let count = Arc::new(Mutex::new(0usize));
    let n = 1000;
    let mut accepted = 0;
    for _ in 0..n {
        let count = Arc::clone(&count);
        let ok = aio.close(-1, move |_| {
            if let Ok(mut g) = count.lock() {
                *g += 1;
            }
        });
        if ok.is_ok() {
            accepted += 1;
        }
    }
    let got = drain(aio, accepted);
    let fired = count.lock().map(|g| *g).unwrap_or(0);
    t.check(
        &format!("{} requests delivered exactly once", accepted),
        got == accepted && fired == accepted && aio.in_flight() == 0,
        &format!("polled {} fired {} in_flight {}", got, fired, aio.in_flight()),
    );
}

// ════════════════════════════════════════════════════════════
// Part D: Notification
// ════════════════════════════════════════════════════════════

fn test_notify(t: &mut TestRunner) {
    t.section("Part D: Notification");

    let aio = match Aio::with_config(AioConfig::new().num_workers(2).notify(true)) {
        Ok(aio) => aio,
        Err(e) => { t.fail("Aio with notify", &e.to_string()); return; }
    };
    let fd = match aio.notify_fd() {
        Some(fd) => { t.pass("notify_fd present"); fd }
        None => { t.fail("notify_fd present", "None"); return; }
    };

    let s = slot();
    if aio.rmdir("/nonexistent-fsaio-smoke", record(&s)).is_err() {
        t.fail("submit rmdir", "refused");
        return;
    }

    // Event-loop style: sleep in poll(2) until the queue has work.
    let mut pfd = libc::pollfd { fd, events: libc::POLLIN, revents: 0 };
    let n = unsafe { libc::poll(&mut pfd, 1, 5000) };
    t.check("notify fd readable", n == 1, &format!("poll returned {}", n));
    t.check("drain after wakeup", aio.poll() == 1, "nothing delivered");

    let got = s.lock().ok().and_then(|mut g| g.take());
    t.check("rmdir missing → ENOENT", got == Some((-1, libc::ENOENT)), &format!("{:?}", got));
}

fn main() {
    println!("fsaio smoke test");

    let mut t = TestRunner::new();
    let root = match tempfile::tempdir() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("cannot create scratch directory: {}", e);
            std::process::exit(2);
        }
    };

    if let Some(aio) = test_setup(&mut t) {
        test_operations(&mut t, &aio, root.path());
        test_delivery(&mut t, &aio);
        aio.shutdown();
    }
    test_notify(&mut t);

    t.summary();
    if t.failed > 0 {
        std::process::exit(1);
    }
}
