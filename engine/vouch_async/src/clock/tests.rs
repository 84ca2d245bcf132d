use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use vouch_value::{EngineErrorKind, Thrown};

use super::*;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Result<(), Thrown> + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&count);
    (count, move || {
        hits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

fn installed() -> VirtualClock {
    let clock = VirtualClock::new();
    clock.install().unwrap();
    clock
}

#[test]
fn double_install_conflicts() {
    let clock = installed();
    let err = clock.install().unwrap_err();
    assert_eq!(err.kind, EngineErrorKind::InstallConflict);

    clock.uninstall();
    assert!(clock.install().is_ok());
}

#[test]
fn timeout_fires_once_when_due() {
    let clock = installed();
    let (count, callback) = counter();
    clock.set_timeout(ms(100), callback);

    clock.tick(ms(99)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    clock.tick(ms(2)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    clock.tick(ms(500)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn tick_past_timeout_fires_once() {
    let clock = installed();
    let (count, callback) = counter();
    clock.set_timeout(ms(100), callback);
    clock.tick(ms(101)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(clock.pending_timers(), 0);
}

#[test]
fn interval_fires_per_period() {
    let clock = installed();
    let (count, callback) = counter();
    clock.set_interval(ms(100), callback);

    clock.tick(ms(50)).unwrap();
    clock.tick(ms(50)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    clock.tick(ms(250)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[test]
fn cleared_timers_do_not_fire() {
    let clock = installed();
    let (count, callback) = counter();
    let id = clock.set_timeout(ms(10), callback);
    clock.clear_timeout(id);
    clock.tick(ms(20)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    let (count, callback) = counter();
    let id = clock.set_interval(ms(10), callback);
    clock.tick(ms(10)).unwrap();
    clock.clear_interval(id);
    clock.tick(ms(100)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn timers_fire_in_due_order_then_registration_order() {
    let clock = installed();
    let order = Arc::new(Mutex::new(Vec::new()));
    for (label, delay) in [("c", 30), ("a", 10), ("b1", 20), ("b2", 20)] {
        let order = Arc::clone(&order);
        clock.set_timeout(ms(delay), move || {
            order.lock().push(label);
            Ok(())
        });
    }
    clock.tick(ms(30)).unwrap();
    assert_eq!(*order.lock(), vec!["a", "b1", "b2", "c"]);
}

#[test]
fn timers_scheduled_by_callbacks_fire_in_same_tick() {
    let clock = installed();
    let (count, inner) = counter();
    let inner = Arc::new(inner);
    let scheduler = clock.clone();
    clock.set_timeout(ms(10), move || {
        let inner = Arc::clone(&inner);
        scheduler.set_timeout(ms(10), move || (*inner)());
        Ok(())
    });

    clock.tick(ms(25)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn callback_error_stops_the_tick() {
    let clock = installed();
    let (count, callback) = counter();
    clock.set_timeout(ms(10), || Err(Thrown::error("timer failed")));
    clock.set_timeout(ms(20), callback);

    let err = clock.tick(ms(50)).unwrap_err();
    assert_eq!(err.to_string(), "Error: timer failed");
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(clock.elapsed(), ms(10));

    clock.tick(ms(10)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn uninstall_discards_pending_timers() {
    let clock = installed();
    let (count, callback) = counter();
    clock.set_timeout(ms(10), callback);
    clock.uninstall();
    assert_eq!(clock.pending_timers(), 0);

    clock.install().unwrap();
    clock.tick(ms(100)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn deadlines_move_to_real_time_on_uninstall() {
    let clock = installed();
    let (tx, rx) = std::sync::mpsc::channel();
    clock.set_deadline(ms(20), move || {
        let _ = tx.send(());
        Ok(())
    });
    clock.tick(ms(15)).unwrap();
    assert!(rx.try_recv().is_err());

    clock.uninstall();
    assert_eq!(clock.pending_timers(), 0);
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
}

#[test]
fn cleared_deadline_stays_quiet_after_uninstall() {
    let clock = installed();
    let (count, callback) = counter();
    let id = clock.set_deadline(ms(10), callback);
    clock.uninstall();
    clock.clear_timeout(id);
    std::thread::sleep(ms(100));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn mocked_date_advances_with_ticks() {
    let clock = installed();
    clock.mock_date(1_000_000);
    assert_eq!(clock.now(), 1_000_000);
    clock.tick(ms(250)).unwrap();
    assert_eq!(clock.now(), 1_000_250);
}

#[test]
fn real_clock_runs_timers_when_not_installed() {
    let clock = VirtualClock::new();
    let (tx, rx) = std::sync::mpsc::channel();
    clock.set_timeout(ms(5), move || {
        let _ = tx.send(());
        Ok(())
    });
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
}

#[test]
fn cleared_real_timer_does_not_fire() {
    let clock = VirtualClock::new();
    let (count, callback) = counter();
    let id = clock.set_timeout(ms(50), callback);
    clock.clear_timeout(id);
    std::thread::sleep(ms(150));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}
