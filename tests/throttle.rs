use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, join_all};
use tokio::time::{Instant, sleep};

use throttle_queue::{
    Callback, Event, EventKind, OperationFn, Outcome, Subscribe, Throttle, ThrottleConfig,
    ThrottleError, wrap, wrap_callback,
};

/// Tracks how many operation bodies run at once and in which order they start.
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl Gauge {
    fn enter(&self, name: &str) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("start {name}"));
    }

    fn exit(&self, name: &str) {
        self.log.lock().unwrap().push(format!("end {name}"));
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

type Timed = BoxFuture<'static, Result<String, String>>;

/// Operation sleeping `ms` while registered with the gauge.
fn timed(gauge: Arc<Gauge>) -> impl Fn((String, u64)) -> Timed + Send + Sync + 'static {
    move |(name, ms): (String, u64)| -> Timed {
        let gauge = Arc::clone(&gauge);
        Box::pin(async move {
            gauge.enter(&name);
            sleep(Duration::from_millis(ms)).await;
            gauge.exit(&name);
            Ok(name)
        })
    }
}

#[tokio::test(start_paused = true)]
async fn ceiling_is_never_exceeded() {
    let gauge = Arc::new(Gauge::default());
    let throttle = wrap(timed(Arc::clone(&gauge)), 3);

    let calls: Vec<_> = (0..20)
        .map(|i| throttle.call((format!("c{i}"), 10 + (i % 4) * 5)))
        .collect();
    assert_eq!(throttle.active(), 3);
    assert_eq!(throttle.pending(), 17);

    let results = join_all(calls).await;
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(gauge.peak(), 3);
    assert_eq!(throttle.active(), 0);
    assert_eq!(throttle.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn single_slot_releases_in_arrival_order() {
    let gauge = Arc::new(Gauge::default());
    let throttle = wrap(timed(Arc::clone(&gauge)), 1);

    // A is slowest; B and C must still wait for it.
    let a = throttle.call(("A".into(), 30));
    let b = throttle.call(("B".into(), 10));
    let c = throttle.call(("C".into(), 5));

    let (a, b, c) = tokio::join!(a, b, c);
    assert_eq!(a.unwrap(), "A");
    assert_eq!(b.unwrap(), "B");
    assert_eq!(c.unwrap(), "C");
    assert_eq!(
        gauge.log(),
        vec!["start A", "end A", "start B", "end B", "start C", "end C"]
    );
}

#[tokio::test(start_paused = true)]
async fn five_calls_with_ceiling_two() {
    let gauge = Arc::new(Gauge::default());
    let throttle = wrap(timed(Arc::clone(&gauge)), 2);
    let settled = Arc::new(Mutex::new(Vec::new()));
    let started_at = Instant::now();

    let calls = (1..=5).map(|i| {
        let handle = throttle.call((format!("{i}"), 100));
        let settled = Arc::clone(&settled);
        async move {
            let name = handle.await.unwrap();
            settled.lock().unwrap().push(name);
        }
    });
    let calls: Vec<_> = calls.collect();

    // Arrival: two admitted, three waiting.
    assert_eq!(throttle.active(), 2);
    assert_eq!(throttle.pending(), 3);

    join_all(calls).await;

    assert_eq!(gauge.peak(), 2);
    let elapsed = started_at.elapsed();
    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(400), "{elapsed:?}");

    // Queued calls start in submission order, one per freed slot.
    let starts: Vec<_> = gauge
        .log()
        .into_iter()
        .filter(|l| l.starts_with("start"))
        .collect();
    assert_eq!(starts, vec!["start 1", "start 2", "start 3", "start 4", "start 5"]);

    // Settlement follows in waves: {1, 2}, then {3, 4}, then 5.
    let mut settled = settled.lock().unwrap().clone();
    assert_eq!(settled.len(), 5);
    settled[..2].sort();
    settled[2..4].sort();
    assert_eq!(settled, vec!["1", "2", "3", "4", "5"]);
}

#[tokio::test(start_paused = true)]
async fn boundary_active_equal_to_max_waits() {
    let gauge = Arc::new(Gauge::default());
    let throttle = wrap(timed(Arc::clone(&gauge)), 2);

    let first = throttle.call(("1".into(), 50));
    let second = throttle.call(("2".into(), 50));
    assert_eq!(throttle.active(), 2);
    assert_eq!(throttle.pending(), 0);

    let third = throttle.call(("3".into(), 50));
    assert_eq!(throttle.active(), 2);
    assert_eq!(throttle.pending(), 1);

    let _ = tokio::join!(first, second, third);
    assert_eq!(gauge.peak(), 2);
}

#[tokio::test]
async fn result_and_error_pass_through() {
    let ok = wrap(|_: ()| async { Ok::<u32, &str>(42) }, 1);
    assert_eq!(ok.call(()).await.unwrap(), 42);

    let failing = wrap(|_: ()| async { Err::<u32, &str>("E") }, 1);
    let err = failing.call(()).await.unwrap_err();
    assert!(err.is_operation());
    assert_eq!(err.into_operation(), Some("E"));
}

#[tokio::test(start_paused = true)]
async fn failures_and_panics_do_not_stall_the_queue() {
    let throttle = wrap(
        |kind: &'static str| async move {
            sleep(Duration::from_millis(10)).await;
            match kind {
                "fail" => Err("boom"),
                "panic" => panic!("operation blew up"),
                _ => Ok(kind),
            }
        },
        1,
    );

    let failed = throttle.call("fail");
    let panicked = throttle.call("panic");
    let fine = throttle.call("fine");

    let (failed, panicked, fine) = tokio::join!(failed, panicked, fine);
    assert_eq!(failed.unwrap_err().into_operation(), Some("boom"));
    match panicked {
        Err(ThrottleError::Panicked { message }) => assert_eq!(message, "operation blew up"),
        other => panic!("expected panic error, got {other:?}"),
    }
    assert_eq!(fine.unwrap(), "fine");
    assert_eq!(throttle.active(), 0);
}

#[tokio::test]
async fn dropped_callback_fails_fast_and_frees_the_slot() {
    let throttle = wrap_callback(
        |drop_it: bool, cb: Callback<u8, &'static str>| {
            if !drop_it {
                cb.ok(7);
            }
        },
        1,
    );

    let broken = throttle.call(true);
    let next = throttle.call(false);

    assert!(broken.await.unwrap_err().is_usage());
    assert_eq!(next.await.unwrap(), Outcome::Single(7));
    assert_eq!(throttle.active(), 0);
}

#[tokio::test]
async fn callback_results_follow_convention() {
    let throttle = wrap_callback(
        |n: usize, cb: Callback<&'static str, &'static str>| match n {
            0 => cb.fail("err"),
            1 => cb.complete(None, vec!["x"]),
            _ => cb.complete(None, vec!["a", "b"]),
        },
        2,
    );

    assert_eq!(throttle.call(2).await.unwrap(), Outcome::Many(vec!["a", "b"]));
    assert_eq!(throttle.call(1).await.unwrap(), Outcome::Single("x"));
    assert_eq!(throttle.call(0).await.unwrap_err().into_operation(), Some("err"));
}

#[test]
fn call_outside_runtime_is_usage_error() {
    let throttle = wrap(|n: u8| async move { Ok::<_, ()>(n) }, 1);
    let err = futures::executor::block_on(throttle.call(1)).unwrap_err();
    assert!(err.is_usage());
    assert_eq!(throttle.active(), 0);
    assert_eq!(throttle.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn throttles_do_not_share_capacity() {
    let slow = wrap(
        |_: ()| async {
            sleep(Duration::from_secs(10)).await;
            Ok::<_, ()>(())
        },
        1,
    );
    let fast = wrap(
        |_: ()| async {
            sleep(Duration::from_millis(10)).await;
            Ok::<_, ()>(())
        },
        1,
    );

    let _busy = slow.call(());
    let _waiting = slow.call(());
    assert_eq!(slow.pending(), 1);

    fast.call(()).await.unwrap();
    assert_eq!(slow.active(), 1);
    assert_eq!(slow.pending(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_handle_still_runs_in_order() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let throttle = wrap(
        move |mark: bool| {
            let flag = Arc::clone(&flag);
            async move {
                sleep(Duration::from_millis(5)).await;
                if mark {
                    flag.store(true, Ordering::SeqCst);
                }
                Ok::<_, ()>(mark)
            }
        },
        1,
    );

    let blocker = throttle.call(false);
    drop(throttle.call(true));
    let last = throttle.call(false);

    blocker.await.unwrap();
    last.await.unwrap();
    assert!(ran.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn queued_calls_outlive_the_throttle() {
    let throttle = wrap(
        |n: u32| async move {
            sleep(Duration::from_millis(10)).await;
            Ok::<_, ()>(n)
        },
        1,
    );
    let calls: Vec<_> = (0..4).map(|n| throttle.call(n)).collect();
    drop(throttle);

    let results: Vec<_> = join_all(calls).await.into_iter().map(Result::unwrap).collect();
    assert_eq!(results, vec![0, 1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn multi_thread_single_slot_keeps_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let current = Arc::new(AtomicUsize::new(0));
    let (o, c) = (Arc::clone(&order), Arc::clone(&current));

    let throttle = wrap(
        move |i: usize| {
            let (order, current) = (Arc::clone(&o), Arc::clone(&c));
            async move {
                assert_eq!(current.fetch_add(1, Ordering::SeqCst), 0);
                order.lock().unwrap().push(i);
                tokio::task::yield_now().await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, ()>(i)
            }
        },
        1,
    );

    let calls: Vec<_> = (0..50).map(|i| throttle.call(i)).collect();
    for r in join_all(calls).await {
        r.unwrap();
    }
    assert_eq!(*order.lock().unwrap(), (0..50).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn multi_thread_ceiling_holds_under_concurrent_callers() {
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (c, p) = (Arc::clone(&current), Arc::clone(&peak));

    let throttle = wrap(
        move |_: usize| {
            let (current, peak) = (Arc::clone(&c), Arc::clone(&p));
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                for _ in 0..3 {
                    tokio::task::yield_now().await;
                }
                current.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, ()>(())
            }
        },
        3,
    );

    let callers: Vec<_> = (0..8)
        .map(|caller| {
            let throttle = throttle.clone();
            tokio::spawn(async move {
                let calls: Vec<_> = (0..25).map(|i| throttle.call(caller * 100 + i)).collect();
                join_all(calls).await
            })
        })
        .collect();

    for caller in join_all(callers).await {
        assert!(caller.unwrap().iter().all(Result::is_ok));
    }
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(throttle.active(), 0);
    assert_eq!(throttle.pending(), 0);
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_every_transition() {
    let rec = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![rec.clone()];

    let throttle = Throttle::builder(ThrottleConfig::with_max_concurrent(1))
        .with_name("orders")
        .with_subscribers(subs)
        .build(OperationFn::new(|fail: bool| async move {
            sleep(Duration::from_millis(10)).await;
            if fail { Err("nope") } else { Ok(()) }
        }));
    assert_eq!(throttle.name(), Some("orders"));

    let first = throttle.call(false);
    let second = throttle.call(true);
    first.await.unwrap();
    assert!(second.await.is_err());
    drop(throttle);

    for _ in 0..100 {
        if rec.events.lock().unwrap().len() >= 5 {
            break;
        }
        sleep(Duration::from_millis(1)).await;
    }

    let mut events = rec.events.lock().unwrap().clone();
    events.sort_by_key(|e| e.seq);
    let seen: Vec<_> = events.iter().map(|e| (e.kind, e.call)).collect();
    assert_eq!(
        seen,
        vec![
            (EventKind::CallAdmitted, Some(1)),
            (EventKind::CallQueued, Some(2)),
            (EventKind::CallSettled, Some(1)),
            (EventKind::CallDequeued, Some(2)),
            (EventKind::CallFailed, Some(2)),
        ]
    );
    assert!(events.iter().all(|e| e.throttle.as_deref() == Some("orders")));
    assert_eq!(events[4].reason.as_deref(), Some("operation_failed"));
}

struct Boom;

#[async_trait]
impl Subscribe for Boom {
    async fn on_event(&self, _event: &Event) {
        panic!("metrics sink down");
    }

    fn name(&self) -> &'static str {
        "boom"
    }
}

#[tokio::test(start_paused = true)]
async fn subscriber_panic_reaches_the_other_subscribers() {
    let rec = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Boom), rec.clone()];

    let throttle = Throttle::builder(ThrottleConfig::default())
        .with_name("metrics")
        .with_subscribers(subs)
        .build(OperationFn::new(|n: u32| async move { Ok::<_, String>(n + 1) }));

    let handle = throttle.call(1);
    assert_eq!(handle.id(), 1);
    assert_eq!(handle.await.unwrap(), 2);

    // Boom panics on both call events; each panic is reported once.
    for _ in 0..100 {
        if rec.events.lock().unwrap().len() >= 4 {
            break;
        }
        sleep(Duration::from_millis(1)).await;
    }

    let events = rec.events.lock().unwrap().clone();
    let (faults, calls): (Vec<_>, Vec<_>) =
        events.iter().partition(|e| e.kind == EventKind::SubscriberPanicked);

    let kinds: Vec<_> = calls.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::CallAdmitted, EventKind::CallSettled]);
    assert_eq!(calls.iter().filter(|e| e.is_terminal()).count(), 1);

    assert_eq!(faults.len(), 2);
    for fault in faults {
        assert_eq!(fault.call, Some(1));
        assert_eq!(fault.throttle.as_deref(), Some("metrics"));
        let reason = fault.reason.as_deref().unwrap();
        assert!(reason.contains("'boom'"));
        assert!(reason.contains("metrics sink down"));
    }
}
