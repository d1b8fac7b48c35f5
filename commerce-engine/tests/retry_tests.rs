use commerce_engine::{
    CancellationToken, EngineConfig, EngineError, MemoryApi, Reconciler, RetryPolicy,
};
use commerce_model::{Company, Resource, State, StateType};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn setup() -> (Arc<MemoryApi>, Reconciler) {
    let api = Arc::new(MemoryApi::new());
    let reconciler = Reconciler::new(api.clone(), EngineConfig::default());
    (api, reconciler)
}

fn unavailable(count: usize) -> impl Iterator<Item = u16> {
    std::iter::repeat_n(503, count)
}

// ── Reconciler ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried() {
    let (api, reconciler) = setup();
    api.fail_next([503, 409]).await;

    let stored = reconciler
        .create(&Company::new("acme", "Acme"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(stored.version(), Some(1));
    assert_eq!(api.request_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn permanent_failures_are_not_retried() {
    let (api, reconciler) = setup();
    api.fail_next([400]).await;

    let err = reconciler
        .create(&Company::new("acme", "Acme"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RemotePermanent { status: 400, .. }), "{err:?}");
    assert_eq!(api.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn update_gives_up_when_budget_runs_out() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler.create(&Company::new("acme", "Acme"), &cancel).await.unwrap();
    let mut desired = stored.clone();
    desired.unit.name = "Acme 2".into();

    api.fail_next(unavailable(1000)).await;
    let started = tokio::time::Instant::now();
    let err = reconciler.update(&stored, &desired, &cancel).await.unwrap_err();

    assert!(err.is_transient(), "{err:?}");
    // Backoffs of 100, 200, 400, 800 and 1600ms fit into 5s; the next 2s does not.
    assert_eq!(api.request_count(), 1 + 6);
    assert_eq!(started.elapsed(), Duration::from_millis(3100));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_retrying() {
    let (api, reconciler) = setup();
    api.fail_next(unavailable(1000)).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        trigger.cancel();
    });

    let err = reconciler
        .create(&State::new("open", StateType::OrderState), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled), "{err:?}");
    // Attempts at 0 and 100ms; cancelled during the 200ms backoff.
    assert_eq!(api.request_count(), 2);
}

#[tokio::test]
async fn cancelled_operation_sends_nothing() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = reconciler
        .create(&Company::new("acme", "Acme"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
    assert_eq!(api.request_count(), 0);
}

// ── Policy ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn policy_returns_first_success() {
    let policy = RetryPolicy::new(
        Duration::from_secs(1),
        Duration::from_millis(10),
        Duration::from_millis(40),
    );
    let calls = AtomicU32::new(0);
    let value = policy
        .run("probe", &CancellationToken::new(), || async {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(EngineError::TransientRemote("flaky".into())),
                n => Ok(n),
            }
        })
        .await
        .unwrap();
    assert_eq!(value, 2);
}

#[tokio::test(start_paused = true)]
async fn zero_budget_means_single_attempt() {
    let policy = RetryPolicy::new(Duration::ZERO, Duration::from_millis(10), Duration::from_millis(40));
    let calls = AtomicU32::new(0);
    let err = policy
        .run("probe", &CancellationToken::new(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(EngineError::TransientRemote("down".into()))
        })
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
