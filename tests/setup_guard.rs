//! 初始化守卫的行为测试
//!
//! ScriptedSubsystem 记录每个操作的调用次数，可以预设初始化结果，
//! 也可以用信号量把 setup_player 卡住，以观察并发调用方的合并。

use player_bootstrap::error::SubsystemError;
use player_bootstrap::setup::{SetupGuard, SetupOptions, SetupOverrides, SetupState};
use player_bootstrap::subsystem::{PlaybackState, PlaybackSubsystem};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Default)]
struct ScriptedSubsystem {
    state_calls: AtomicUsize,
    setup_calls: AtomicUsize,
    update_calls: AtomicUsize,
    reset_calls: AtomicUsize,
    initialized: AtomicBool,
    fail_update: AtomicBool,
    fail_reset: AtomicBool,
    /// 下一次 setup_player 直接 panic
    panic_setup: AtomicBool,
    /// 依次弹出作为 setup_player 的结果；为空时成功
    setup_results: Mutex<VecDeque<Result<(), SubsystemError>>>,
    setup_options: Mutex<Vec<SetupOptions>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedSubsystem {
    fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let s = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (s, gate)
    }

    fn with_setup_results(results: Vec<Result<(), SubsystemError>>) -> Self {
        Self {
            setup_results: Mutex::new(results.into()),
            ..Self::default()
        }
    }

    fn counts(&self) -> (usize, usize, usize) {
        (
            self.state_calls.load(Ordering::SeqCst),
            self.setup_calls.load(Ordering::SeqCst),
            self.update_calls.load(Ordering::SeqCst),
        )
    }
}

impl PlaybackSubsystem for ScriptedSubsystem {
    async fn state(&self) -> Result<PlaybackState, SubsystemError> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        if self.initialized.load(Ordering::SeqCst) {
            Ok(PlaybackState::Ready)
        } else {
            Err(SubsystemError::NotInitialized)
        }
    }

    async fn setup_player(&self, options: &SetupOptions) -> Result<(), SubsystemError> {
        self.setup_calls.fetch_add(1, Ordering::SeqCst);
        self.setup_options.lock().unwrap().push(options.clone());
        if self.panic_setup.swap(false, Ordering::SeqCst) {
            panic!("audio driver crashed");
        }
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        let res = self.setup_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if res.is_ok() {
            self.initialized.store(true, Ordering::SeqCst);
        }
        res
    }

    async fn update_options(&self, _options: &SetupOptions) -> Result<(), SubsystemError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(SubsystemError::Rejected("capabilities rejected".to_owned()));
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), SubsystemError> {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reset.load(Ordering::SeqCst) {
            return Err(SubsystemError::Rejected("reset blew up".to_owned()));
        }
        self.initialized.store(false, Ordering::SeqCst);
        Ok(())
    }
}

async fn wait_for_state<S: PlaybackSubsystem>(guard: &SetupGuard<S>, want: SetupState) {
    while guard.state() != want {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn three_concurrent_callers_share_one_initialize() {
    let (sub, gate) = ScriptedSubsystem::gated();
    let sub = Arc::new(sub);
    let guard = SetupGuard::new(Arc::clone(&sub));

    let driver = async {
        wait_for_state(&guard, SetupState::InProgress).await;
        // 让其余调用方都有机会被 poll 并加入
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert_eq!(sub.setup_calls.load(Ordering::SeqCst), 1);
        gate.add_permits(1);
    };

    let (a, b, c, ()) = tokio::join!(
        guard.ensure_setup(None),
        guard.ensure_setup(None),
        guard.ensure_setup(None),
        driver
    );

    assert!(a && b && c);
    assert_eq!(guard.state(), SetupState::Complete);
    assert_eq!(sub.counts(), (1, 1, 1));
    assert_eq!(
        *sub.setup_options.lock().unwrap(),
        vec![SetupOptions::default()]
    );
}

#[tokio::test]
async fn joined_callers_all_see_the_same_failure() {
    let (sub, gate) = ScriptedSubsystem::gated();
    *sub.setup_results.lock().unwrap() =
        VecDeque::from([Err(SubsystemError::OutputStream("no device".to_owned()))]);
    let sub = Arc::new(sub);
    let guard = SetupGuard::new(Arc::clone(&sub));

    let driver = async {
        wait_for_state(&guard, SetupState::InProgress).await;
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert_eq!(sub.setup_calls.load(Ordering::SeqCst), 1);
        gate.add_permits(1);
    };

    let (a, b, c, ()) = tokio::join!(
        guard.ensure_setup(None),
        guard.ensure_setup(None),
        guard.ensure_setup(None),
        driver
    );

    assert_eq!([a, b, c], [false; 3]);
    assert_eq!(sub.setup_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sub.update_calls.load(Ordering::SeqCst), 0);
    assert_eq!(guard.state(), SetupState::NotStarted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_tasks_on_worker_threads_share_one_initialize() {
    let (sub, gate) = ScriptedSubsystem::gated();
    let sub = Arc::new(sub);
    let guard = SetupGuard::new(Arc::clone(&sub));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let guard = guard.clone();
            tokio::spawn(async move { guard.ensure_setup(None).await })
        })
        .collect();

    wait_for_state(&guard, SetupState::InProgress).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    gate.add_permits(1);

    for h in handles {
        assert!(h.await.expect("task panicked"));
    }
    assert_eq!(guard.state(), SetupState::Complete);
    assert_eq!(sub.setup_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sub.update_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn complete_guard_makes_no_subsystem_calls() {
    let sub = Arc::new(ScriptedSubsystem::default());
    let guard = SetupGuard::new(Arc::clone(&sub));

    assert!(guard.ensure_setup(None).await);
    let before = sub.counts();

    // 完成之后的覆盖项被忽略
    let overrides = SetupOverrides {
        min_buffer_ms: Some(5),
        ..SetupOverrides::default()
    };
    assert!(guard.ensure_setup(Some(overrides)).await);
    assert!(guard.ensure_setup(None).await);

    assert_eq!(sub.counts(), before);
    assert_eq!(sub.setup_options.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn already_initialized_message_counts_as_success() {
    let sub = Arc::new(ScriptedSubsystem::with_setup_results(vec![Err(
        SubsystemError::Rejected(
            "The player has already been initialized via setupPlayer.".to_owned(),
        ),
    )]));
    let guard = SetupGuard::new(Arc::clone(&sub));

    assert!(guard.ensure_setup(None).await);
    assert_eq!(guard.state(), SetupState::Complete);
    // 捕获“已初始化”之后仍然会配置参数
    assert_eq!(sub.counts(), (1, 1, 1));
}

#[tokio::test]
async fn typed_already_initialized_counts_as_success() {
    let sub = Arc::new(ScriptedSubsystem::with_setup_results(vec![Err(
        SubsystemError::AlreadyInitialized,
    )]));
    let guard = SetupGuard::new(Arc::clone(&sub));

    assert!(guard.ensure_setup(None).await);
    assert!(guard.is_ready());
    assert_eq!(sub.update_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_initialize_rolls_back_and_retries_from_scratch() {
    let sub = Arc::new(ScriptedSubsystem::with_setup_results(vec![Err(
        SubsystemError::OutputStream("no default output device".to_owned()),
    )]));
    let guard = SetupGuard::new(Arc::clone(&sub));

    assert!(!guard.ensure_setup(None).await);
    assert_eq!(guard.state(), SetupState::NotStarted);
    assert_eq!(sub.counts(), (1, 1, 0));

    assert!(guard.ensure_setup(None).await);
    assert_eq!(guard.state(), SetupState::Complete);
    assert_eq!(sub.counts(), (2, 2, 1));
}

#[tokio::test]
async fn failed_configure_rolls_back() {
    let sub = Arc::new(ScriptedSubsystem::default());
    sub.fail_update.store(true, Ordering::SeqCst);
    let guard = SetupGuard::new(Arc::clone(&sub));

    assert!(!guard.ensure_setup(None).await);
    assert_eq!(guard.state(), SetupState::NotStarted);
    assert_eq!(sub.counts(), (1, 1, 1));
}

#[tokio::test]
async fn state_query_short_circuits_when_already_running() {
    let sub = Arc::new(ScriptedSubsystem::default());
    sub.initialized.store(true, Ordering::SeqCst);
    let guard = SetupGuard::new(Arc::clone(&sub));

    assert!(guard.ensure_setup(None).await);
    assert_eq!(guard.state(), SetupState::Complete);
    assert_eq!(sub.counts(), (1, 0, 0));
}

#[tokio::test]
async fn invalid_options_fail_without_touching_subsystem() {
    let sub = Arc::new(ScriptedSubsystem::default());
    let guard = SetupGuard::new(Arc::clone(&sub));

    let overrides = SetupOverrides {
        min_buffer_ms: Some(100_000),
        ..SetupOverrides::default()
    };
    assert!(!guard.ensure_setup(Some(overrides)).await);
    assert_eq!(guard.state(), SetupState::NotStarted);
    assert_eq!(sub.counts(), (0, 0, 0));

    assert!(guard.ensure_setup(None).await);
}

#[tokio::test]
async fn reset_clears_state_even_when_subsystem_fails() {
    let sub = Arc::new(ScriptedSubsystem::default());
    let guard = SetupGuard::new(Arc::clone(&sub));
    assert!(guard.ensure_setup(None).await);

    sub.fail_reset.store(true, Ordering::SeqCst);
    assert!(!guard.reset().await);
    assert_eq!(guard.state(), SetupState::NotStarted);
    assert_eq!(sub.reset_calls.load(Ordering::SeqCst), 1);

    // 下一次 ensure_setup 会重新探测
    let (queries_before, _, _) = sub.counts();
    assert!(guard.ensure_setup(None).await);
    assert_eq!(sub.state_calls.load(Ordering::SeqCst), queries_before + 1);
}

#[tokio::test]
async fn reset_then_setup_initializes_again() {
    let sub = Arc::new(ScriptedSubsystem::default());
    let guard = SetupGuard::new(Arc::clone(&sub));

    assert!(guard.ensure_setup(None).await);
    assert!(guard.reset().await);
    assert_eq!(guard.state(), SetupState::NotStarted);

    assert!(guard.ensure_setup(None).await);
    assert_eq!(sub.counts(), (2, 2, 2));
}

#[tokio::test]
async fn attempt_in_flight_during_reset_does_not_complete_guard() {
    let (sub, gate) = ScriptedSubsystem::gated();
    let sub = Arc::new(sub);
    let guard = SetupGuard::new(Arc::clone(&sub));

    let driver = async {
        wait_for_state(&guard, SetupState::InProgress).await;
        assert!(guard.reset().await);
        assert_eq!(guard.state(), SetupState::NotStarted);
        gate.add_permits(1);
    };

    let (ok, ()) = tokio::join!(guard.ensure_setup(None), driver);

    // 旧尝试的调用方仍拿到它自己的结果，但守卫不会被改回 Complete
    assert!(ok);
    assert_eq!(guard.state(), SetupState::NotStarted);
}

#[tokio::test]
async fn dropped_caller_does_not_cancel_attempt() {
    let (sub, gate) = ScriptedSubsystem::gated();
    let sub = Arc::new(sub);
    let guard = SetupGuard::new(Arc::clone(&sub));

    let timed_out =
        tokio::time::timeout(Duration::from_millis(10), guard.ensure_setup(None)).await;
    assert!(timed_out.is_err());
    assert_eq!(guard.state(), SetupState::InProgress);

    gate.add_permits(1);
    assert!(guard.ensure_setup(None).await);
    assert_eq!(guard.state(), SetupState::Complete);
    assert_eq!(sub.setup_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn overrides_merge_over_guard_defaults() {
    let sub = Arc::new(ScriptedSubsystem::default());
    let defaults = SetupOptions {
        max_buffer_ms: 30_000,
        ..SetupOptions::default()
    };
    let guard = SetupGuard::with_defaults(Arc::clone(&sub), defaults);

    let overrides = SetupOverrides {
        min_buffer_ms: Some(5),
        ..SetupOverrides::default()
    };
    assert!(guard.ensure_setup(Some(overrides)).await);

    let applied = sub.setup_options.lock().unwrap()[0].clone();
    assert_eq!(applied.min_buffer_ms, 5);
    assert_eq!(applied.max_buffer_ms, 30_000);
    assert_eq!(applied.playback_buffer_ms, 2_500);
    // 覆盖项只作用于这次尝试，守卫的默认值不变
    assert_eq!(guard.defaults().min_buffer_ms, 15_000);
    assert_eq!(guard.defaults().max_buffer_ms, 30_000);
}

#[tokio::test]
async fn panicking_subsystem_rolls_back_and_allows_retry() {
    let sub = Arc::new(ScriptedSubsystem::default());
    sub.panic_setup.store(true, Ordering::SeqCst);
    let guard = SetupGuard::new(Arc::clone(&sub));

    assert!(!guard.ensure_setup(None).await);
    assert_eq!(guard.state(), SetupState::NotStarted);

    // 不需要 reset，下一次调用重新发起完整尝试
    assert!(guard.ensure_setup(None).await);
    assert_eq!(guard.state(), SetupState::Complete);
    assert_eq!(sub.setup_calls.load(Ordering::SeqCst), 2);
}
