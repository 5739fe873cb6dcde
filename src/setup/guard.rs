use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::options::{SetupOptions, SetupOverrides};
use super::state::{SetupOutcome, SetupState};
use crate::error::{SetupError, is_already_initialized};
use crate::subsystem::PlaybackSubsystem;

/// 进行中的初始化；所有并发调用方 await 同一个 Shared
type Attempt = Shared<BoxFuture<'static, bool>>;

struct InFlight {
    epoch: u64,
    attempt: Attempt,
}

/// 守卫的可变部分；只在短小的同步临界区内访问，不跨 await 持锁
#[derive(Default)]
struct Inner {
    state: SetupState,
    in_flight: Option<InFlight>,
    /// 每次发起尝试或 reset 都会递增；旧尝试完成时 epoch 不匹配则丢弃其结果
    epoch: u64,
}

/// 播放子系统的一次性初始化守卫
///
/// - `ensure_setup`：已完成则直接返回 true；进行中则加入同一次尝试；
///   否则发起唯一的一次尝试。
/// - `reset`：通知子系统清理，并无条件把本地状态清回 NotStarted。
///
/// 所有失败都只记录日志并以 `false` 返回，不会向调用方传播错误。
pub struct SetupGuard<S> {
    subsystem: Arc<S>,
    defaults: Arc<SetupOptions>,
    inner: Arc<Mutex<Inner>>,
}

impl<S> Clone for SetupGuard<S> {
    fn clone(&self) -> Self {
        Self {
            subsystem: Arc::clone(&self.subsystem),
            defaults: Arc::clone(&self.defaults),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PlaybackSubsystem> SetupGuard<S> {
    pub fn new(subsystem: Arc<S>) -> Self {
        Self::with_defaults(subsystem, SetupOptions::default())
    }

    /// 使用自定义默认参数（例如来自设置文件），调用方覆盖项在其之上合并
    pub fn with_defaults(subsystem: Arc<S>, defaults: SetupOptions) -> Self {
        Self {
            subsystem,
            defaults: Arc::new(defaults),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn subsystem(&self) -> &Arc<S> {
        &self.subsystem
    }

    pub fn defaults(&self) -> &SetupOptions {
        &self.defaults
    }

    pub fn state(&self) -> SetupState {
        lock(&self.inner).state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SetupState::Complete
    }

    /// 确保子系统已初始化，返回是否成功
    ///
    /// 完成之后再传入的覆盖项会被忽略。
    pub async fn ensure_setup(&self, overrides: Option<SetupOverrides>) -> bool {
        let attempt = {
            let mut inner = lock(&self.inner);
            if inner.state == SetupState::Complete {
                tracing::trace!("播放器已初始化，跳过");
                return true;
            }
            if let Some(in_flight) = inner.in_flight.as_ref() {
                tracing::debug!(epoch = in_flight.epoch, "加入进行中的初始化");
                in_flight.attempt.clone()
            } else {
                self.start_attempt(&mut inner, overrides.unwrap_or_default())
            }
        };
        attempt.await
    }

    /// 重置子系统；返回子系统自身的重置是否成功
    pub async fn reset(&self) -> bool {
        let result = self.subsystem.reset().await;

        {
            let mut inner = lock(&self.inner);
            inner.epoch = inner.epoch.wrapping_add(1);
            inner.state = SetupState::NotStarted;
            inner.in_flight = None;
        }

        match result {
            Ok(()) => {
                tracing::info!("播放器已重置");
                true
            }
            Err(e) => {
                tracing::warn!(err = %e, "重置播放器失败，本地状态仍已清空");
                false
            }
        }
    }

    /// 在持锁状态下发起新尝试并登记为进行中
    fn start_attempt(&self, inner: &mut Inner, overrides: SetupOverrides) -> Attempt {
        inner.epoch = inner.epoch.wrapping_add(1);
        let epoch = inner.epoch;

        let options = SetupOptions::clone(&self.defaults).merged(overrides);
        let subsystem = Arc::clone(&self.subsystem);
        let shared_inner = Arc::downgrade(&self.inner);

        tracing::info!(epoch, "开始初始化播放器");
        let attempt = async move {
            // 子系统 panic 按失败提交，进行中的尝试必须被清掉
            let setup = AssertUnwindSafe(run_setup(subsystem.as_ref(), &options));
            let ok = match setup.catch_unwind().await {
                Ok(Ok(outcome)) => {
                    tracing::info!(epoch, outcome = outcome.as_str(), "播放器初始化完成");
                    true
                }
                Ok(Err(e)) => {
                    tracing::error!(epoch, err = %e, "播放器初始化失败");
                    false
                }
                Err(_) => {
                    tracing::error!(epoch, "播放器初始化过程中子系统 panic");
                    false
                }
            };
            commit(&shared_inner, epoch, ok);
            ok
        }
        .boxed()
        .shared();

        inner.state = SetupState::InProgress;
        inner.in_flight = Some(InFlight {
            epoch,
            attempt: attempt.clone(),
        });
        attempt
    }
}

/// 探测 -> 初始化 -> 配置
async fn run_setup<S: PlaybackSubsystem>(
    subsystem: &S,
    options: &SetupOptions,
) -> Result<SetupOutcome, SetupError> {
    options.validate()?;

    match subsystem.state().await {
        Ok(state) => {
            tracing::debug!(state = %state, "子系统已在运行，跳过初始化");
            return Ok(SetupOutcome::AlreadyRunning);
        }
        // 从未初始化过的子系统探测会失败，这不是错误
        Err(e) => tracing::debug!(err = %e, "探测失败，视为尚未初始化"),
    }

    let outcome = match subsystem.setup_player(options).await {
        Ok(()) => SetupOutcome::Initialized,
        Err(e) if is_already_initialized(&e) => {
            tracing::info!(err = %e, "子系统报告已初始化，视为成功");
            SetupOutcome::AlreadyInitialized
        }
        Err(e) => return Err(SetupError::Initialize(e)),
    };

    subsystem
        .update_options(options)
        .await
        .map_err(SetupError::Configure)?;

    Ok(outcome)
}

fn commit(inner: &Weak<Mutex<Inner>>, epoch: u64, ok: bool) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut inner = lock(&inner);
    if inner.epoch != epoch {
        tracing::debug!(
            epoch,
            current_epoch = inner.epoch,
            ok,
            "初始化期间发生过 reset，丢弃旧结果"
        );
        return;
    }
    inner.in_flight = None;
    inner.state = if ok {
        SetupState::Complete
    } else {
        SetupState::NotStarted
    };
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
