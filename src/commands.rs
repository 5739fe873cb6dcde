//! CLI 子命令的实际逻辑（放在库里以便用 NullSubsystem 测试）

use futures_util::future::join_all;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::error::AppError;
use crate::setup::{SetupGuard, SetupOverrides, SetupState};
use crate::subsystem::{AnySubsystem, PlaybackState, PlaybackSubsystem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    /// 每个调用方拿到的结果，按调用顺序
    pub results: Vec<bool>,
    pub state: SetupState,
}

/// 在同一个任务里并发发起 `callers` 个 ensure_setup
pub async fn concurrent_setup<S: PlaybackSubsystem>(
    guard: &SetupGuard<S>,
    callers: usize,
    overrides: SetupOverrides,
) -> SetupReport {
    let overrides = (!overrides.is_empty()).then_some(overrides);
    let calls = (0..callers.max(1)).map(|_| guard.ensure_setup(overrides.clone()));
    let results = join_all(calls).await;
    SetupReport {
        results,
        state: guard.state(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub first: bool,
    pub reset: bool,
    pub state_after_reset: SetupState,
    pub second: bool,
    pub state: SetupState,
}

pub async fn setup_reset_cycle<S: PlaybackSubsystem>(
    guard: &SetupGuard<S>,
    overrides: SetupOverrides,
) -> CycleReport {
    let overrides = (!overrides.is_empty()).then_some(overrides);
    let first = guard.ensure_setup(overrides.clone()).await;
    let reset = guard.reset().await;
    let state_after_reset = guard.state();
    let second = guard.ensure_setup(overrides).await;
    CycleReport {
        first,
        reset,
        state_after_reset,
        second,
        state: guard.state(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayReport {
    pub duration_ms: Option<u64>,
    pub interrupted: bool,
}

/// 初始化 -> 播放 -> 轮询直到空闲或 `stop` 完成 -> reset
pub async fn play_until_idle(
    guard: &SetupGuard<AnySubsystem>,
    path: &Path,
    overrides: SetupOverrides,
    poll: Duration,
    stop: impl Future<Output = ()>,
) -> Result<PlayReport, AppError> {
    let overrides = (!overrides.is_empty()).then_some(overrides);
    if !guard.ensure_setup(overrides).await {
        return Err(AppError::Other(
            "音频子系统初始化失败，详见日志".to_owned(),
        ));
    }

    let duration_ms = match guard.subsystem().play_file(path).await {
        Ok(v) => v,
        Err(e) => {
            guard.reset().await;
            return Err(e.into());
        }
    };

    tokio::pin!(stop);
    let interrupted = loop {
        tokio::select! {
            _ = &mut stop => break true,
            _ = tokio::time::sleep(poll) => {
                match guard.subsystem().state().await {
                    Ok(PlaybackState::Playing) => {}
                    Ok(PlaybackState::Ready) => break false,
                    Err(e) => {
                        tracing::warn!(err = %e, "播放中查询状态失败");
                        break false;
                    }
                }
            }
        }
    };

    guard.reset().await;
    Ok(PlayReport {
        duration_ms,
        interrupted,
    })
}
