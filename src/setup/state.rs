use std::fmt;

/// 初始化守卫的状态
///
/// 只会 NotStarted -> InProgress -> Complete 单调前进；失败回到 NotStarted，
/// `reset` 无条件回到 NotStarted。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SetupState {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

impl fmt::Display for SetupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SetupState::NotStarted => "not-started",
            SetupState::InProgress => "in-progress",
            SetupState::Complete => "complete",
        })
    }
}

/// 一次成功的初始化是如何完成的（仅用于日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetupOutcome {
    /// 探测到子系统已在运行，直接短路
    AlreadyRunning,
    /// 新初始化 + 配置
    Initialized,
    /// 初始化报告“已初始化”，视为成功后继续配置
    AlreadyInitialized,
}

impl SetupOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SetupOutcome::AlreadyRunning => "already-running",
            SetupOutcome::Initialized => "initialized",
            SetupOutcome::AlreadyInitialized => "already-initialized",
        }
    }
}
