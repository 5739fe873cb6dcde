//! 播放子系统：守卫驱动的外部有状态协作方
//!
//! - `RodioSubsystem`：独立音频线程持有 rodio 输出流
//! - `NullSubsystem`：无音频设备，仅内存状态（`--no-audio` / 测试）

mod engine;
mod messages;
mod null_engine;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::Path;

use crate::error::SubsystemError;
use crate::setup::SetupOptions;

pub use engine::RodioSubsystem;
pub use null_engine::NullSubsystem;

/// 子系统初始化之后的播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// 已初始化，当前没有音频
    Ready,
    Playing,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackState::Ready => "ready",
            PlaybackState::Playing => "playing",
        })
    }
}

/// 初始化守卫所依赖的子系统操作
///
/// 每个操作都可能挂起；实现方需要保证返回的 future 是 `Send`。
pub trait PlaybackSubsystem: Send + Sync + 'static {
    /// 查询当前状态；从未初始化时返回 `SubsystemError::NotInitialized`
    fn state(&self) -> impl Future<Output = Result<PlaybackState, SubsystemError>> + Send;

    /// 初始化；重复调用时返回“已初始化”错误
    fn setup_player(
        &self,
        options: &SetupOptions,
    ) -> impl Future<Output = Result<(), SubsystemError>> + Send;

    /// 更新能力/通知等参数，要求已初始化
    fn update_options(
        &self,
        options: &SetupOptions,
    ) -> impl Future<Output = Result<(), SubsystemError>> + Send;

    /// 清理内部状态，回到未初始化
    fn reset(&self) -> impl Future<Output = Result<(), SubsystemError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioBackend {
    Real,
    Null,
}

impl AudioBackend {
    pub fn spawn(self) -> AnySubsystem {
        match self {
            AudioBackend::Real => AnySubsystem::Rodio(RodioSubsystem::spawn()),
            AudioBackend::Null => AnySubsystem::Null(NullSubsystem::new()),
        }
    }
}

/// 运行时选择的子系统
#[derive(Debug)]
pub enum AnySubsystem {
    Rodio(RodioSubsystem),
    Null(NullSubsystem),
}

impl AnySubsystem {
    pub fn backend(&self) -> AudioBackend {
        match self {
            AnySubsystem::Rodio(_) => AudioBackend::Real,
            AnySubsystem::Null(_) => AudioBackend::Null,
        }
    }

    /// 播放本地文件（追加到已初始化的输出上），返回时长
    pub async fn play_file(&self, path: &Path) -> Result<Option<u64>, SubsystemError> {
        match self {
            AnySubsystem::Rodio(s) => s.play_file(path).await,
            AnySubsystem::Null(s) => s.play_file(path).await,
        }
    }
}

impl PlaybackSubsystem for AnySubsystem {
    async fn state(&self) -> Result<PlaybackState, SubsystemError> {
        match self {
            AnySubsystem::Rodio(s) => s.state().await,
            AnySubsystem::Null(s) => s.state().await,
        }
    }

    async fn setup_player(&self, options: &SetupOptions) -> Result<(), SubsystemError> {
        match self {
            AnySubsystem::Rodio(s) => s.setup_player(options).await,
            AnySubsystem::Null(s) => s.setup_player(options).await,
        }
    }

    async fn update_options(&self, options: &SetupOptions) -> Result<(), SubsystemError> {
        match self {
            AnySubsystem::Rodio(s) => s.update_options(options).await,
            AnySubsystem::Null(s) => s.update_options(options).await,
        }
    }

    async fn reset(&self) -> Result<(), SubsystemError> {
        match self {
            AnySubsystem::Rodio(s) => s.reset().await,
            AnySubsystem::Null(s) => s.reset().await,
        }
    }
}
