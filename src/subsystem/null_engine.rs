use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{PlaybackState, PlaybackSubsystem};
use crate::error::SubsystemError;
use crate::setup::SetupOptions;

#[derive(Debug, Default)]
struct NullState {
    options: Option<SetupOptions>,
    playing: bool,
}

/// 无音频设备的子系统：契约与 rodio 实现一致，只记录内存状态
#[derive(Debug, Default)]
pub struct NullSubsystem {
    state: Mutex<NullState>,
}

impl NullSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前生效的参数；未初始化时为 None
    pub fn options(&self) -> Option<SetupOptions> {
        self.lock().options.clone()
    }

    /// 只校验文件可读，不真正播放；之后一直报告 Playing，直到 reset
    pub async fn play_file(&self, path: &Path) -> Result<Option<u64>, SubsystemError> {
        if self.lock().options.is_none() {
            return Err(SubsystemError::NotInitialized);
        }
        std::fs::metadata(path).map_err(|source| SubsystemError::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;
        self.lock().playing = true;
        tracing::info!(path = %path.display(), "无音频输出，跳过播放");
        Ok(None)
    }

    fn lock(&self) -> MutexGuard<'_, NullState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlaybackSubsystem for NullSubsystem {
    async fn state(&self) -> Result<PlaybackState, SubsystemError> {
        let current = self.lock();
        match (&current.options, current.playing) {
            (None, _) => Err(SubsystemError::NotInitialized),
            (Some(_), true) => Ok(PlaybackState::Playing),
            (Some(_), false) => Ok(PlaybackState::Ready),
        }
    }

    async fn setup_player(&self, options: &SetupOptions) -> Result<(), SubsystemError> {
        let mut current = self.lock();
        if current.options.is_some() {
            return Err(SubsystemError::AlreadyInitialized);
        }
        current.options = Some(options.clone());
        tracing::info!("NullSubsystem 已初始化");
        Ok(())
    }

    async fn update_options(&self, options: &SetupOptions) -> Result<(), SubsystemError> {
        let mut current = self.lock();
        let Some(slot) = current.options.as_mut() else {
            return Err(SubsystemError::NotInitialized);
        };
        *slot = options.clone();
        Ok(())
    }

    async fn reset(&self) -> Result<(), SubsystemError> {
        *self.lock() = NullState::default();
        Ok(())
    }
}
