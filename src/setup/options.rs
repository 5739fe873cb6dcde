//! 播放器初始化参数
//!
//! `SetupOptions` 是完整的参数表（全部带默认值）；`SetupOverrides` 是调用方
//! 提供的局部覆盖，合并时调用方优先。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SetupError;

/// 媒体控制能力（通知栏/锁屏/耳机按键）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Play,
    Pause,
    Stop,
    SkipToNext,
    SkipToPrevious,
    SeekTo,
    JumpForward,
    JumpBackward,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::Play,
        Capability::Pause,
        Capability::Stop,
        Capability::SkipToNext,
        Capability::SkipToPrevious,
        Capability::SeekTo,
        Capability::JumpForward,
        Capability::JumpBackward,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Play => "play",
            Capability::Pause => "pause",
            Capability::Stop => "stop",
            Capability::SkipToNext => "skip-to-next",
            Capability::SkipToPrevious => "skip-to-previous",
            Capability::SeekTo => "seek-to",
            Capability::JumpForward => "jump-forward",
            Capability::JumpBackward => "jump-backward",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("未知的能力: {s}"))
    }
}

/// 通知栏样式
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStyle {
    /// 强调色，形如 `#RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    /// 小图标资源名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// 应用被系统杀掉后的行为（Android）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppKilledBehavior {
    #[default]
    ContinuePlayback,
    PausePlayback,
    StopPlaybackAndRemoveNotification,
}

/// 音频会话类别（iOS）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IosCategory {
    #[default]
    Playback,
    PlayAndRecord,
    Ambient,
    SoloAmbient,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidOptions {
    #[serde(default)]
    pub app_killed_behavior: AppKilledBehavior,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IosOptions {
    #[serde(default)]
    pub category: IosCategory,
}

/// 完整的初始化参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupOptions {
    /// 最少缓冲时长
    pub min_buffer_ms: u64,
    /// 最多缓冲时长
    pub max_buffer_ms: u64,
    /// 起播阈值：缓冲到这么多才开始播放
    pub playback_buffer_ms: u64,
    /// 是否等缓冲满足阈值后再播放
    pub wait_for_buffer: bool,
    pub capabilities: Vec<Capability>,
    pub compact_capabilities: Vec<Capability>,
    pub notification: NotificationStyle,
    pub android: AndroidOptions,
    pub ios: IosOptions,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            min_buffer_ms: 15_000,
            max_buffer_ms: 50_000,
            playback_buffer_ms: 2_500,
            wait_for_buffer: true,
            capabilities: vec![
                Capability::Play,
                Capability::Pause,
                Capability::Stop,
                Capability::SkipToNext,
                Capability::SkipToPrevious,
                Capability::SeekTo,
            ],
            compact_capabilities: vec![
                Capability::Play,
                Capability::Pause,
                Capability::SkipToNext,
            ],
            notification: NotificationStyle::default(),
            android: AndroidOptions::default(),
            ios: IosOptions::default(),
        }
    }
}

impl SetupOptions {
    /// 把覆盖项合并到当前参数上，冲突键以覆盖项为准
    pub fn merged(mut self, overrides: SetupOverrides) -> Self {
        let SetupOverrides {
            min_buffer_ms,
            max_buffer_ms,
            playback_buffer_ms,
            wait_for_buffer,
            capabilities,
            compact_capabilities,
            notification,
            android,
            ios,
        } = overrides;

        if let Some(v) = min_buffer_ms {
            self.min_buffer_ms = v;
        }
        if let Some(v) = max_buffer_ms {
            self.max_buffer_ms = v;
        }
        if let Some(v) = playback_buffer_ms {
            self.playback_buffer_ms = v;
        }
        if let Some(v) = wait_for_buffer {
            self.wait_for_buffer = v;
        }
        if let Some(v) = capabilities {
            self.capabilities = v;
        }
        if let Some(v) = compact_capabilities {
            self.compact_capabilities = v;
        }
        if let Some(v) = notification {
            self.notification = v;
        }
        if let Some(v) = android {
            self.android = v;
        }
        if let Some(v) = ios {
            self.ios = v;
        }
        self
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.max_buffer_ms == 0 {
            return Err(SetupError::InvalidOptions(
                "max_buffer_ms 必须大于 0".to_owned(),
            ));
        }
        if self.min_buffer_ms > self.max_buffer_ms {
            return Err(SetupError::InvalidOptions(format!(
                "min_buffer_ms({}) 大于 max_buffer_ms({})",
                self.min_buffer_ms, self.max_buffer_ms
            )));
        }
        if self.playback_buffer_ms > self.max_buffer_ms {
            return Err(SetupError::InvalidOptions(format!(
                "playback_buffer_ms({}) 大于 max_buffer_ms({})",
                self.playback_buffer_ms, self.max_buffer_ms
            )));
        }
        Ok(())
    }
}

/// 调用方提供的局部覆盖；缺省的键保持默认值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_buffer_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_buffer_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_buffer_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_buffer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<Capability>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact_capabilities: Option<Vec<Capability>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios: Option<IosOptions>,
}

impl SetupOverrides {
    pub fn is_empty(&self) -> bool {
        self == &SetupOverrides::default()
    }

    /// 叠加另一层覆盖（`other` 优先）
    pub fn layered(self, other: SetupOverrides) -> SetupOverrides {
        SetupOverrides {
            min_buffer_ms: other.min_buffer_ms.or(self.min_buffer_ms),
            max_buffer_ms: other.max_buffer_ms.or(self.max_buffer_ms),
            playback_buffer_ms: other.playback_buffer_ms.or(self.playback_buffer_ms),
            wait_for_buffer: other.wait_for_buffer.or(self.wait_for_buffer),
            capabilities: other.capabilities.or(self.capabilities),
            compact_capabilities: other.compact_capabilities.or(self.compact_capabilities),
            notification: other.notification.or(self.notification),
            android: other.android.or(self.android),
            ios: other.ios.or(self.ios),
        }
    }
}
