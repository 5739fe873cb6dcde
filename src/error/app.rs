//! 应用通用错误

use super::SubsystemError;

/// 应用通用错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 序列化错误
    #[error("JSON 序列化失败: {0}")]
    Serde(#[from] serde_json::Error),

    /// 设置错误
    #[error("设置错误: {0}")]
    Settings(#[from] SettingsError),

    /// 播放子系统错误
    #[error("音频错误: {0}")]
    Subsystem(#[from] SubsystemError),

    /// 其他错误
    #[error("{0}")]
    Other(String),
}

/// 设置相关错误
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// 加载设置失败
    #[error("加载设置失败: {source}")]
    Load {
        #[source]
        source: std::io::Error,
    },

    /// 保存设置失败
    #[error("保存设置失败: {source}")]
    Save {
        #[source]
        source: std::io::Error,
    },

    /// 解析设置失败
    #[error("解析设置失败: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    /// 设置值无效
    #[error("设置值无效: {0}")]
    InvalidValue(String),
}
