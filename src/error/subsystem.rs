//! 播放子系统（协作方）错误

use std::path::PathBuf;

/// 协作方在报告“重复初始化”时使用的消息片段
const ALREADY_INITIALIZED_PATTERN: &str = "already been initialized";

/// 播放子系统错误类型
#[derive(Debug, thiserror::Error)]
pub enum SubsystemError {
    /// 尚未初始化（探测/配置时）
    #[error("播放器尚未初始化")]
    NotInitialized,

    /// 重复初始化
    #[error("播放器已经初始化过了")]
    AlreadyInitialized,

    /// 音频输出流创建失败
    #[error("创建音频输出流失败: {0}")]
    OutputStream(String),

    /// 打开音频文件失败
    #[error("打开音频文件失败({}): {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解码音频失败
    #[error("解码音频失败({}): {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 音频线程已退出
    #[error("音频线程已断开")]
    Disconnected,

    /// 协作方返回的无类型错误消息
    #[error("{0}")]
    Rejected(String),
}

/// 判断初始化失败是否只是“已经初始化过”
///
/// 类型化的 `AlreadyInitialized` 直接命中；只有消息字符串的 `Rejected`
/// 退化为大小写不敏感的子串匹配。这个启发式只应存在于这里。
pub fn is_already_initialized(err: &SubsystemError) -> bool {
    match err {
        SubsystemError::AlreadyInitialized => true,
        SubsystemError::Rejected(msg) => msg
            .to_ascii_lowercase()
            .contains(ALREADY_INITIALIZED_PATTERN),
        _ => false,
    }
}
