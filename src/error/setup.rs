//! 初始化流程错误（仅在守卫内部流转并记录日志）

use super::SubsystemError;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// 合并后的参数不合法
    #[error("初始化参数无效: {0}")]
    InvalidOptions(String),

    /// 子系统初始化失败（不含“已初始化”信号）
    #[error("播放器初始化失败: {0}")]
    Initialize(#[source] SubsystemError),

    /// 子系统参数/能力配置失败
    #[error("播放器参数配置失败: {0}")]
    Configure(#[source] SubsystemError),
}
