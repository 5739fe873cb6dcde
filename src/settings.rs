use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::SettingsError;
use crate::setup::{SetupOptions, SetupOverrides};

/// 持久化设置：目前只有初始化参数的默认覆盖项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub setup: SetupOverrides,
}

impl AppSettings {
    /// 库默认值叠加设置文件后的初始化参数
    pub fn setup_defaults(&self) -> SetupOptions {
        SetupOptions::default().merged(self.setup.clone())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.setup_defaults()
            .validate()
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))
    }
}

/// 读取设置；文件不存在时返回默认值
///
/// 读取失败、JSON 损坏或取值无效都作为错误返回，由调用方决定是否回退。
pub fn load_settings(data_dir: &Path) -> Result<AppSettings, SettingsError> {
    let p = settings_path(data_dir);
    let bytes = match fs::read(&p) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(AppSettings::default()),
        Err(source) => return Err(SettingsError::Load { source }),
    };
    let settings: AppSettings =
        serde_json::from_slice(&bytes).map_err(|source| SettingsError::Parse { source })?;
    settings.validate()?;
    Ok(settings)
}

pub fn save_settings(data_dir: &Path, s: &AppSettings) -> Result<(), SettingsError> {
    fs::create_dir_all(data_dir).map_err(|source| SettingsError::Save { source })?;
    let p = settings_path(data_dir);
    let tmp = p.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(s).unwrap_or_else(|_| b"{}".to_vec());
    fs::write(&tmp, bytes).map_err(|source| SettingsError::Save { source })?;
    if let Err(e) = fs::rename(&tmp, &p) {
        let _ = fs::remove_file(&p);
        fs::rename(&tmp, &p).map_err(|_| SettingsError::Save { source: e })?;
    }
    Ok(())
}

/// 默认数据目录：系统 data_local_dir，不可用时退回临时目录
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "player", "player-bootstrap")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("player-bootstrap"))
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}
