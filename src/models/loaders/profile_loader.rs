use std::io::BufRead;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::models::profile::{CandidateProfile, RawProfile};

const PROFILE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "toml"];

/// 从 YAML 或 TOML 文件加载候选人配置并检查必填字段
///
/// 按扩展名选择解析器，`.toml` 以外一律按 YAML 处理。
pub async fn load_profile(path: &Path) -> AppResult<CandidateProfile> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(display.clone(), e))?;

    let raw: RawProfile = if extension_of(path).as_deref() == Some("toml") {
        toml::from_str(&content).map_err(|e| AppError::file_parse_failed(display.clone(), e))?
    } else {
        serde_yaml::from_str(&content).map_err(|e| AppError::file_parse_failed(display.clone(), e))?
    };

    raw.validate(&display)
}

/// 列出目录下所有候选人配置文件（按文件名排序）
pub async fn list_profiles(dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: dir.display().to_string(),
        }
        .into());
    }

    let mut profiles = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| AppError::file_read_failed(dir.display().to_string(), e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(dir.display().to_string(), e))?
    {
        let path = entry.path();
        let matches = extension_of(&path)
            .map(|ext| PROFILE_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        if matches && path.is_file() {
            profiles.push(path);
        }
    }

    profiles.sort();
    Ok(profiles)
}

/// 根据操作员输入（从 1 开始的编号）挑选配置
///
/// 只有一个配置时直接使用，不看输入。
pub fn pick_profile(profiles: &[PathBuf], input: Option<&str>) -> AppResult<PathBuf> {
    match profiles {
        [] => Err(ConfigError::NoProfiles {
            dir: String::new(),
        }
        .into()),
        [only] => Ok(only.clone()),
        _ => {
            let raw = input.unwrap_or("").trim();
            let index = raw
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=profiles.len()).contains(n))
                .ok_or_else(|| ConfigError::InvalidSelection {
                    input: raw.to_string(),
                })?;
            Ok(profiles[index - 1].clone())
        }
    }
}

/// 确定本次使用的候选人配置
///
/// `CANDIDATE_CONFIG` 优先，否则列出 `CONFIG_DIR` 中的文件让操作员选择。
///
/// # 返回
/// 配置文件路径和校验后的候选人配置
pub async fn select_profile(config: &Config) -> AppResult<(PathBuf, CandidateProfile)> {
    if let Some(path) = &config.candidate_config {
        let path = PathBuf::from(path);
        if !path.is_file() {
            return Err(FileError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let profile = load_profile(&path).await?;
        info!("📋 使用候选人配置: {}", path.display());
        return Ok((path, profile));
    }

    let dir = Path::new(&config.config_dir);
    let profiles = list_profiles(dir).await?;
    if profiles.is_empty() {
        return Err(ConfigError::NoProfiles {
            dir: config.config_dir.clone(),
        }
        .into());
    }

    let input = if profiles.len() > 1 {
        Some(ask_for_selection(&profiles).await?)
    } else {
        None
    };
    let path = pick_profile(&profiles, input.as_deref())?;
    let profile = load_profile(&path).await?;
    info!("📋 使用候选人配置: {}", path.display());
    Ok((path, profile))
}

async fn ask_for_selection(profiles: &[PathBuf]) -> AppResult<String> {
    let mut menu = String::from("\n可用的候选人配置:\n");
    for (i, path) in profiles.iter().enumerate() {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        menu.push_str(&format!("  {}. {}\n", i + 1, name));
    }
    menu.push_str("请选择编号: ");

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(menu.as_bytes())
        .await
        .map_err(|e| AppError::Other(format!("写入终端失败: {}", e)))?;
    stdout
        .flush()
        .await
        .map_err(|e| AppError::Other(format!("写入终端失败: {}", e)))?;

    // 阻塞读放在独立线程里，等待中途被取消时不会拖住运行时退出
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line).map(|_| line);
        let _ = tx.send(read);
    });
    rx.await
        .map_err(|_| AppError::Other("读取输入失败: 输入线程已退出".to_string()))?
        .map_err(|e| AppError::Other(format!("读取输入失败: {}", e)))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}
