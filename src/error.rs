use thiserror::Error;

/// 应用程序错误类型
///
/// 只用于启动阶段的致命错误（配置、浏览器、文件），
/// 单个职位的失败不会走到这里，而是降级为对应的终态结果。
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// YAML / TOML 解析失败
    #[error("解析文件失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 候选人配置缺少必填字段
    #[error("候选人配置 {path} 缺少必填字段 `{key}`")]
    MissingField { path: String, key: String },
    /// 字段值非法
    #[error("候选人配置 {path} 字段 `{key}` 非法: {reason}")]
    InvalidField {
        path: String,
        key: String,
        reason: String,
    },
    /// 配置目录中没有候选人配置
    #[error("目录 {dir} 中没有找到 YAML/TOML 候选人配置")]
    NoProfiles { dir: String },
    /// 用户选择了不存在的配置编号
    #[error("无效的选择: {input}")]
    InvalidSelection { input: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件解析错误
    pub fn file_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建缺少必填字段错误
    pub fn missing_field(path: impl Into<String>, key: impl Into<String>) -> Self {
        AppError::Config(ConfigError::MissingField {
            path: path.into(),
            key: key.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_the_key() {
        let err = AppError::missing_field("configs/alice.yaml", "phone_number");
        let msg = err.to_string();
        assert!(msg.contains("phone_number"));
        assert!(msg.contains("configs/alice.yaml"));
    }

    #[test]
    fn test_browser_error_keeps_port() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = AppError::browser_connection_failed(9222, io);
        assert!(err.to_string().contains("9222"));
    }
}
