use std::time::Duration;

/// 浏览器获取方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrowserMode {
    /// 连接到已经以远程调试端口启动的 Chrome
    Connect,
    /// 由程序自己启动 Chrome
    Launch,
}

impl BrowserMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "connect" => Some(BrowserMode::Connect),
            "launch" => Some(BrowserMode::Launch),
            _ => None,
        }
    }
}

/// 遇到题库里没有的新问题时的处理方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptMode {
    /// 在控制台询问操作员
    Interactive,
    /// 直接跳过（适合无人值守）
    Skip,
}

impl PromptMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "interactive" => Some(PromptMode::Interactive),
            "skip" => Some(PromptMode::Skip),
            _ => None,
        }
    }
}

/// 程序运行配置
///
/// 候选人信息（账号、薪资、职位等）在候选人配置文件里，
/// 这里只放和运行环境相关的参数。
#[derive(Clone, Debug)]
pub struct Config {
    /// 候选人配置文件路径，未设置时从 `config_dir` 中选择
    pub candidate_config: Option<String>,
    /// 候选人配置目录
    pub config_dir: String,
    /// 浏览器获取方式
    pub browser_mode: BrowserMode,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 自行启动时使用的 Chrome 路径
    pub chrome_executable: Option<String>,
    /// 自行启动时使用的用户数据目录（保留登录状态）
    pub chrome_user_data_dir: Option<String>,
    /// 自行启动时是否无头
    pub headless: bool,
    /// 站点根地址
    pub site_url: String,
    /// 结果 CSV 和问答 CSV 所在目录
    pub output_dir: String,
    /// 日志目录
    pub log_dir: String,
    /// 选择器覆盖文件（TOML）
    pub selectors_file: Option<String>,
    /// 单个职位表单最多走多少步
    pub max_form_steps: usize,
    /// 单个职位表单的总时限（秒）
    pub step_deadline_secs: u64,
    /// 等待操作员回答的时限（秒）
    pub prompt_timeout_secs: u64,
    /// 新问题处理方式
    pub prompt_mode: PromptMode,
    /// 每组 职位×地点 最多翻多少页
    pub max_search_pages: usize,
    /// 本次运行最多成功投递多少个职位
    pub max_applications: usize,
    /// 等待职位卡片出现的时限（秒）
    pub card_wait_secs: u64,
    /// 每次页面操作后的等待（毫秒）
    pub settle_millis: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            candidate_config: None,
            config_dir: "configs".to_string(),
            browser_mode: BrowserMode::Connect,
            browser_debug_port: 9222,
            chrome_executable: None,
            chrome_user_data_dir: None,
            headless: false,
            site_url: "https://www.linkedin.com".to_string(),
            output_dir: "output/applications".to_string(),
            log_dir: "output/logs".to_string(),
            selectors_file: None,
            max_form_steps: 12,
            step_deadline_secs: 180,
            prompt_timeout_secs: 120,
            prompt_mode: PromptMode::Interactive,
            max_search_pages: 10,
            max_applications: 100,
            card_wait_secs: 30,
            settle_millis: 2000,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            candidate_config: std::env::var("CANDIDATE_CONFIG").ok(),
            config_dir: std::env::var("CONFIG_DIR").unwrap_or(default.config_dir),
            browser_mode: std::env::var("BROWSER_MODE").ok().and_then(|v| BrowserMode::parse(&v)).unwrap_or(default.browser_mode),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok(),
            chrome_user_data_dir: std::env::var("CHROME_USER_DATA_DIR").ok(),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            site_url: std::env::var("SITE_URL").unwrap_or(default.site_url),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            log_dir: std::env::var("LOG_DIR").unwrap_or(default.log_dir),
            selectors_file: std::env::var("SELECTORS_FILE").ok(),
            max_form_steps: std::env::var("MAX_FORM_STEPS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_form_steps),
            step_deadline_secs: std::env::var("STEP_DEADLINE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.step_deadline_secs),
            prompt_timeout_secs: std::env::var("PROMPT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.prompt_timeout_secs),
            prompt_mode: std::env::var("PROMPT_MODE").ok().and_then(|v| PromptMode::parse(&v)).unwrap_or(default.prompt_mode),
            max_search_pages: std::env::var("MAX_SEARCH_PAGES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_search_pages),
            max_applications: std::env::var("MAX_APPLICATIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_applications),
            card_wait_secs: std::env::var("CARD_WAIT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.card_wait_secs),
            settle_millis: std::env::var("SETTLE_MILLIS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.settle_millis),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }

    pub fn step_deadline(&self) -> Duration {
        Duration::from_secs(self.step_deadline_secs)
    }

    pub fn card_wait(&self) -> Duration {
        Duration::from_secs(self.card_wait_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }
}
