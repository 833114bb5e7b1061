use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult, ConfigError};

/// 上传文件配置，键名沿用配置文件里的写法
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Uploads {
    #[serde(rename = "Resume", default)]
    pub resume: Option<String>,
    #[serde(rename = "Cover Letter", default)]
    pub cover_letter: Option<String>,
}

/// 规则表里可配置的默认回答
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultAnswers {
    #[serde(default = "default_no", deserialize_with = "deserialize_scalar_or")]
    pub sponsorship: String,
    #[serde(default = "default_no", deserialize_with = "deserialize_scalar_or")]
    pub clearance: String,
    #[serde(default = "default_years", deserialize_with = "deserialize_scalar_or")]
    pub years_experience: String,
}

impl Default for DefaultAnswers {
    fn default() -> Self {
        Self {
            sponsorship: default_no(),
            clearance: default_no(),
            years_experience: default_years(),
        }
    }
}

fn default_no() -> String {
    "No".to_string()
}

fn default_years() -> String {
    "3".to_string()
}

fn default_date_posted() -> String {
    "r86400".to_string()
}

/// 配置文件的原始形态，必填字段在这里仍是 Option，由 `validate` 检查
#[derive(Debug, Clone, Deserialize)]
pub struct RawProfile {
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub salary: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub rate: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub gender: Option<String>,
    #[serde(default)]
    pub uploads: Option<Uploads>,
    #[serde(default)]
    pub roletype: Option<Vec<u8>>,
    #[serde(default)]
    pub locations: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub positions: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub experience_level: Option<Vec<u8>>,
    #[serde(default)]
    pub blacklist: Option<Vec<String>>,
    #[serde(rename = "blackListTitles", default)]
    pub black_list_titles: Option<Vec<String>>,
    #[serde(default)]
    pub date_posted: Option<String>,
    #[serde(default)]
    pub answers: Option<DefaultAnswers>,
}

/// 校验后的候选人配置
#[derive(Debug, Clone)]
pub struct CandidateProfile {
    pub username: String,
    pub password: String,
    pub phone_number: String,
    pub salary: String,
    pub rate: String,
    pub gender: String,
    pub uploads: Uploads,
    pub roletype: Vec<u8>,
    pub locations: Vec<String>,
    pub positions: Vec<String>,
    pub experience_level: Vec<u8>,
    /// 公司黑名单（匹配职位卡片文本）
    pub blacklist: Vec<String>,
    /// 职位标题黑名单
    pub black_list_titles: Vec<String>,
    pub date_posted: String,
    pub answers: DefaultAnswers,
}

impl RawProfile {
    /// 检查必填字段，缺失或为空时返回指明字段名的错误
    pub fn validate(self, path: &str) -> AppResult<CandidateProfile> {
        let required = |key: &str, value: Option<String>| -> AppResult<String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(AppError::missing_field(path, key)),
            }
        };

        let username = required("username", self.username)?;
        let password = required("password", self.password)?;
        let phone_number = required("phone_number", self.phone_number)?;
        let salary = required("salary", self.salary)?;
        let rate = required("rate", self.rate)?;
        let gender = required("gender", self.gender)?;

        let roletype = self.roletype.unwrap_or_default();
        if let Some(bad) = roletype.iter().find(|t| !(1..=3).contains(*t)) {
            return Err(AppError::Config(ConfigError::InvalidField {
                path: path.to_string(),
                key: "roletype".to_string(),
                reason: format!("只允许 1/2/3，实际为 {}", bad),
            }));
        }

        Ok(CandidateProfile {
            username,
            password,
            phone_number,
            salary,
            rate,
            gender,
            uploads: self.uploads.unwrap_or_default(),
            roletype,
            locations: flatten_list(self.locations),
            positions: flatten_list(self.positions),
            experience_level: self.experience_level.unwrap_or_default(),
            blacklist: self.blacklist.unwrap_or_default(),
            black_list_titles: self.black_list_titles.unwrap_or_default(),
            date_posted: self.date_posted.unwrap_or_else(default_date_posted),
            answers: self.answers.unwrap_or_default(),
        })
    }
}

fn flatten_list(values: Option<Vec<Option<String>>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl CandidateProfile {
    /// 结果 CSV 文件名
    pub fn result_file_name(&self) -> String {
        format!("Output_of_{}.csv", self.username)
    }

    /// 问答 CSV 文件名
    pub fn qa_file_name(&self) -> String {
        format!("qa_{}.csv", self.username)
    }

    /// 简历的绝对路径（文件不存在时为 None）
    pub fn resume_path(&self, base_dir: &Path) -> Option<PathBuf> {
        self.uploads
            .resume
            .as_deref()
            .and_then(|raw| resolve_upload_path(raw, base_dir))
    }

    /// 求职信的绝对路径（文件不存在时为 None）
    pub fn cover_letter_path(&self, base_dir: &Path) -> Option<PathBuf> {
        self.uploads
            .cover_letter
            .as_deref()
            .and_then(|raw| resolve_upload_path(raw, base_dir))
    }
}

/// 把配置里的相对路径解析到 `base_dir` 下
///
/// 去掉开头的 `/` 和 `\`，只有确实是文件时才返回。
pub fn resolve_upload_path(raw: &str, base_dir: &Path) -> Option<PathBuf> {
    let relative = raw.trim().trim_start_matches(['/', '\\']);
    if relative.is_empty() {
        return None;
    }
    let full = base_dir.join(relative);
    if full.is_file() {
        Some(full)
    } else {
        None
    }
}

// Helper function to deserialize a scalar (string / number / bool) as an optional string
fn deserialize_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or boolean")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(if value { "Yes" } else { "No" }.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(ScalarVisitor)
        }
    }

    deserializer.deserialize_any(ScalarVisitor)
}

fn deserialize_scalar_or<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_scalar(deserializer)?.unwrap_or_default())
}
