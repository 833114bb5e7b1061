//! 新问题询问通道
//!
//! 规则表和缓存都答不上的问题交给这里。控制台只是其中一种实现，
//! 无人值守时换成 `SkipPrompter` 即可。

use std::io::BufRead;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// 询问操作员的通道
///
/// 返回 `None` 表示不回答（跳过）。超时由调用方控制。
#[async_trait]
pub trait AnswerPrompter: Send + Sync {
    async fn ask(&self, question: &str) -> Option<String>;
}

/// 总是跳过
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipPrompter;

#[async_trait]
impl AnswerPrompter for SkipPrompter {
    async fn ask(&self, question: &str) -> Option<String> {
        debug!("跳过新问题: {}", question);
        None
    }
}

/// 在控制台询问
///
/// 读取 stdin 的阻塞线程把每一行送进通道，这样调用方的超时不会
/// 卡在阻塞读上。超时之后迟到的输入会在下一次询问前丢弃。
pub struct ConsolePrompter {
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl ConsolePrompter {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("读取终端输入失败: {}", e);
                        break;
                    }
                }
            }
        });
        Self {
            lines: Mutex::new(rx),
        }
    }
}

impl Default for ConsolePrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerPrompter for ConsolePrompter {
    async fn ask(&self, question: &str) -> Option<String> {
        let mut lines = self.lines.lock().await;
        while lines.try_recv().is_ok() {}

        eprintln!("\n{}", "!".repeat(60));
        eprintln!("新问题需要你来回答:");
        eprintln!("{}", "!".repeat(60));
        eprintln!("Q: {}", question);
        eprintln!("你的回答（直接回车跳过）: ");

        let answer = lines.recv().await?;
        let answer = answer.trim();
        if answer.is_empty() {
            None
        } else {
            Some(answer.to_string())
        }
    }
}
