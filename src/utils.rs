use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, instrument};

#[instrument]
pub fn get_user_input() -> Result<Vec<String>> {
    println!("请输入章节地址或路径(以空格分割): ");
    let mut urls = String::new();
    io::stdin().read_line(&mut urls)?;
    debug!("用户输入: {}", urls);
    let urls = urls.split_whitespace().map(|s| s.to_owned()).collect();
    Ok(urls)
}

pub fn ask_continue() -> Result<bool> {
    print!("\n是否继续下载其他章节? (y/n): ");
    io::stdout().flush()?;
    let mut choice = String::new();
    io::stdin().read_line(&mut choice)?;
    Ok(choice.trim().eq_ignore_ascii_case("y"))
}

pub fn format_elapsed(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let mins = total_ms / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    let mut text = String::new();
    if mins > 0 {
        text.push_str(&format!("{}分", mins));
    }
    if secs > 0 || (mins > 0 && ms > 0) {
        text.push_str(&format!("{}秒", secs));
    }
    if ms > 0 || text.is_empty() {
        text.push_str(&format!("{}毫秒", ms));
    }
    text
}

pub fn display_elapsed_time(duration: Duration) {
    info!("✅ 下载完成！耗时: {}", format_elapsed(duration));
}
