use std::time::Instant;

use anyhow::Result;
use tracing::{error, info};

use vcomycs_fetch::config::get_site_config;
use vcomycs_fetch::utils::{ask_continue, display_elapsed_time};
use vcomycs_fetch::{VcomycsCrawler, get_user_input, logger};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logger::init();

    let config = get_site_config();
    info!("站点: {} ({})", config.base_url(), config.lang);
    let crawler = VcomycsCrawler::new(config)?;

    loop {
        println!("\n=== vcomycs-fetch ===");
        match get_user_input() {
            Ok(chapter_urls) => {
                let start = Instant::now();
                for chapter_url in chapter_urls {
                    println!("\n正在下载章节 {} ...", chapter_url);
                    match crawler.download_chapter(&chapter_url).await {
                        Ok(dir) => println!("已保存到: {}", dir.display()),
                        Err(e) => error!("章节 {} 下载失败: {:#}", chapter_url, e),
                    }
                }
                display_elapsed_time(start.elapsed());
            }
            Err(e) => {
                println!("输入错误: {}", e);
            }
        }

        if !ask_continue()? {
            break;
        }
    }

    println!("程序结束。");
    Ok(())
}
