use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::config::RateLimit;

/// 固定窗口限流：每个窗口内最多放行 `num` 个请求
pub struct RateLimiter {
    num: u64,
    per: Duration,
    window: Mutex<Window>,
}

struct Window {
    until: Instant,
    remaining: u64,
}

impl RateLimiter {
    pub fn new(num: u64, per: Duration) -> Self {
        Self {
            num,
            per,
            window: Mutex::new(Window {
                until: Instant::now() + per,
                remaining: num,
            }),
        }
    }

    pub fn from_config(rate_limit: RateLimit) -> Self {
        Self::new(rate_limit.num, Duration::from_secs(rate_limit.secs))
    }

    /// 等到当前窗口还有余量
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            if now >= window.until {
                window.until = now + self.per;
                window.remaining = self.num;
            }
            if window.remaining > 0 {
                window.remaining -= 1;
                return;
            }
            debug!("请求过于频繁，等待下一个窗口");
            // 持锁等待，排队的请求按到达顺序放行
            sleep_until(window.until).await;
        }
    }
}
