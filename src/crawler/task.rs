use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// 限制同时运行数量的任务集合
pub struct TaskManager<R: Send + 'static> {
    tasks: JoinSet<Result<R>>,
    permits: Arc<Semaphore>,
}

impl<R: Send + 'static> TaskManager<R> {
    pub fn new(limit: usize) -> Self {
        Self {
            tasks: JoinSet::new(),
            permits: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    pub fn spawn<F>(&mut self, future: F)
    where
        F: std::future::Future<Output = Result<R>> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.tasks.spawn(async move {
            let _permit = permits.acquire_owned().await?;
            future.await
        });
    }

    /// 收集所有结果，失败的任务不影响其他任务
    pub async fn wait_all(&mut self) -> Vec<Result<R>> {
        let mut results = Vec::new();
        while let Some(res) = self.tasks.join_next().await {
            results.push(res.map_err(anyhow::Error::from).and_then(|r| r));
        }
        results
    }
}
