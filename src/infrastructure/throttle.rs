//! 限流器 - 基础设施层
//!
//! 持有"对外部服务的调用节奏"这一稀缺资源，只暴露"获取许可 / 冷却"的能力
//!
//! - `RateLimiter`：每个外部服务一个，所有并发任务共享
//! - `BackoffPolicy`：指数退避（1、2、4… 个基础时长）
//! - `Sleeper`：睡眠抽象，测试中替换为 `RecordingSleeper`，不等待真实时间

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tracing::debug;

/// 睡眠能力
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// 基于 tokio 定时器的真实睡眠
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// 只记录时长、立即返回的睡眠实现（用于测试）
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按调用顺序返回所有睡眠时长
    pub fn recorded(&self) -> Vec<Duration> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(duration);
        }
    }
}

/// 固定间隔限流器
///
/// 调用方先 `acquire()` 获取许可，完成外部调用后 `cool_down()`；
/// 同一许可内的多次尝试之间由调用方保证至少间隔 `delay()`。
/// 许可在冷却结束前不会释放，因此同一服务的两次调用之间至少间隔 `delay`，
/// 并发处理实体时也成立。
pub struct RateLimiter {
    name: String,
    delay: Duration,
    sleeper: Arc<dyn Sleeper>,
    gate: AsyncMutex<()>,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, delay: Duration, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            name: name.into(),
            delay,
            sleeper,
            gate: AsyncMutex::new(()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 等待轮到自己调用
    pub async fn acquire(&self) -> RateLimitPermit<'_> {
        let guard = self.gate.lock().await;
        RateLimitPermit {
            limiter: self,
            _guard: guard,
        }
    }
}

/// 调用许可
///
/// 直接 drop 表示不冷却立即释放。
pub struct RateLimitPermit<'a> {
    limiter: &'a RateLimiter,
    _guard: MutexGuard<'a, ()>,
}

impl RateLimitPermit<'_> {
    /// 等待固定间隔后释放许可
    pub async fn cool_down(self) {
        debug!(
            "[{}] 限流等待 {} ms",
            self.limiter.name,
            self.limiter.delay.as_millis()
        );
        self.limiter.sleeper.sleep(self.limiter.delay).await;
    }
}

/// 指数退避策略
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    max_attempts: usize,
    base: Duration,
}

impl BackoffPolicy {
    pub fn new(max_attempts: usize, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// 第 `attempt` 次（从 0 开始）失败后的等待时长：base × 2^attempt
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_from_base() {
        let policy = BackoffPolicy::new(4, Duration::from_secs(1));

        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = BackoffPolicy::new(0, Duration::from_secs(1));

        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay_for(40), Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test]
    async fn test_cool_down_records_delay() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let limiter = RateLimiter::new("search", Duration::from_millis(500), sleeper.clone());

        limiter.acquire().await.cool_down().await;
        drop(limiter.acquire().await);
        limiter.acquire().await.cool_down().await;

        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(500), Duration::from_millis(500)]
        );
    }

    #[tokio::test]
    async fn test_permit_serializes_callers() {
        let limiter = Arc::new(RateLimiter::new(
            "llm",
            Duration::ZERO,
            Arc::new(RecordingSleeper::new()),
        ));

        let permit = limiter.acquire().await;
        let contender = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter.acquire().await.cool_down().await;
            })
        };

        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        permit.cool_down().await;
        contender.await.unwrap();
    }
}
