//! 模块实例缓存
//!
//! 按名称缓存已创建的模块，保证同名请求得到同一个实例。
//!
//! # 设计思路
//!
//! - 缓存粒度为单个模块（`Arc<Module>`）
//! - 查找与创建在同一把锁内完成，不存在重复创建的窗口
//! - 线程安全：使用 `parking_lot::Mutex`

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Module;

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 缓存命中次数
    pub hits: usize,
    /// 缓存未命中次数（即创建次数）
    pub misses: usize,
    /// 当前缓存条目数
    pub entries: usize,
}

impl CacheStats {
    /// 命中率（百分比）
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, Arc<Module>>,
    stats: CacheStats,
}

/// 模块缓存
#[derive(Debug, Default)]
pub struct ModuleCache {
    inner: Mutex<CacheInner>,
}

impl ModuleCache {
    /// 创建新的缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取缓存的模块（不计入统计）
    pub fn peek(
        &self,
        name: &str,
    ) -> Option<Arc<Module>> {
        self.inner.lock().entries.get(name).cloned()
    }

    /// 获取缓存的模块，不存在时调用 `create` 创建并写入
    ///
    /// 整个过程持有锁；`create` 失败时缓存保持不变。
    pub fn get_or_try_insert_with<E, F>(
        &self,
        name: &str,
        create: F,
    ) -> Result<Arc<Module>, E>
    where
        F: FnOnce() -> Result<Module, E>,
    {
        let mut inner = self.inner.lock();
        if let Some(module) = inner.entries.get(name) {
            let module = Arc::clone(module);
            inner.stats.hits += 1;
            return Ok(module);
        }

        let module = Arc::new(create()?);
        inner.entries.insert(name.to_string(), Arc::clone(&module));
        inner.stats.misses += 1;
        inner.stats.entries = inner.entries.len();
        Ok(module)
    }

    /// 使指定模块的缓存失效
    pub fn invalidate(
        &self,
        name: &str,
    ) -> Option<Arc<Module>> {
        let mut inner = self.inner.lock();
        let removed = inner.entries.remove(name);
        inner.stats.entries = inner.entries.len();
        removed
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stats.entries = 0;
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    /// 获取缓存中的模块名列表
    pub fn cached_modules(&self) -> Vec<String> {
        self.inner.lock().entries.keys().cloned().collect()
    }
}
