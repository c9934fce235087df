//! 模块导入流程
//!
//! 维护查找器的搜索顺序，并执行导入：
//!
//! 1. 已加载模块表命中则直接返回
//! 2. 按搜索顺序询问查找器，第一个接受者负责加载
//! 3. 加载结果写入已加载模块表；若加载期间搜索顺序被修改，则丢弃结果重新查找

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::registry::ModuleRegistry;
use super::resolver::PathFinder;
use super::{Finder, LoaderId, Module, ModuleError};

/// 全局模块系统的磁盘搜索路径环境变量
pub const SEARCH_PATH_VAR: &str = "IDBSHIM_PATH";

static GLOBAL: Lazy<ModuleSystem> = Lazy::new(|| {
    let system = ModuleSystem::new();
    system.push_back(Arc::new(PathFinder::from_env(SEARCH_PATH_VAR)));
    system
});

/// 搜索顺序
///
/// 每次修改都会递增 `generation`，导入据此判断加载期间搜索顺序是否变化。
#[derive(Default)]
struct SearchOrder {
    finders: Vec<Arc<dyn Finder>>,
    generation: u64,
}

/// 模块系统
///
/// 搜索顺序与已加载模块表的组合。
#[derive(Default)]
pub struct ModuleSystem {
    /// 搜索顺序（越靠前越先询问）
    search_order: RwLock<SearchOrder>,
    /// 已加载模块
    registry: ModuleRegistry,
}

impl ModuleSystem {
    /// 创建空的模块系统（没有任何查找器）
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程级模块系统
    ///
    /// 首次访问时创建，默认带一个读取 `IDBSHIM_PATH` 的 [`PathFinder`]。
    pub fn global() -> &'static ModuleSystem {
        &GLOBAL
    }

    /// 已加载模块表
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// 在写锁下同时修改搜索顺序与已加载模块表
    ///
    /// 与导入互斥：加载期间发生过修改的导入会丢弃结果并重新查找，
    /// 因此修改完成后不会再有按旧搜索顺序加载的模块写入已加载模块表。
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut Vec<Arc<dyn Finder>>, &ModuleRegistry) -> R,
    ) -> R {
        let mut order = self.search_order.write();
        let result = f(&mut order.finders, &self.registry);
        order.generation += 1;
        result
    }

    /// 将查找器插入到搜索顺序最前面，返回其位置
    ///
    /// 同一查找器重复插入不做任何事，返回已有位置。
    pub fn insert_front(
        &self,
        finder: Arc<dyn Finder>,
    ) -> usize {
        let mut order = self.search_order.write();
        if let Some(pos) = order.finders.iter().position(|f| f.id() == finder.id()) {
            return pos;
        }
        order.finders.insert(0, finder);
        order.generation += 1;
        0
    }

    /// 将查找器追加到搜索顺序末尾
    pub fn push_back(
        &self,
        finder: Arc<dyn Finder>,
    ) -> usize {
        let mut order = self.search_order.write();
        if let Some(pos) = order.finders.iter().position(|f| f.id() == finder.id()) {
            return pos;
        }
        order.finders.push(finder);
        order.generation += 1;
        order.finders.len() - 1
    }

    /// 从搜索顺序中移除查找器
    pub fn remove(
        &self,
        id: LoaderId,
    ) -> bool {
        let mut order = self.search_order.write();
        let before = order.finders.len();
        order.finders.retain(|f| f.id() != id);
        if order.finders.len() == before {
            return false;
        }
        order.generation += 1;
        true
    }

    /// 查找器在搜索顺序中的位置
    pub fn position(
        &self,
        id: LoaderId,
    ) -> Option<usize> {
        self.search_order
            .read()
            .finders
            .iter()
            .position(|f| f.id() == id)
    }

    /// 当前搜索顺序
    pub fn finder_ids(&self) -> Vec<LoaderId> {
        self.search_order
            .read()
            .finders
            .iter()
            .map(|f| f.id())
            .collect()
    }

    /// 当前搜索顺序（带诊断名称）
    pub fn finders(&self) -> Vec<(LoaderId, &'static str)> {
        self.search_order
            .read()
            .finders
            .iter()
            .map(|f| (f.id(), f.label()))
            .collect()
    }

    /// 导入模块
    pub fn import(
        &self,
        name: &str,
    ) -> Result<Arc<Module>, ModuleError> {
        loop {
            if let Some(module) = self.registry.get(name) {
                trace!("import {}: already loaded", name);
                return Ok(module);
            }

            // 快照搜索顺序，加载期间不持有锁
            let (finders, generation) = {
                let order = self.search_order.read();
                (order.finders.clone(), order.generation)
            };

            let Some(finder) = finders.iter().find(|f| f.find(name)) else {
                return Err(ModuleError::NotFound {
                    name: name.to_string(),
                    searched: finders.iter().map(|f| f.id()).collect(),
                });
            };
            debug!("import {}: handled by {}", name, finder.id());
            let loaded = finder.load(name);

            // 登记时持有读锁，与 `update` 等修改互斥
            let order = self.search_order.read();
            if order.generation != generation {
                debug!("import {}: search order changed during load, retrying", name);
                continue;
            }
            return Ok(self.registry.register_if_absent(loaded?));
        }
    }
}
