//! 已加载模块表
//!
//! 记录所有已经导入过的模块，重复导入直接从这里返回。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{LoaderId, Module};

/// 已加载模块表
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// 模块映射（name -> Module）
    modules: RwLock<HashMap<String, Arc<Module>>>,
}

impl ModuleRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个模块，返回被替换的旧模块
    pub fn register(
        &self,
        module: Arc<Module>,
    ) -> Option<Arc<Module>> {
        self.modules.write().insert(module.name.clone(), module)
    }

    /// 注册模块；同名模块已存在时保留已有的并返回它
    pub fn register_if_absent(
        &self,
        module: Arc<Module>,
    ) -> Arc<Module> {
        let mut modules = self.modules.write();
        Arc::clone(modules.entry(module.name.clone()).or_insert(module))
    }

    /// 获取模块
    pub fn get(
        &self,
        name: &str,
    ) -> Option<Arc<Module>> {
        self.modules.read().get(name).cloned()
    }

    /// 检查模块是否已加载
    pub fn has_module(
        &self,
        name: &str,
    ) -> bool {
        self.modules.read().contains_key(name)
    }

    /// 移除模块
    pub fn remove(
        &self,
        name: &str,
    ) -> Option<Arc<Module>> {
        self.modules.write().remove(name)
    }

    /// 移除由指定查找器创建的所有模块，返回移除的模块名
    pub fn remove_loaded_by(
        &self,
        loader: LoaderId,
    ) -> Vec<String> {
        let mut modules = self.modules.write();
        let names: Vec<String> = modules
            .iter()
            .filter(|(_, m)| m.loader == Some(loader))
            .map(|(name, _)| name.clone())
            .collect();
        for name in &names {
            modules.remove(name);
        }
        names
    }

    /// 已加载的模块名
    pub fn names(&self) -> Vec<String> {
        self.modules.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }
}
