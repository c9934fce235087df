//! 宿主模块系统
//!
//! 模拟脚本宿主的导入机制：按搜索顺序询问各个查找器（finder），
//! 命中后加载模块并记录到已加载模块表中。
//!
//! # 模块结构
//!
//! - [`loader`] - 搜索顺序与导入流程（[`ModuleSystem`]）
//! - [`registry`] - 已加载模块表
//! - [`resolver`] - 磁盘搜索路径查找器
//! - [`cache`] - 按名称缓存模块实例
//! - [`value`] - 模块成员值
//!
//! # 设计目标
//!
//! 1. 任何导入来源都实现同一个 [`Finder`] trait
//! 2. 模块以 `Arc<Module>` 共享，身份即指针
//! 3. 搜索顺序可在运行时插入与移除

pub mod cache;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod value;

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

pub use loader::ModuleSystem;
pub use value::{CallError, NativeFunction, Value};

/// 查找器标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(u64);

impl LoaderId {
    /// 分配一个进程内唯一的标识
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        LoaderId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "loader#{}", self.0)
    }
}

/// 模块
///
/// 一个命名空间对象，成员按插入顺序保存。
#[derive(Debug, Clone)]
pub struct Module {
    /// 模块名（如 "idaapi"）
    pub name: String,
    /// 来源文件
    pub file: Option<String>,
    /// 创建此模块的查找器
    pub loader: Option<LoaderId>,
    /// 包名，`Some("")` 表示顶层模块
    pub package: Option<String>,
    members: IndexMap<String, Value>,
}

impl Module {
    /// 创建空模块
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            file: None,
            loader: None,
            package: None,
            members: IndexMap::new(),
        }
    }

    /// 设置成员，返回被覆盖的旧值
    pub fn set(
        &mut self,
        name: &str,
        value: Value,
    ) -> Option<Value> {
        self.members.insert(name.to_string(), value)
    }

    /// 获取成员
    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Value> {
        self.members.get(name)
    }

    /// 检查是否有指定成员
    pub fn has(
        &self,
        name: &str,
    ) -> bool {
        self.members.contains_key(name)
    }

    /// 所有成员名（按插入顺序）
    pub fn member_names(&self) -> Vec<&str> {
        self.members.keys().map(|s| s.as_str()).collect()
    }

    /// 遍历成员
    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// 搜索顺序中的一个参与者
///
/// 只回答两个问题：能否处理该名称，以及交出该模块。
pub trait Finder: Send + Sync {
    /// 查找器标识
    fn id(&self) -> LoaderId;

    /// 诊断用名称（如 "path"）
    fn label(&self) -> &'static str;

    /// 是否能提供该模块，不得有副作用
    fn find(
        &self,
        name: &str,
    ) -> bool;

    /// 加载模块，仅在 `find` 返回 true 后调用
    fn load(
        &self,
        name: &str,
    ) -> Result<Arc<Module>, ModuleError>;
}

/// 模块系统错误
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// 模块未找到
    #[error("module not found: '{name}'")]
    NotFound {
        name: String,
        searched: Vec<LoaderId>,
    },

    /// 读取模块文件失败
    #[error("failed to read module file '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 查找器加载失败
    #[error("loader failed for '{name}': {message}")]
    Loader { name: String, message: String },
}
