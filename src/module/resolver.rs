//! 磁盘模块查找器
//!
//! 将模块名（如 "idc"、"pkg.utils"）解析为搜索路径下的源文件。
//!
//! # 搜索顺序
//!
//! 按目录顺序，每个目录内依次尝试：
//!
//! 1. `dir/pkg/utils.py`
//! 2. `dir/pkg/utils/__init__.py`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::{Finder, LoaderId, Module, ModuleError, Value};

/// 搜索路径查找器
#[derive(Debug)]
pub struct PathFinder {
    id: LoaderId,
    /// 搜索目录
    search_paths: Vec<PathBuf>,
}

impl PathFinder {
    /// 创建新的查找器
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            id: LoaderId::next(),
            search_paths,
        }
    }

    /// 从环境变量读取搜索路径（以平台路径分隔符分隔）
    pub fn from_env(var: &str) -> Self {
        let paths = std::env::var_os(var)
            .map(|v| std::env::split_paths(&v).collect())
            .unwrap_or_default();
        Self::new(paths)
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// 查找模块文件
    pub fn locate(
        &self,
        name: &str,
    ) -> Option<PathBuf> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        self.search_paths
            .iter()
            .find_map(|base| find_module_file(base, &parts))
    }
}

/// 从基础目录查找模块文件
fn find_module_file(
    base: &Path,
    parts: &[&str],
) -> Option<PathBuf> {
    let (last, parents) = parts.split_last()?;

    let mut path = base.to_path_buf();
    for part in parents {
        path = path.join(part);
    }

    // 尝试 name.py
    let file_path = path.join(format!("{}.py", last));
    if file_path.is_file() {
        return Some(file_path);
    }

    // 尝试 name/__init__.py
    let init_path = path.join(last).join("__init__.py");
    if init_path.is_file() {
        return Some(init_path);
    }

    None
}

/// 读取顶层常量赋值（`NAME = 0x10`、`NAME = "text"`、`NAME = True`）
///
/// 只识别字面量，其余语句忽略。
fn read_constants(
    module: &mut Module,
    source: &str,
) {
    for line in source.lines() {
        if line.starts_with(char::is_whitespace) {
            continue;
        }
        let Some((lhs, rhs)) = line.split_once('=') else {
            continue;
        };
        let name = lhs.trim();
        let valid_name = !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name || rhs.starts_with('=') {
            continue;
        }
        if let Some(value) = parse_literal(rhs.trim()) {
            module.set(name, value);
        }
    }
}

fn parse_literal(text: &str) -> Option<Value> {
    match text {
        "True" => return Some(Value::Bool(true)),
        "False" => return Some(Value::Bool(false)),
        "None" => return Some(Value::None),
        _ => {}
    }

    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return Some(Value::Str(text[1..text.len() - 1].to_string()));
        }
    }

    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(Value::Int);
    }
    text.parse::<i64>().ok().map(Value::Int)
}

impl Finder for PathFinder {
    fn id(&self) -> LoaderId {
        self.id
    }

    fn label(&self) -> &'static str {
        "path"
    }

    fn find(
        &self,
        name: &str,
    ) -> bool {
        self.locate(name).is_some()
    }

    fn load(
        &self,
        name: &str,
    ) -> Result<Arc<Module>, ModuleError> {
        let path = self.locate(name).ok_or_else(|| ModuleError::NotFound {
            name: name.to_string(),
            searched: vec![self.id],
        })?;
        debug!("loading {} from {}", name, path.display());

        let source = std::fs::read_to_string(&path).map_err(|source| ModuleError::Io {
            path: path.clone(),
            source,
        })?;

        let mut module = Module::new(name);
        module.file = Some(path.display().to_string());
        module.loader = Some(self.id);
        if path.ends_with("__init__.py") {
            module.package = Some(name.to_string());
        } else {
            module.package = Some(
                name.rsplit_once('.')
                    .map(|(parent, _)| parent.to_string())
                    .unwrap_or_default(),
            );
        }
        read_constants(&mut module, &source);
        Ok(Arc::new(module))
    }
}
