//! zsearch - 编辑器搜索/替换内核
//!
//! 模块结构：
//! - core: 核心抽象（Service）
//! - kernel: 搜索控制器，以及 services 下的端口（ports）与适配器（adapters）
//! - models: 数据模型（TextBuffer, BufferWorkspace）

pub mod core;
pub mod kernel;
pub mod models;
