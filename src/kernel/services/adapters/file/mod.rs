//! 文件服务模块
//!
//! 本地文件读写与目录遍历

pub mod local;
pub mod walk;

pub use local::LocalFileProvider;
pub use walk::WalkEnumerator;
