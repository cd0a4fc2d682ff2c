//! 数据模型层

pub mod text_buffer;
pub mod workspace;

pub use text_buffer::TextBuffer;
pub use workspace::BufferWorkspace;
