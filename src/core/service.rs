use std::any::Any;

/// 长生命周期的后台组件
pub trait Service: Any {
    fn name(&self) -> &'static str;
}
