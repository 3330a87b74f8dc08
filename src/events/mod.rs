pub mod hooks;
pub mod window;

pub use hooks::{HookContext, HookHandler, HookRegistry, HookReport, LifecycleEvent, LogWindowEvents};
pub use window::{WindowEvent, WindowEventType, WindowInfo};
