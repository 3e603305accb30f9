//! 记忆层：执行轨迹（只追加）

pub mod trace;

pub use trace::{InMemoryTraceSink, JsonlTraceSink, TraceSink};
