mod format;

pub use format::RenderFormat;
