// Adapters layer: concrete display surfaces and file output for the command line.

pub mod interactive;
pub mod storage;
pub mod text_surface;

pub use storage::LocalStorage;
pub use text_surface::TextSurface;
