//! Section structs of `preview.toml`.

mod api;
mod reload;
mod serve;
mod viewer;
mod watch;

pub use api::ApiConfig;
pub use reload::ReloadConfig;
pub use serve::ServeConfig;
pub use viewer::ViewerConfig;
pub use watch::WatchConfig;
