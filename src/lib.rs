//! Copies WordPress must-use plugin entry files out of their package
//! directories so the host loads them, and removes them again on uninstall.

pub mod app;
pub mod model;
pub mod msg;
pub mod plugin;

pub use app::App;
pub use model::config::AppConfig;
pub use model::package::Package;
pub use msg::Msg;
