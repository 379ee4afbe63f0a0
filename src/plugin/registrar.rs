use std::rc::Rc;

use crate::model::config::AppConfig;
use crate::plugin::installer::MustUsePluginInstaller;
use crate::plugin::io::Io;
use crate::plugin::manager::InstallationManager;

/// Entry point the host calls once at startup.
#[derive(Debug, Default)]
pub struct MustUsePlugins;

impl MustUsePlugins {
    /// Register the must-use plugin installer with the host registry.
    pub fn activate(manager: &mut InstallationManager, config: &AppConfig, io: Rc<dyn Io>) {
        manager.add_installer(Box::new(MustUsePluginInstaller::new(config, io.clone())));

        tracing::info!("registered must-use plugin installer");
        io.notice(&format!(
            "Plugin activated: {}",
            std::any::type_name::<Self>()
        ));
    }
}
