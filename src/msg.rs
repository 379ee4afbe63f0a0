use crate::model::package::Package;

/// Requests that drive the application, one lifecycle operation each.
#[derive(Debug, Clone)]
pub enum Msg {
    // -- Lifecycle
    Install(Package),
    Update { initial: Package, target: Package },
    Uninstall(Package),

    // -- Queries
    Status(Package),
    ListEntries(Package),
    InstallPath(Package),
}
