/// Top-level sections of the app shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Protocols,
    History,
    Settings,
}
