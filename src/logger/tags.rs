/// Log tags identify the component that emitted a line
///
/// Each tag maps to a `--debug-<key>` flag that enables its debug output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Hub,
    Dispatch,
    Session,
    Store,
    Webserver,
}

impl LogTag {
    pub const ALL: [LogTag; 7] = [
        LogTag::System,
        LogTag::Config,
        LogTag::Hub,
        LogTag::Dispatch,
        LogTag::Session,
        LogTag::Store,
        LogTag::Webserver,
    ];

    /// Key used in --debug-<key> / --verbose-<key> flags
    pub fn to_debug_key(&self) -> String {
        self.to_plain_string().to_lowercase()
    }

    /// Uppercase label used in console and file output
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Hub => "HUB",
            LogTag::Dispatch => "DISPATCH",
            LogTag::Session => "SESSION",
            LogTag::Store => "STORE",
            LogTag::Webserver => "WEBSERVER",
        }
        .to_string()
    }

    pub fn from_debug_key(key: &str) -> Option<Self> {
        LogTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.to_debug_key() == key)
    }
}
