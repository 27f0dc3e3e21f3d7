pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const LINK: &str = "🔗";
    pub const DATABASE: &str = "🗄️";
    pub const SEARCH: &str = "🔍";
    pub const NEW: &str = "✨";
    pub const DEL: &str = "🗑️";
    pub const CLOCK: &str = "⏱️";
    pub const LEFT: &str = "⬅️";
    pub const RIGHT: &str = "➡️";
    pub const EMPTY: &str = "∅";
}
