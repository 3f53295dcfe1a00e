pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const EYE: &str = "👀";
    pub const PAGE: &str = "📄";
    pub const DOCUMENT: &str = "🧾";
    pub const FOLDER: &str = "📂";
    pub const CLOCK: &str = "⏱️";
    pub const GLOBE: &str = "🌍";
    pub const EMPTY: &str = "∅";
}
