// Domain models

mod aggregate;
mod snapshot;

pub use aggregate::{AggregateView, MetricsAggregate};
pub use snapshot::Snapshot;

/// Counter, gauge and label names produced by the built-in sources.
pub mod names {
    pub const SOURCE_INPUT: &str = "input";
    pub const SOURCE_CPU: &str = "cpu";
    pub const SOURCE_MEMORY: &str = "memory";
    pub const SOURCE_NETWORK: &str = "network";
    pub const SOURCE_DISK: &str = "disk";
    pub const SOURCE_ACTIVE_WINDOW: &str = "active_window";

    pub const KEYS_PRESSED: &str = "keys_pressed";
    pub const MOUSE_CLICKS: &str = "mouse_clicks";
    pub const SCROLL_DISTANCE: &str = "scroll_distance";
    pub const MOUSE_DISTANCE_X: &str = "mouse_distance_x";
    pub const MOUSE_DISTANCE_Y: &str = "mouse_distance_y";
    pub const NET_BYTES_SENT: &str = "net_bytes_sent";
    pub const NET_BYTES_RECV: &str = "net_bytes_recv";
    pub const DISK_BYTES_READ: &str = "disk_bytes_read";
    pub const DISK_BYTES_WRITTEN: &str = "disk_bytes_written";

    pub const CPU_PERCENT: &str = "cpu_percent";
    pub const CPU_SPEED_GHZ: &str = "cpu_speed_ghz";
    pub const MEMORY_PERCENT: &str = "memory_percent";
    pub const MEMORY_USED_BYTES: &str = "memory_used_bytes";
    pub const MEMORY_TOTAL_BYTES: &str = "memory_total_bytes";

    pub const APP_NAME: &str = "app_name";
    pub const WINDOW_TITLE: &str = "window_title";

    pub const KEY_RATE: &str = "key_rate";
    pub const CLICK_RATE: &str = "click_rate";
    pub const SCROLL_RATE: &str = "scroll_rate";
    pub const MOVEMENT_RATE: &str = "movement_rate";
    pub const NETWORK_RATE: &str = "network_rate";
    pub const DISK_RATE: &str = "disk_rate";
}
