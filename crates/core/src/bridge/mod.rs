pub mod format_bridge;
