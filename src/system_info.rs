//! # Feature: System Info
//!
//! Build and host details for `!info` and `!status`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

use sysinfo::System;

/// Name and version baked in at compile time
pub fn bot_version() -> String {
    format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

pub fn rust_version() -> String {
    rustc_version_runtime::version().to_string()
}

/// Recent commits recorded by build.rs as `(hash, subject)`
pub fn recent_commits() -> Vec<(String, String)> {
    env!("BOT_RECENT_COMMITS")
        .split(';')
        .filter_map(|line| {
            let (hash, subject) = line.split_once('|')?;
            Some((hash.to_string(), subject.to_string()))
        })
        .collect()
}

pub fn build_target() -> &'static str {
    env!("BOT_BUILD_TARGET")
}

/// Host memory snapshot
#[derive(Debug, Clone, Copy)]
pub struct MemoryUsage {
    pub used_mb: u64,
    pub total_mb: u64,
}

impl MemoryUsage {
    pub fn percent(&self) -> f64 {
        if self.total_mb == 0 {
            return 0.0;
        }
        self.used_mb as f64 / self.total_mb as f64 * 100.0
    }
}

pub fn memory_usage() -> MemoryUsage {
    let mut sys = System::new();
    sys.refresh_memory();
    MemoryUsage {
        used_mb: sys.used_memory() / 1024 / 1024,
        total_mb: sys.total_memory() / 1024 / 1024,
    }
}

pub fn host_os() -> String {
    match (System::name(), System::os_version()) {
        (Some(name), Some(version)) => format!("{name} {version}"),
        (Some(name), None) => name,
        _ => "unknown".to_string(),
    }
}

/// `3d 4h 12m` style uptime; seconds only show for the first minute
pub fn format_uptime(uptime: chrono::Duration) -> String {
    let total = uptime.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;

    if total < 60 {
        format!("{}s", total)
    } else if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_uptime(chrono::Duration::seconds(125)), "2m");
        assert_eq!(format_uptime(chrono::Duration::seconds(3_720)), "1h 2m");
        assert_eq!(format_uptime(chrono::Duration::seconds(266_400)), "3d 2h 0m");
    }

    #[test]
    fn test_memory_percent() {
        let usage = MemoryUsage { used_mb: 512, total_mb: 2048 };
        assert_eq!(usage.percent(), 25.0);
        assert_eq!(MemoryUsage { used_mb: 1, total_mb: 0 }.percent(), 0.0);
    }
}
