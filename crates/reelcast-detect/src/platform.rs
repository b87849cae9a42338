#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

use crate::source_db::SourceDatabase;
use crate::RawTitle;

/// Platform-specific title collection dispatcher.
///
/// Each platform backend reports its own failures; they are logged here and
/// the titles gathered by the other backends are still returned.
pub fn collect(db: &SourceDatabase) -> Vec<RawTitle> {
    #[cfg(target_os = "linux")]
    {
        linux::collect_mpris(db).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "MPRIS title source unavailable");
            vec![]
        })
    }
    #[cfg(target_os = "windows")]
    {
        windows::collect_windows(db).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Window title source unavailable");
            vec![]
        })
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        let _ = db;
        vec![]
    }
}
