use std::path::Path;

use tracing::debug;
use windows::Win32::Foundation::*;
use windows::Win32::System::ProcessStatus::GetModuleFileNameExW;
use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::source_db::SourceDatabase;
use crate::{DetectError, RawTitle};

/// State threaded through the `EnumWindows` callback.
struct EnumState<'a> {
    db: &'a SourceDatabase,
    titles: Vec<RawTitle>,
}

/// Collect titles of visible top-level windows via Win32 enumeration.
pub fn collect_windows(db: &SourceDatabase) -> Result<Vec<RawTitle>, DetectError> {
    let mut state = EnumState {
        db,
        titles: Vec::new(),
    };

    unsafe {
        EnumWindows(
            Some(enum_window_callback),
            LPARAM(&mut state as *mut EnumState as isize),
        )
        .map_err(|e| DetectError::Enumerate(e.to_string()))?;
    }

    Ok(state.titles)
}

unsafe extern "system" fn enum_window_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let state = &mut *(lparam.0 as *mut EnumState);

    if !IsWindowVisible(hwnd).as_bool() {
        return TRUE;
    }

    let mut title = [0u16; 512];
    let title_len = GetWindowTextW(hwnd, &mut title);
    if title_len <= 0 {
        return TRUE;
    }
    let text = String::from_utf16_lossy(&title[..title_len as usize]);

    let source = match process_executable(hwnd) {
        Some(exe) => state.db.source_for_executable(&exe),
        None => crate::TitleSource::Window,
    };

    debug!(title = %text, source = ?source, "Sampled window title");

    state.titles.push(RawTitle {
        text,
        source,
        url: None,
    });

    TRUE
}

/// File name of the executable owning `hwnd`, if the process can be opened.
unsafe fn process_executable(hwnd: HWND) -> Option<String> {
    let mut pid = 0u32;
    GetWindowThreadProcessId(hwnd, Some(&mut pid));
    if pid == 0 {
        return None;
    }

    let handle = OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, FALSE, pid).ok()?;
    let mut buf = [0u16; 260];
    let len = GetModuleFileNameExW(handle, HMODULE::default(), &mut buf);
    let _ = CloseHandle(handle);
    if len == 0 {
        return None;
    }

    let path = String::from_utf16_lossy(&buf[..len as usize]);
    Path::new(&path)
        .file_name()
        .and_then(|f| f.to_str())
        .map(str::to_string)
}
