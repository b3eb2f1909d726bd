//! # Windows Mapping Backend
//!
//! Owns the `file handle -> mapping object -> view` chain for one region:
//!
//! ```text
//! CreateFileA / CreateFileW (SECURITY_ATTRIBUTES.bInheritHandle)  -> file
//! SetHandleInformation(HANDLE_FLAG_INHERIT)                       inheritance
//! GetFileSizeEx                                                   bounds + clamp
//! GetSystemInfo.dwAllocationGranularity                           granularity
//! CreateFileMappingW(max = min(offset + round_up(size), file))    -> mapping
//! MapViewOfFile(offset - shift, size + shift)                     -> view
//! ```
//!
//! The mapping object must be sized in whole allocation granules even though
//! the view need not be, and its maximum size is clamped to the file size so
//! that opening a writable mapping never extends the file.
//!
//! ## Inheritance
//!
//! The inherit flag is set at creation and then re-applied explicitly. An
//! inheritable handle is still visible to any child spawned concurrently with
//! handle inheritance enabled, not only the intended one, so this backend
//! reports the race as open.
//!
//! ## Teardown
//!
//! Dropping a [`WindowsMapping`] unmaps the view, then closes the mapping
//! object, then the file handle.

use std::ffi::c_void;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle, RawHandle};
use std::ptr::NonNull;

use eyre::Result;
use windows_sys::Win32::Foundation::{
    SetHandleInformation, BOOL, HANDLE, HANDLE_FLAG_INHERIT, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Security::SECURITY_ATTRIBUTES;
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileA, CreateFileW, FlushFileBuffers, GetFileSizeEx, FILE_ATTRIBUTE_NORMAL,
    FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};
use windows_sys::Win32::System::Memory::{
    CreateFileMappingW, FlushViewOfFile, MapViewOfFile, UnmapViewOfFile,
    MEMORY_MAPPED_VIEW_ADDRESS, PAGE_PROTECTION_FLAGS,
};
use windows_sys::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};

use super::align::{mapping_object_size, Alignment};
use super::flags;
use super::open::effective_size;
use super::region::Mapping;
use crate::config::UNKNOWN_GRANULARITY;
use crate::error::{ErrorKind, MapError};
use crate::mode::MapMode;
use crate::name::NativeName;

/// Allocation granularity, or `UNKNOWN_GRANULARITY` if the system reports zero.
pub fn granularity() -> usize {
    // SAFETY: an all-zero SYSTEM_INFO is a valid out-parameter.
    let mut info: SYSTEM_INFO = unsafe { std::mem::zeroed() };
    // SAFETY: `info` is writable for the duration of the call.
    unsafe { GetSystemInfo(&mut info) };
    match info.dwAllocationGranularity {
        0 => UNKNOWN_GRANULARITY,
        g => g as usize,
    }
}

fn raw(handle: &OwnedHandle) -> HANDLE {
    handle.as_raw_handle() as HANDLE
}

#[derive(Debug)]
pub struct WindowsMapping {
    view: NonNull<u8>,
    len: usize,
    shift: usize,
    mode: MapMode,
    mapping: OwnedHandle,
    file: OwnedHandle,
}

// SAFETY: the view is exclusively owned and only dereferenced through
// borrows of this value.
unsafe impl Send for WindowsMapping {}

impl WindowsMapping {
    pub fn open(name: &NativeName, mode: MapMode, size: usize, offset: u64) -> Result<Self> {
        let (access, protect, view_access) = match (
            flags::windows::open_access(mode.access),
            flags::windows::protection(mode.access),
            flags::windows::view_access(mode.access, mode.private),
        ) {
            (Some(access), Some(protect), Some(view)) => (access, protect, view),
            _ => return Err(MapError::new(ErrorKind::Open, "mode has no access token").into()),
        };

        let file = open_file(name, access, mode.inheritable)?;
        configure_inheritance(&file, mode.inheritable)?;

        let file_len = file_size(&file)?;
        let size = effective_size(mode, size, offset, file_len)?;
        let granularity = granularity();
        let alignment = Alignment::compute(offset, size, granularity)?;

        let max = mapping_object_size(&alignment, granularity, file_len).ok_or_else(|| {
            MapError::new(ErrorKind::Range, "mapping object size overflows")
        })?;
        let mapping = create_mapping(&file, protect, max)?;
        let view = map_view(&mapping, view_access, &alignment)?;

        log::debug!(
            "MapViewOfFile offset {} shift {} len {} (object {}) mode \"{}\"",
            alignment.offset,
            alignment.shift,
            alignment.size,
            max,
            mode
        );

        Ok(Self {
            view,
            len: alignment.size,
            shift: alignment.shift,
            mode,
            mapping,
            file,
        })
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    /// Caller's first byte.
    pub fn start(&self) -> *mut u8 {
        // SAFETY: shift < len, so the result stays inside the view.
        unsafe { self.view.as_ptr().add(self.shift) }
    }

    /// Flushes a shared writable view and the file buffers behind it.
    pub fn sync(&self) -> Result<()> {
        if !self.mode.writes_through() {
            return Ok(());
        }
        // SAFETY: view/len describe exactly the live view.
        if unsafe { FlushViewOfFile(self.view.as_ptr() as *const c_void, self.len) } == 0 {
            return Err(MapError::last_os(ErrorKind::Mapping, "FlushViewOfFile failed").into());
        }
        // SAFETY: the file handle is open for writing when writes_through() holds.
        if unsafe { FlushFileBuffers(raw(&self.file)) } == 0 {
            return Err(MapError::last_os(ErrorKind::Mapping, "FlushFileBuffers failed").into());
        }
        Ok(())
    }

    pub fn prefetch(&self) {}
}

fn open_file(name: &NativeName, access: u32, inheritable: bool) -> Result<OwnedHandle> {
    let security = SECURITY_ATTRIBUTES {
        nLength: std::mem::size_of::<SECURITY_ATTRIBUTES>() as u32,
        lpSecurityDescriptor: std::ptr::null_mut(),
        bInheritHandle: inheritable as BOOL,
    };
    let share = FILE_SHARE_READ | FILE_SHARE_WRITE;

    // SAFETY: both name forms are NUL-terminated and outlive the call;
    // `security` is a fully initialised SECURITY_ATTRIBUTES.
    let handle = unsafe {
        match name {
            NativeName::Ansi(ansi) => CreateFileA(
                ansi.as_ptr().cast(),
                access,
                share,
                &security,
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                std::ptr::null_mut(),
            ),
            NativeName::Wide(wide) => CreateFileW(
                wide.as_ptr(),
                access,
                share,
                &security,
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                std::ptr::null_mut(),
            ),
        }
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(MapError::last_os(ErrorKind::Open, "CreateFile failed").into());
    }
    // SAFETY: `handle` is a freshly created file handle owned by nobody else.
    Ok(unsafe { OwnedHandle::from_raw_handle(handle as RawHandle) })
}

fn configure_inheritance(file: &OwnedHandle, inheritable: bool) -> Result<()> {
    let flag = if inheritable { HANDLE_FLAG_INHERIT } else { 0 };
    // SAFETY: the handle is open; only its inherit flag is changed.
    if unsafe { SetHandleInformation(raw(file), HANDLE_FLAG_INHERIT, flag) } == 0 {
        return Err(
            MapError::last_os(ErrorKind::Inheritance, "SetHandleInformation failed").into(),
        );
    }
    Ok(())
}

fn file_size(file: &OwnedHandle) -> Result<u64> {
    let mut size: i64 = 0;
    // SAFETY: `size` is writable for the duration of the call.
    if unsafe { GetFileSizeEx(raw(file), &mut size) } == 0 {
        return Err(MapError::last_os(ErrorKind::Open, "GetFileSizeEx failed").into());
    }
    Ok(size as u64)
}

fn create_mapping(
    file: &OwnedHandle,
    protect: PAGE_PROTECTION_FLAGS,
    max: u64,
) -> Result<OwnedHandle> {
    // SAFETY: the file handle is open with access matching `protect`; default
    // security attributes make the mapping object non-inheritable.
    let mapping = unsafe {
        CreateFileMappingW(
            raw(file),
            std::ptr::null(),
            protect,
            (max >> 32) as u32,
            max as u32,
            std::ptr::null(),
        )
    };
    if mapping.is_null() {
        return Err(MapError::last_os(ErrorKind::Mapping, "CreateFileMappingW failed").into());
    }
    // SAFETY: `mapping` is a fresh handle owned by nobody else.
    Ok(unsafe { OwnedHandle::from_raw_handle(mapping as RawHandle) })
}

fn map_view(mapping: &OwnedHandle, access: u32, alignment: &Alignment) -> Result<NonNull<u8>> {
    // SAFETY: the mapping object is live and covers offset..offset+size.
    let view = unsafe {
        MapViewOfFile(
            raw(mapping),
            access,
            (alignment.offset >> 32) as u32,
            alignment.offset as u32,
            alignment.size,
        )
    };
    NonNull::new(view.Value.cast::<u8>())
        .ok_or_else(|| MapError::last_os(ErrorKind::Mapping, "MapViewOfFile failed").into())
}

impl Mapping for WindowsMapping {
    fn acquire(&mut self) -> *mut u8 {
        self.start()
    }

    fn release(&mut self, _ptr: *mut u8) {}

    fn length(&self) -> usize {
        self.len - self.shift
    }

    fn destroy(self) {
        log::debug!("UnmapViewOfFile len {}", self.len);
        drop(self);
    }
}

impl Drop for WindowsMapping {
    fn drop(&mut self) {
        let address = MEMORY_MAPPED_VIEW_ADDRESS {
            Value: self.view.as_ptr().cast(),
        };
        // SAFETY: `address` is the base MapViewOfFile returned; the handles are
        // closed afterwards when the fields drop.
        if unsafe { UnmapViewOfFile(address) } == 0 {
            log::warn!(
                "UnmapViewOfFile of {} bytes failed: {}",
                self.len,
                std::io::Error::last_os_error()
            );
        }
    }
}

impl AsRawHandle for WindowsMapping {
    fn as_raw_handle(&self) -> RawHandle {
        self.file.as_raw_handle()
    }
}
