use std::{ptr::NonNull, sync::OnceLock};

/// This trait provides an abstraction to handle low level memory operations
/// and syscalls. The pools, our top level view of this, have nothing to do
/// with the concrete APIs offered by each kernel.
///
/// Pool regions come straight from the operating system. We never go through
/// the global Rust allocator for them, so this crate can back code that is
/// itself avoiding that allocator.
pub(crate) trait PlatformMemory {
    /// Request a memory mapping of size `len`. It returns a pointer to the
    /// given location or `None` if the underlying syscall fails.
    unsafe fn request_memory(len: usize) -> Option<NonNull<u8>>;

    /// Returns the mapping of size `len` starting from `addr` back to the
    /// kernel.
    unsafe fn return_memory(addr: *mut u8, len: usize);

    /// Virtual memory page size of the computer in bytes.
    fn query_page_size() -> usize;
}

/// Unit type the per-platform implementations hang off.
pub(crate) struct Platform;

static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

/// Cached wrapper around [`PlatformMemory::query_page_size`]. Usually 4096,
/// but we can't know the value at compile time.
#[inline]
pub(crate) fn page_size() -> usize {
    *PAGE_SIZE.get_or_init(Platform::query_page_size)
}

#[cfg(unix)]
mod unix {
    use super::{Platform, PlatformMemory};

    use libc::{mmap, munmap, off_t, size_t};

    use std::{
        os::raw::{c_int, c_void},
        ptr::NonNull,
    };

    impl PlatformMemory for Platform {
        unsafe fn request_memory(len: usize) -> Option<NonNull<u8>> {
            // mmap parameters.
            const ADDR: *mut c_void = std::ptr::null_mut::<c_void>();
            // Read-Write only memory.
            const PROT: c_int = libc::PROT_READ | libc::PROT_WRITE;
            const FLAGS: c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
            const FD: c_int = -1;
            const OFFSET: off_t = 0;

            unsafe {
                let addr = mmap(ADDR, len as size_t, PROT, FLAGS, FD, OFFSET);

                match addr {
                    libc::MAP_FAILED => None,
                    addr => Some(NonNull::new_unchecked(addr).cast::<u8>()),
                }
            }
        }

        unsafe fn return_memory(addr: *mut u8, len: usize) {
            unsafe {
                munmap(addr as *mut c_void, len as size_t);
            }
        }

        fn query_page_size() -> usize {
            unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) as usize }
        }
    }
}

#[cfg(windows)]
mod windows {
    use std::{mem::MaybeUninit, os::raw::c_void, ptr::NonNull};

    use crate::platform::{Platform, PlatformMemory};

    use windows::Win32::System::{Memory, SystemInformation};

    impl PlatformMemory for Platform {
        unsafe fn request_memory(len: usize) -> Option<NonNull<u8>> {
            // Read-Write only.
            let protection = Memory::PAGE_READWRITE;

            let flags = Memory::MEM_RESERVE | Memory::MEM_COMMIT;

            unsafe {
                let addr = Memory::VirtualAlloc(None, len, flags, protection);

                NonNull::new(addr.cast())
            }
        }

        unsafe fn return_memory(addr: *mut u8, _len: usize) {
            unsafe {
                Memory::VirtualFree(addr as *mut c_void, 0, Memory::MEM_RELEASE);
            }
        }

        fn query_page_size() -> usize {
            unsafe {
                let mut system_info = MaybeUninit::uninit();
                SystemInformation::GetSystemInfo(system_info.as_mut_ptr());

                system_info.assume_init().dwPageSize as usize
            }
        }
    }
}
