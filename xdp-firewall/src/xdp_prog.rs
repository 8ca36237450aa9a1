//! # XDP Program Loading and Feature Querying
//!
//! ## Purpose
//!
//! Loads the precompiled classifier object into the kernel, attaches its
//! program to the XDP hook of an interface and hands out typed handles on the
//! maps it exports.
//!
//! ## How it works
//!
//! A thin wrapper around `libbpf-sys`. `attach_program` opens the object from
//! memory, loads it, finds the program by name and attaches it; every step
//! failing becomes `Error::ResourceAttachFailed`. `LoadedProgram` owns the
//! object and the link and releases both in `Drop`, so every exit path
//! detaches the program. `LoadedProgram::map` checks the key and value sizes
//! declared by the object against the Rust types before returning a handle.
//!
//! ## Main components
//!
//! - `attach_program()`, `LoadedProgram`: program lifecycle.
//! - `remove_memlock_limit()`: lifts `RLIMIT_MEMLOCK` for older kernels.
//! - `check_capabilities()`: warns about missing capabilities.
//! - `xdp_features()`: queries the XDP feature flags of the driver.

use crate::error::Error;
use crate::maps::{BpfMap, Pod};
use caps::{CapSet, Capability};
use std::ffi::CString;
use std::io;
use std::mem::size_of;
use std::path::Path;

/// Queries the XDP feature flags (`NETDEV_XDP_ACT_*`) of the driver behind
/// `if_index`.
pub fn xdp_features(if_index: u32) -> io::Result<u32> {
    Ok(unsafe {
        let mut opts: libbpf_sys::bpf_xdp_query_opts = std::mem::zeroed();
        opts.sz = size_of::<libbpf_sys::bpf_xdp_query_opts>() as u64;
        if libbpf_sys::bpf_xdp_query(
            if_index as libc::c_int,
            libbpf_sys::XDP_FLAGS_DRV_MODE as libc::c_int,
            &mut opts,
        ) < 0
        {
            return Err(io::Error::other(format!(
                "Failed to query XDP features: {}",
                io::Error::last_os_error()
            )));
        }
        opts.feature_flags as u32
    })
}

/// Lifts the locked memory limit; kernels before 5.11 charge BPF maps
/// against it.
pub fn remove_memlock_limit() -> Result<(), Error> {
    let rlim = libc::rlimit {
        rlim_cur: libc::RLIM_INFINITY,
        rlim_max: libc::RLIM_INFINITY,
    };
    if unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlim) } != 0 {
        return Err(Error::attach("memlock limit")(io::Error::last_os_error()));
    }
    Ok(())
}

/// Capabilities needed to load and attach the program.
pub const REQUIRED_CAPS: &[Capability] = &[Capability::CAP_NET_ADMIN, Capability::CAP_BPF];

/// Returns the capabilities of `REQUIRED_CAPS` missing from the effective
/// set. The kernel has the final word, so this only feeds a warning.
pub fn check_capabilities() -> Vec<Capability> {
    REQUIRED_CAPS
        .iter()
        .copied()
        .filter(|cap| match caps::has_cap(None, CapSet::Effective, *cap) {
            Ok(present) => !present,
            Err(e) => {
                log::debug!("querying {cap}: {e}");
                true
            }
        })
        .collect()
}

/// A classifier program attached to an interface, detached on drop.
pub struct LoadedProgram {
    if_index: u32,
    name: String,
    _code: Vec<u8>,
    bpf_obj: *mut libbpf_sys::bpf_object,
    bpf_link: *mut libbpf_sys::bpf_link,
}

impl LoadedProgram {
    pub fn if_index(&self) -> u32 {
        self.if_index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle on the map called `name`, provided its key and value sizes are
    /// those of `K` and `V`.
    pub fn map<K: Pod, V: Pod>(&self, name: &str) -> Result<BpfMap<'_, K, V>, Error> {
        let cname = CString::new(name).map_err(|e| Error::attach(format!("map {name:?}"))(e.into()))?;
        let map = unsafe { libbpf_sys::bpf_object__find_map_by_name(self.bpf_obj, cname.as_ptr()) };
        if map.is_null() {
            return Err(Error::attach(format!("map {name:?}"))(io::Error::from(
                io::ErrorKind::NotFound,
            )));
        }
        let key_size = unsafe { libbpf_sys::bpf_map__key_size(map) } as usize;
        let value_size = unsafe { libbpf_sys::bpf_map__value_size(map) } as usize;
        for (field, expected, actual) in [
            ("key", size_of::<K>(), key_size),
            ("value", size_of::<V>(), value_size),
        ] {
            if expected != actual {
                return Err(Error::LayoutMismatch {
                    map: name.to_string(),
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(unsafe { BpfMap::new(map, name) })
    }
}

impl Drop for LoadedProgram {
    fn drop(&mut self) {
        if !self.bpf_link.is_null() {
            unsafe { libbpf_sys::bpf_link__destroy(self.bpf_link) };
        }
        if !self.bpf_obj.is_null() {
            unsafe { libbpf_sys::bpf_object__close(self.bpf_obj) };
        }
        if self.if_index != 0 {
            log::info!("detached {} from interface {}", self.name, self.if_index);
        }
    }
}

/// Reads an object file produced by clang for the BPF target.
pub fn read_object(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(Error::attach(format!("object {}", path.display())))
}

/// Loads the object `code` and attaches its program `name` to `if_index`.
pub fn attach_program(if_index: u32, code: Vec<u8>, name: &str) -> Result<LoadedProgram, Error> {
    let mut prog = LoadedProgram {
        if_index: 0,
        name: name.to_string(),
        _code: code,
        bpf_obj: std::ptr::null_mut(),
        bpf_link: std::ptr::null_mut(),
    };

    unsafe {
        let mut opts: libbpf_sys::bpf_object_open_opts = std::mem::zeroed();
        opts.sz = size_of::<libbpf_sys::bpf_object_open_opts>() as u64;
        prog.bpf_obj = libbpf_sys::bpf_object__open_mem(
            prog._code.as_ptr() as *const libc::c_void,
            prog._code.len() as libbpf_sys::size_t,
            &opts,
        );
        if prog.bpf_obj.is_null() {
            return Err(Error::attach("BPF object")(io::Error::last_os_error()));
        }

        let ret = libbpf_sys::bpf_object__load(prog.bpf_obj);
        if ret != 0 {
            return Err(Error::attach("BPF object")(io::Error::from_raw_os_error(-ret)));
        }

        let cname = CString::new(name).map_err(|e| Error::attach(format!("program {name:?}"))(e.into()))?;
        let bpf_prog = libbpf_sys::bpf_object__find_program_by_name(prog.bpf_obj, cname.as_ptr());
        if bpf_prog.is_null() {
            return Err(Error::attach(format!("program {name:?}"))(io::Error::from(
                io::ErrorKind::NotFound,
            )));
        }

        prog.bpf_link = libbpf_sys::bpf_program__attach_xdp(bpf_prog, if_index as libc::c_int);
        if prog.bpf_link.is_null() {
            return Err(Error::attach(format!("{name} to interface {if_index}"))(
                io::Error::last_os_error(),
            ));
        }
    }

    prog.if_index = if_index;
    log::info!("attached {name} to interface {if_index}");
    Ok(prog)
}
