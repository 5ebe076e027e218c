//! TX checksum offload control via the ethtool ioctl
//!
//! Checksum offload on the container end of a veth pair produces packets
//! with unfilled checksums that the overlay forwards verbatim, so it is
//! switched off at attach time unless the caller opts out.

use crate::error::NetworkError;

const SIOCETHTOOL: libc::c_ulong = 0x8946;
const ETHTOOL_STXCSUM: u32 = 0x17;

#[repr(C)]
struct EthtoolValue {
    cmd: u32,
    data: u32,
}

/// Disables TX checksum offload on the named interface in the current
/// network namespace.
pub fn tx_checksum_off(ifname: &str) -> Result<(), NetworkError> {
    // Room for the trailing NUL of ifr_name.
    if ifname.len() >= libc::IFNAMSIZ {
        return Err(NetworkError::OperationFailed(format!(
            "interface name {ifname:?} too long for ioctl"
        )));
    }

    let mut value = EthtoolValue {
        cmd: ETHTOOL_STXCSUM,
        data: 0,
    };
    let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
    for (dst, src) in ifr.ifr_name.iter_mut().zip(ifname.as_bytes()) {
        *dst = *src as libc::c_char;
    }
    unsafe {
        ifr.ifr_ifru.ifru_data = (&mut value as *mut EthtoolValue).cast();
    }

    let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0) };
    if fd < 0 {
        return Err(NetworkError::OperationFailed(format!(
            "ethtool socket: {}",
            std::io::Error::last_os_error()
        )));
    }
    let rc = unsafe { libc::ioctl(fd, SIOCETHTOOL, &mut ifr) };
    let ioctl_err = std::io::Error::last_os_error();
    unsafe { libc::close(fd) };
    if rc < 0 {
        return Err(NetworkError::OperationFailed(format!(
            "disable TX checksum offload on {ifname}: {ioctl_err}"
        )));
    }
    Ok(())
}
