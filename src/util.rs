// Helper functions for service/port handling.

use std::ffi::CString;

/// True when the service string is entirely decimal digits, i.e. a
/// port literal that must not go through a services(5) lookup.
pub fn is_numeric_service(service: &str) -> bool {
    !service.is_empty() && service.bytes().all(|b| b.is_ascii_digit())
}

/// Look up a service name ("http", "ssh", ...) as a TCP port via
/// getservbyname(3). Returns None when the name is unknown.
pub fn lookup_service_port(name: &str) -> Option<u16> {
    let c_name = CString::new(name).ok()?;
    let c_proto = CString::new("tcp").ok()?;
    unsafe {
        // getservbyname points into static storage; copy the port out
        // and never hold the pointer.
        let ent = libc::getservbyname(c_name.as_ptr(), c_proto.as_ptr());
        if ent.is_null() {
            None
        } else {
            // s_port is in network byte order
            Some(u16::from_be((*ent).s_port as u16))
        }
    }
}
