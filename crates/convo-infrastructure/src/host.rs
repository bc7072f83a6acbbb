//! Host identity derivation (spec §3 glossary: `HostId`).

use convo_domain::error::{Error, Result};
use convo_domain::value_objects::HostId;

/// Derives this host's stable `HostId` from its OS hostname.
///
/// # Errors
///
/// Returns an error if the hostname cannot be read or is not valid UTF-8.
pub fn resolve_host_id() -> Result<HostId> {
    let raw = hostname::get().map_err(|e| Error::internal(format!("failed to read hostname: {e}")))?;
    let hostname = raw
        .into_string()
        .map_err(|_| Error::internal("hostname is not valid UTF-8"))?;
    Ok(HostId::from_hostname(&hostname))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_host_id_is_stable_within_a_process() {
        let a = resolve_host_id().unwrap();
        let b = resolve_host_id().unwrap();
        assert_eq!(a, b);
    }
}
