//! Path derivation — maps a sample identity to its canonical archive path.
//!
//! The mapping is `{data_dir}/{host}/{plugin[-plugin_instance]}/{type[-type_instance]}.rrd`
//! and is deliberately dumb: no separator sanitizing, no existence checks.
//! Callers are responsible for clean identifiers.

use crate::error::{RrdSinkError, RrdSinkResult};
use crate::sample::Identity;
use std::path::Path;

/// Fixed path buffer size the archive path must fit in, NUL included.
pub const MAX_PATH_LEN: usize = 512;

/// Derive the archive file path for an identity tuple.
///
/// Deterministic and idempotent: equal inputs yield equal strings. Paths of
/// [`MAX_PATH_LEN`] bytes or more are a hard error.
pub fn archive_path(data_dir: Option<&Path>, identity: &Identity) -> RrdSinkResult<String> {
    let mut path = String::with_capacity(64);

    if let Some(dir) = data_dir {
        path.push_str(&dir.to_string_lossy());
        path.push('/');
    }

    path.push_str(&identity.host);
    path.push('/');
    path.push_str(&identity.plugin);
    if !identity.plugin_instance.is_empty() {
        path.push('-');
        path.push_str(&identity.plugin_instance);
    }
    path.push('/');
    path.push_str(&identity.type_name);
    if !identity.type_instance.is_empty() {
        path.push('-');
        path.push_str(&identity.type_instance);
    }
    path.push_str(".rrd");

    if path.len() >= MAX_PATH_LEN {
        return Err(RrdSinkError::PathTooLong {
            path,
            limit: MAX_PATH_LEN,
        });
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_identity_with_data_dir() {
        let identity = Identity::new("h1", "cpu", "0", "cpu", "user");
        let path = archive_path(Some(Path::new("/var/lib/collectd")), &identity).unwrap();
        assert_eq!(path, "/var/lib/collectd/h1/cpu-0/cpu-user.rrd");
    }

    #[test]
    fn empty_instances_are_omitted() {
        let identity = Identity::new("h1", "load", "", "load", "");
        let path = archive_path(None, &identity).unwrap();
        assert_eq!(path, "h1/load/load.rrd");
    }

    #[test]
    fn oversize_path_rejected() {
        let identity = Identity::new("h".repeat(600), "cpu", "", "cpu", "");
        let err = archive_path(None, &identity).unwrap_err();
        assert!(matches!(err, RrdSinkError::PathTooLong { .. }));
    }

    #[test]
    fn boundary_is_exclusive() {
        // host + "/x/y.rrd", with a host length putting the total at 511.
        let suffix_len = "/x/y.rrd".len();
        let identity = Identity::new(
            "h".repeat(MAX_PATH_LEN - 1 - suffix_len),
            "x",
            "",
            "y",
            "",
        );
        let path = archive_path(None, &identity).unwrap();
        assert_eq!(path.len(), MAX_PATH_LEN - 1);

        let identity = Identity::new("h".repeat(MAX_PATH_LEN - suffix_len), "x", "", "y", "");
        assert!(archive_path(None, &identity).is_err());
    }

    proptest! {
        #[test]
        fn derivation_is_idempotent(
            host in "[a-z0-9]{1,16}",
            plugin in "[a-z0-9]{1,16}",
            plugin_instance in "[a-z0-9]{0,8}",
            type_name in "[a-z0-9]{1,16}",
            type_instance in "[a-z0-9]{0,8}",
        ) {
            let identity = Identity::new(host, plugin, plugin_instance, type_name, type_instance);
            let first = archive_path(Some(Path::new("/var/lib/collectd")), &identity).unwrap();
            let second = archive_path(Some(Path::new("/var/lib/collectd")), &identity).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(first.ends_with(".rrd"));
        }
    }
}
