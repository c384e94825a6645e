//! Modfile Zip
//!
//! Helpers for laying out module archives.

use modfile_core::version::toolchain;
use std::cmp::Ordering;
use tracing::trace;

/// Vendor manifest, shipped in archives since go 1.24
pub const MANIFEST: &str = "vendor/modules.txt";

/// First toolchain whose archives keep the vendor manifest
const MANIFEST_SINCE: &str = "go1.24";

/// Report whether an archive entry belongs to a vendored package
///
/// `name` is a slash-separated path relative to the module root and
/// `go_version` the toolchain of the `go` directive (`""` when unknown).
///
/// Entries under `vendor/` count when they sit in a package directory, not
/// directly in `vendor/`. For a nested `vendor/` directory the remainder is
/// measured from the start of `name`, not from the match, which makes
/// `pkg/vendor/vendor.go` count as vendored. Archives built by older
/// toolchains rely on that.
pub fn is_vendored_package(name: &str, go_version: &str) -> bool {
    let offset = if name.starts_with("vendor/") {
        "vendor/".len()
    } else if name.contains("/vendor/") {
        "/vendor/".len()
    } else {
        return false;
    };

    let rest = name.as_bytes().get(offset..).unwrap_or_default();
    let vendored = rest.contains(&b'/')
        || (name == MANIFEST && toolchain::compare(go_version, MANIFEST_SINCE) != Ordering::Less);
    trace!("{} vendored for {:?}: {}", name, go_version, vendored);
    vendored
}
