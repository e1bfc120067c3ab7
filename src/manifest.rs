use anyhow::Context;
use semver::Version;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug)]
struct Manifest {
    package: Option<Package>,
}

// `version` stays untyped: it may be a table like `{ workspace = true }`.
#[derive(Deserialize, Debug)]
struct Package {
    version: Option<toml::Value>,
}

/// Reads `package.version` from a Cargo manifest.
///
/// Returns `Ok(None)` when the manifest has no package section or inherits its version from a
/// workspace.
pub fn package_version(path: impl AsRef<Path>) -> anyhow::Result<Option<Version>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let manifest: Manifest = toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let version = match manifest.package.and_then(|p| p.version) {
        Some(toml::Value::String(v)) => v,
        _ => return Ok(None),
    };
    let version = Version::parse(&version).with_context(|| format!("version `{}` in {}", version, path.display()))?;
    Ok(Some(version))
}
