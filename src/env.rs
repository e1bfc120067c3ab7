use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
};

pub const RUSTFLAGS: &str = "RUSTFLAGS";
pub const PROFILE_RELEASE_LTO: &str = "CARGO_PROFILE_RELEASE_LTO";
/// Picked up by the nmk build script to embed the commit the binary was built from.
pub const GIT_SHORT_SHA: &str = "GIT_SHORT_SHA";

const STRIP_FLAGS: [&str; 2] = ["-C", "link-arg=-s"];

pub fn rust_flags(strip: bool) -> String {
    let mut flags = vec![];
    if strip {
        flags.extend(STRIP_FLAGS);
    }
    flags.join(" ")
}

/// Variables laid over the inherited environment when a subprocess is spawned.
///
/// Entries here win over inherited variables of the same name. The overlay is built once and
/// never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay(BTreeMap<String, String>);

impl EnvOverlay {
    pub fn for_release(strip: bool, lto: bool, commit_id: Option<&str>) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(RUSTFLAGS.to_string(), rust_flags(strip));
        if lto {
            vars.insert(PROFILE_RELEASE_LTO.to_string(), "true".to_string());
        }
        if let Some(commit_id) = commit_id {
            vars.insert(GIT_SHORT_SHA.to_string(), commit_id.to_string());
        }
        Self(vars)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Display for EnvOverlay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}={:?}", k, v)?;
            first = false;
        }
        Ok(())
    }
}
