//! Flag lists and named flag profiles.

use rustc_hash::FxHashMap;
use tracing::warn;

use smelt_hash::{string_checksum, ContentHash};

use crate::ToolError;

/// An ordered list of command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(Vec<String>);

impl Flags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, flag: impl Into<String>) {
        self.0.push(flag.into());
    }

    pub fn extend<I, S>(&mut self, flags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(flags.into_iter().map(Into::into));
    }

    /// Strip a flag the build manages itself, wherever a user profile put it.
    ///
    /// Handles both the separated (`-J /tmp`) and joined (`-J/tmp`)
    /// spellings when `has_parameter` is set.
    pub fn remove_flag(&mut self, flag: &str, has_parameter: bool) {
        let mut i = 0;
        while i < self.0.len() {
            if self.0[i] == flag {
                warn!(flag, "removing managed flag from user flags");
                self.0.remove(i);
                if has_parameter {
                    if i < self.0.len() {
                        self.0.remove(i);
                    } else {
                        warn!(flag, "flag expects a parameter but none followed");
                    }
                }
                continue;
            }
            if has_parameter && self.0[i].starts_with(flag) {
                warn!(flag = %self.0[i], "removing managed flag from user flags");
                self.0.remove(i);
                continue;
            }
            i += 1;
        }
    }

    /// A stable checksum over the exact flag sequence. Order matters:
    /// `-O2 -g` and `-g -O2` are different compilations.
    #[must_use]
    pub fn checksum(&self) -> ContentHash {
        string_checksum(&self.0.join(" "))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Flags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for Flags {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Named flag profiles with single inheritance.
///
/// A profile's effective flags are its parent chain's flags (outermost
/// first) followed by its own. The parent relation is an explicit map and a
/// cycle is rejected when the profile is defined, so lookup can recurse
/// without a visited set.
#[derive(Debug, Clone)]
pub struct ProfileFlags {
    profiles: FxHashMap<String, Flags>,
    parents: FxHashMap<String, String>,
}

impl ProfileFlags {
    /// The default profile, named by the empty string, always exists.
    #[must_use]
    pub fn new() -> Self {
        let mut profiles = FxHashMap::default();
        profiles.insert(String::new(), Flags::new());
        Self {
            profiles,
            parents: FxHashMap::default(),
        }
    }

    pub fn define_profile(
        &mut self,
        name: &str,
        inherit_from: Option<&str>,
    ) -> Result<(), ToolError> {
        let name = name.to_lowercase();
        if let Some(parent) = inherit_from {
            let parent = parent.to_lowercase();
            if !self.profiles.contains_key(&parent) {
                return Err(ToolError::ProfileNotDefined { profile: parent });
            }
            // Walk the existing chain from the parent; finding `name` there
            // means this definition would close a loop.
            let mut current = Some(parent.clone());
            while let Some(ancestor) = current {
                if ancestor == name {
                    return Err(ToolError::ProfileCycle { profile: name });
                }
                current = self.parents.get(&ancestor).cloned();
            }
            self.parents.insert(name.clone(), parent);
        }
        self.profiles.entry(name).or_default();
        Ok(())
    }

    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.profiles.contains_key(&name.to_lowercase())
    }

    pub fn add_flags<I, S>(&mut self, profile: &str, flags: I) -> Result<(), ToolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let profile = profile.to_lowercase();
        match self.profiles.get_mut(&profile) {
            Some(existing) => {
                existing.extend(flags);
                Ok(())
            }
            None => Err(ToolError::ProfileNotDefined { profile }),
        }
    }

    /// The effective flags of `profile`, parent chain included.
    pub fn flags(&self, profile: &str) -> Result<Flags, ToolError> {
        let profile = profile.to_lowercase();
        let own = self
            .profiles
            .get(&profile)
            .ok_or(ToolError::ProfileNotDefined {
                profile: profile.clone(),
            })?;

        let mut resolved = match self.parents.get(&profile) {
            Some(parent) => self.flags(parent)?,
            None => Flags::new(),
        };
        resolved.extend(own.as_slice().iter().cloned());
        Ok(resolved)
    }
}

impl Default for ProfileFlags {
    fn default() -> Self {
        Self::new()
    }
}
