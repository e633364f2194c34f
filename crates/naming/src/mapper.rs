use crate::error::{ErrorKind, Result};
use crate::normalize::normalize;
use crate::{Overrides, ROOT, SEPARATOR};
use tracing::trace;

const DRAFTS: &str = "Drafts";
const TRASH: &str = "Trash";

/// Computes the remote label for a local folder.
///
/// In the default mode every component of the folder path is passed through
/// the [`Overrides`], the components are rejoined and the result normalized.
/// A forced subfolder is then prepended.
///
/// In flatten mode every folder goes to one label: the forced subfolder, or
/// the label of the spool root when there is none. Only the drafts and trash
/// folders (and anything beneath them) keep a label of their own.
#[derive(Debug, Clone, Default)]
pub struct LabelMapper {
    overrides: Overrides,
    flatten: bool,
    subfolder: Option<String>,
}

impl LabelMapper {
    pub fn new(overrides: Overrides) -> Self {
        Self {
            overrides,
            flatten: false,
            subfolder: None,
        }
    }

    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Nest every label under `subfolder`.
    pub fn with_subfolder(mut self, subfolder: Option<&str>) -> Result<Self> {
        self.subfolder = match subfolder {
            None => None,
            Some(raw) => {
                let name = normalize(raw);
                if name.is_empty() || name.starts_with(SEPARATOR) || name.ends_with(SEPARATOR) {
                    exn::bail!(ErrorKind::InvalidSubfolder(raw.to_string()));
                }
                Some(name)
            },
        };
        Ok(self)
    }

    pub fn subfolder(&self) -> Option<&str> {
        self.subfolder.as_deref()
    }

    /// Label name for a folder (`.` for the spool root, `/` separated).
    pub fn map(&self, folder: &str) -> Result<String> {
        let label = if self.flatten {
            self.flattened(folder)?
        } else {
            let name = self.rename(folder)?;
            match &self.subfolder {
                Some(prefix) => format!("{prefix}{SEPARATOR}{name}"),
                None => name,
            }
        };
        trace!(folder, label = %label, "mapped folder");
        Ok(label)
    }

    fn rename(&self, folder: &str) -> Result<String> {
        let joined = folder
            .split(SEPARATOR)
            .map(|component| self.overrides.get(component).unwrap_or(component))
            .collect::<Vec<_>>()
            .join("/");
        let name = normalize(&joined);
        if name.is_empty() {
            exn::bail!(ErrorKind::EmptyName(folder.to_string()));
        }
        Ok(name)
    }

    fn flattened(&self, folder: &str) -> Result<String> {
        let first = normalize(folder.split(SEPARATOR).next().unwrap_or_default());
        let special = [DRAFTS, TRASH].into_iter().find(|name| first.eq_ignore_ascii_case(name));
        Ok(match (special, &self.subfolder) {
            (Some(name), Some(prefix)) => format!("{prefix}{SEPARATOR}{name}"),
            (Some(name), None) => self.rename(name)?,
            (None, Some(prefix)) => prefix.clone(),
            (None, None) => self.rename(ROOT)?,
        })
    }
}
