//! Content roots and exclusion rules deciding which paths get history.

use crate::kernel::services::ports::HistoryConfig;
use crate::models::{CaseSensitivity, VcsPath};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use rustc_hash::FxHashSet;

#[derive(Debug, Clone)]
pub struct FileFilter {
    roots: Vec<VcsPath>,
    case: CaseSensitivity,
    ignored_names: FxHashSet<String>,
    exclude: GlobSet,
}

impl FileFilter {
    pub fn new<S: AsRef<str>>(
        roots: Vec<VcsPath>,
        ignored_names: &[S],
        exclude: &[S],
        case: CaseSensitivity,
    ) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in exclude {
            builder.add(
                GlobBuilder::new(pattern.as_ref())
                    .case_insensitive(case == CaseSensitivity::Insensitive)
                    .literal_separator(false)
                    .build()?,
            );
        }

        Ok(Self {
            roots,
            case,
            ignored_names: ignored_names
                .iter()
                .map(|name| case.name_key(name.as_ref()))
                .collect(),
            exclude: builder.build()?,
        })
    }

    pub fn from_config(config: &HistoryConfig) -> Result<Self, globset::Error> {
        let roots = config
            .content_roots
            .iter()
            .map(|root| VcsPath::from_fs(root))
            .collect();
        Self::new(
            roots,
            config.ignored_names.as_slice(),
            config.exclude.as_slice(),
            config.case_sensitivity(),
        )
    }

    pub fn roots(&self) -> &[VcsPath] {
        &self.roots
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    pub fn root_of(&self, path: &VcsPath) -> Option<&VcsPath> {
        self.roots
            .iter()
            .filter(|root| root.is_ancestor_of(path, self.case))
            .max_by_key(|root| root.as_str().len())
    }

    pub fn is_under_content_root(&self, path: &VcsPath) -> bool {
        self.root_of(path).is_some()
    }

    pub fn is_allowed(&self, path: &VcsPath, _is_dir: bool) -> bool {
        let skip = self
            .root_of(path)
            .map(|root| root.components().count())
            .unwrap_or(0);
        if path
            .components()
            .skip(skip)
            .any(|name| self.ignored_names.contains(&self.case.name_key(name)))
        {
            return false;
        }
        !self.exclude.is_match(path.as_str())
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/file_filter.rs"]
mod tests;
