//! Storage key derivation.
//!
//! Keys look like filesystem paths: the global document lives at a fixed root
//! and every module under `<modules root>/<name>`. A key computed for a module
//! name is cached for the life of the resolver, so repeated lookups for the
//! same module never recompute it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use configs::PathsConfig;
use dashmap::DashMap;

use crate::descriptor::Descriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRoots {
    pub modules_root: PathBuf,
    pub global_root: PathBuf,
}

impl KeyRoots {
    pub fn new(modules_root: impl Into<PathBuf>, global_root: impl Into<PathBuf>) -> Self {
        Self { modules_root: modules_root.into(), global_root: global_root.into() }
    }

    /// Local runs keep global configuration at the platform root; otherwise
    /// it sits at the modules root.
    pub fn from_paths(paths: &PathsConfig) -> Self {
        let modules_root = PathBuf::from(&paths.modules_dir);
        let global_root = if paths.run_as_local { PathBuf::from(&paths.root_dir) } else { modules_root.clone() };
        Self { modules_root, global_root }
    }
}

pub struct KeyResolver {
    roots: KeyRoots,
    global_indicator: Descriptor,
    global_key: String,
    cache: DashMap<String, String>,
    computed: AtomicUsize,
}

impl KeyResolver {
    pub fn new(roots: KeyRoots, global_indicator: Descriptor) -> Self {
        let global_key = path_key(&roots.global_root);
        Self { roots, global_indicator, global_key, cache: DashMap::new(), computed: AtomicUsize::new(0) }
    }

    /// Storage key for a descriptor. Pure: no I/O, same input same key.
    pub fn resolve(&self, descriptor: &Descriptor) -> String {
        if *descriptor == self.global_indicator {
            return self.global_key.clone();
        }
        match descriptor {
            Descriptor::Global => self.global_key.clone(),
            Descriptor::Module(m) => {
                if let Some(folder) = &m.folder_path {
                    return path_key(folder);
                }
                if let Some(hit) = self.cache.get(&m.name) {
                    return hit.value().clone();
                }
                self.cache
                    .entry(m.name.clone())
                    .or_insert_with(|| {
                        self.computed.fetch_add(1, Ordering::Relaxed);
                        path_key(&self.roots.modules_root.join(&m.name))
                    })
                    .value()
                    .clone()
            }
        }
    }

    pub fn is_cached(&self, module_name: &str) -> bool { self.cache.contains_key(module_name) }

    /// Number of keys computed so far (cache misses).
    pub fn computed(&self) -> usize { self.computed.load(Ordering::Relaxed) }
}

fn path_key(path: &Path) -> String { path.to_string_lossy().into_owned() }
