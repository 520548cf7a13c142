use std::fmt;
use std::path::PathBuf;

/// Identifies which configuration document a call addresses.
///
/// Descriptors belong to the host; the store only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Descriptor {
    /// The platform-wide configuration.
    Global,
    Module(ModuleRef),
}

/// A named module, optionally with a key the host already resolved for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    pub name: String,
    /// Folder the module was loaded from; used verbatim as its key when set.
    pub folder_path: Option<PathBuf>,
}

impl Descriptor {
    pub fn module(name: impl Into<String>) -> Self {
        Self::Module(ModuleRef { name: name.into(), folder_path: None })
    }

    pub fn module_at(name: impl Into<String>, folder_path: impl Into<PathBuf>) -> Self {
        Self::Module(ModuleRef { name: name.into(), folder_path: Some(folder_path.into()) })
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Module(m) => write!(f, "module:{}", m.name),
        }
    }
}
