//! Ambient helpers shared by the store crates.

pub mod utils {
    pub mod logging;
}
