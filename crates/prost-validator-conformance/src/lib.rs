//! Fixture messages and the validators generated for them by `build.rs`.
//!
//! Each package module holds the prost output and the generated validators
//! side by side, the way a consuming crate includes them.

#![allow(missing_docs, clippy::pedantic)]

pub mod example {
    pub mod common {
        include!(concat!(env!("OUT_DIR"), "/example.common.rs"));
        include!(concat!(env!("OUT_DIR"), "/example/common/status_validate.rs"));
    }

    pub mod v1 {
        include!(concat!(env!("OUT_DIR"), "/example.v1.rs"));
        include!(concat!(env!("OUT_DIR"), "/example/v1/person_validate.rs"));
    }
}

/// Functions called from generated code through `validate.toml`.
pub mod helpers {
    const RESERVED: [&str; 3] = ["Admin", "Root", "System"];

    /// False for names reserved by the system.
    #[must_use]
    pub fn not_reserved(name: &str) -> bool {
        !RESERVED.contains(&name)
    }
}
