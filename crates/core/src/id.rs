// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes and generators

use parking_lot::Mutex;
use std::sync::Arc;

/// Returns a string slice truncated to at most `n` bytes, never splitting a
/// character.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        return s;
    }
    let mut end = n;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Define a string newtype ID backed by `SmolStr`.
///
/// Generates `new()`, `as_str()`, `short()`, `Display`, `From<String>`,
/// `From<&str>`, `PartialEq<str>`, `Borrow<str>` and `Deref` implementations.
/// IDs are opaque: entity ids are file paths or test-case ids chosen by the
/// user, job ids are issued by the backend.
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct JobId;
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub smol_str::SmolStr);

        impl $name {
            pub fn new(id: impl Into<smol_str::SmolStr>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the ID truncated to at most `n` bytes, for display.
            pub fn short(&self, n: usize) -> &str {
                $crate::id::short(&self.0, n)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Key of an editable entity: a source file path or a test-case id.
    pub struct EntityId;
}

define_id! {
    /// Identifier of one client session, used to correlate log lines.
    pub struct SessionId;
}

impl SessionId {
    /// Generate a random session id (`ses-` followed by 12 random characters).
    pub fn generate() -> Self {
        Self::new(format!("ses-{}", nanoid::nanoid!(12)))
    }
}

/// Source of fresh string ids
pub trait IdGen: Clone + Send + Sync {
    fn next(&self) -> String;
}

/// Random ids from nanoid
#[derive(Clone, Default)]
pub struct NanoIdGen;

impl IdGen for NanoIdGen {
    fn next(&self) -> String {
        nanoid::nanoid!()
    }
}

/// Predictable `{prefix}-{n}` ids, shared between clones
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<Mutex<u64>>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), counter: Arc::new(Mutex::new(0)) }
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let mut counter = self.counter.lock();
        *counter += 1;
        format!("{}-{}", self.prefix, *counter)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
