//! Artifact handler registry
//!
//! Handlers are heterogeneous: each one parses its own requirement and claim
//! shapes. The registry erases the concrete types at its boundary; values
//! travel as `Box<dyn Any>` and are downcast back only inside the owning
//! handler's `check`.

use crate::error::{Error, Result};
use crate::{
    dtb::Dtb, initrd::Initrd, linux_kernel::LinuxKernel, uefi_binary::UefiBinary,
    uefi_bios::UefiBios, windows_bootmgr::WindowsBootMgr, CategoryId, DTB, INITRD, LINUX_KERNEL,
    UEFI_BINARY, UEFI_BIOS, WINDOWS_BOOT_MGR,
};
use std::any::Any;
use std::collections::HashMap;

/// Type-erased requirement or claim value owned by a handler
pub type Opaque = Box<dyn Any + Send + Sync>;

/// An artifact category handler
///
/// Abstracts the functionality implemented by each artifact category module:
/// parsing of serialized requirements and claims, and the matching predicate
/// between them.
pub trait Handler: Send + Sync {
    /// Parse serialized JSON containing requirements for this category
    fn parse_requirements(&self, json: &[u8]) -> Result<Opaque>;

    /// Parse serialized JSON containing claims for this category
    fn parse_claims(&self, json: &[u8]) -> Result<Opaque>;

    /// Check matching between requirements and claims for this category
    fn check(&self, requirements: &(dyn Any + Send + Sync), claims: &(dyn Any + Send + Sync))
        -> Result<()>;
}

/// Registry of artifact handlers keyed by category identifier
///
/// Populated before the first verification and read-only afterwards.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<CategoryId, Box<dyn Handler>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a registry holding all built-in category handlers
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();

        let builtin: [(CategoryId, Box<dyn Handler>); 6] = [
            (LINUX_KERNEL, Box::new(LinuxKernel)),
            (INITRD, Box::new(Initrd)),
            (DTB, Box::new(Dtb)),
            (UEFI_BINARY, Box::new(UefiBinary)),
            (WINDOWS_BOOT_MGR, Box::new(WindowsBootMgr)),
            (UEFI_BIOS, Box::new(UefiBios)),
        ];
        for (category, handler) in builtin {
            registry
                .register(category, handler)
                .expect("built-in artifact categories are distinct");
        }

        registry
    }

    /// Register a handler for a category
    ///
    /// Registration is fail-closed: a second registration for the same
    /// identifier is rejected.
    pub fn register(&mut self, category: CategoryId, handler: Box<dyn Handler>) -> Result<()> {
        if self.handlers.contains_key(&category) {
            return Err(Error::InvalidInput(format!(
                "handler already registered for artifact category {:#06x}",
                category
            )));
        }

        tracing::debug!(category, "registering artifact handler");
        self.handlers.insert(category, handler);
        Ok(())
    }

    /// Return the registered handler, if any, for a category
    pub fn handler(&self, category: CategoryId) -> Result<&dyn Handler> {
        self.handlers
            .get(&category)
            .map(|h| h.as_ref())
            .ok_or(Error::UnknownCategory(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CVE;

    #[test]
    fn test_builtin_categories_registered() {
        let registry = Registry::with_builtin();

        for category in [LINUX_KERNEL, INITRD, DTB, UEFI_BINARY, WINDOWS_BOOT_MGR, UEFI_BIOS] {
            assert!(registry.handler(category).is_ok());
        }
    }

    #[test]
    fn test_unknown_category() {
        let registry = Registry::with_builtin();
        assert!(matches!(
            registry.handler(CVE),
            Err(Error::UnknownCategory(CVE))
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::with_builtin();
        assert!(registry
            .register(LINUX_KERNEL, Box::new(LinuxKernel))
            .is_err());
    }
}
