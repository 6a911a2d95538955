// crates/thread-guard-core/src/core/group.rs
// ============================================================================
// Module: Thread Groups
// Description: Hierarchical thread groups and per-thread group membership.
// Purpose: Model the resource the guard protects against uncontrolled creation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Thread groups form a tree of [`Arc`]-linked nodes. Every thread has a
//! current group: threads that never entered one belong to the process
//! `main` group, whose parent is the `system` root. Child groups are created
//! through the checked path in [`crate::runtime::spawn`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the process root group.
pub const SYSTEM_GROUP_NAME: &str = "system";
/// Name of the default group for threads that never entered one.
pub const MAIN_GROUP_NAME: &str = "main";

/// Source of group identifiers; zero is never issued.
static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);
/// Process root group.
static SYSTEM_GROUP: OnceLock<Arc<ThreadGroup>> = OnceLock::new();
/// Process default group.
static MAIN_GROUP: OnceLock<Arc<ThreadGroup>> = OnceLock::new();

thread_local! {
    /// Group entered by the current thread, if any.
    static CURRENT_GROUP: RefCell<Option<Arc<ThreadGroup>>> = const { RefCell::new(None) };
}

// ============================================================================
// SECTION: Thread Groups
// ============================================================================

/// Process-unique thread group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GroupId(u64);

impl GroupId {
    /// Allocates the next group identifier.
    fn next() -> Self {
        Self(NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Node in a thread group hierarchy.
///
/// # Invariants
/// - Parent links are immutable; a hierarchy never contains cycles.
#[derive(Debug)]
pub struct ThreadGroup {
    /// Group identifier.
    id: GroupId,
    /// Human-readable group name.
    name: String,
    /// Parent group; `None` for a root.
    parent: Option<Arc<ThreadGroup>>,
}

impl ThreadGroup {
    /// Creates a new root group detached from the process hierarchy.
    #[must_use]
    pub fn detached_root(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: GroupId::next(),
            name: name.into(),
            parent: None,
        })
    }

    /// Creates a child of `parent` without a permission check.
    pub(crate) fn child_of(parent: &Arc<Self>, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: GroupId::next(),
            name: name.into(),
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Returns the group identifier.
    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent group.
    #[must_use]
    pub const fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    /// Walks parent links until a group without a parent is reached.
    #[must_use]
    pub fn root(self: &Arc<Self>) -> Arc<Self> {
        let mut root = self;
        while let Some(parent) = &root.parent {
            root = parent;
        }
        Arc::clone(root)
    }

    /// Returns true when `self` is `other` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        let mut cursor = Some(other);
        while let Some(group) = cursor {
            if group.id == self.id {
                return true;
            }
            cursor = group.parent.as_deref();
        }
        false
    }
}

// ============================================================================
// SECTION: Membership
// ============================================================================

/// Returns the process root group.
#[must_use]
pub fn system_group() -> &'static Arc<ThreadGroup> {
    SYSTEM_GROUP.get_or_init(|| ThreadGroup::detached_root(SYSTEM_GROUP_NAME))
}

/// Returns the process default group.
#[must_use]
pub fn main_group() -> &'static Arc<ThreadGroup> {
    MAIN_GROUP.get_or_init(|| ThreadGroup::child_of(system_group(), MAIN_GROUP_NAME))
}

/// Returns the calling thread's current group.
#[must_use]
pub fn current_group() -> Arc<ThreadGroup> {
    CURRENT_GROUP
        .with(|current| current.borrow().clone())
        .unwrap_or_else(|| Arc::clone(main_group()))
}

/// Makes `group` the calling thread's current group until the scope drops.
#[must_use = "the previous group is restored when the scope is dropped"]
pub fn enter_group(group: Arc<ThreadGroup>) -> GroupScope {
    let previous = CURRENT_GROUP.with(|current| current.replace(Some(group)));
    GroupScope {
        previous,
    }
}

/// Restores the previously entered group on drop.
pub struct GroupScope {
    /// Group that was current before the scope was entered.
    previous: Option<Arc<ThreadGroup>>,
}

impl Drop for GroupScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_GROUP.with(|current| {
            *current.borrow_mut() = previous;
        });
    }
}
