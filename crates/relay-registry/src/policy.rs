//! Caller authorization policies.
//!
//! A tool's capability list decides which other tools may invoke it.
//! A call without a caller (the root of a chain) is always permitted.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use relay_types::ToolName;

/// Wildcard entry meaning "any caller".
pub const WILDCARD: &str = "*";

/// Predicate over caller identity.
pub trait CallerPolicy: Send + Sync + fmt::Debug {
    /// Returns `true` if `caller` may invoke the tool guarded by this policy.
    fn permits(&self, caller: &ToolName) -> bool;

    /// Short description used in tool listings and error hints.
    fn describe(&self) -> String;
}

/// Permits every caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyCaller;

impl CallerPolicy for AnyCaller {
    fn permits(&self, _caller: &ToolName) -> bool {
        true
    }

    fn describe(&self) -> String {
        WILDCARD.to_string()
    }
}

/// Permits callers whose name is listed, or everyone if the list holds `"*"`.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    callers: BTreeSet<String>,
}

impl AllowList {
    /// Creates an allow-list from caller names.
    pub fn new<I, S>(callers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            callers: callers.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if no caller (other than the chain root) is permitted.
    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }
}

impl CallerPolicy for AllowList {
    fn permits(&self, caller: &ToolName) -> bool {
        self.callers.contains(WILDCARD) || self.callers.contains(caller.as_str())
    }

    fn describe(&self) -> String {
        if self.callers.is_empty() {
            return "root only".to_string();
        }
        self.callers.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Builds a policy from a raw capability list (`["*"]` or caller names).
pub fn policy_from_list<I, S>(entries: I) -> Arc<dyn CallerPolicy>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let list = AllowList::new(entries);
    if list.callers.len() == 1 && list.callers.contains(WILDCARD) {
        Arc::new(AnyCaller)
    } else {
        Arc::new(list)
    }
}

/// Checks a call from `caller` against `policy`.
///
/// `None` means the call has no calling tool and is always permitted.
pub fn authorize(policy: &dyn CallerPolicy, caller: Option<&ToolName>) -> bool {
    caller.map_or(true, |c| policy.permits(c))
}
