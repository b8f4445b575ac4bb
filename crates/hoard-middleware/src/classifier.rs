//! Decides whether a dispatched action may trigger a save.
//!
//! An action qualifies when it is a record with a `type` field, its type is
//! not blacklisted, and the whitelist accepts it. LOAD and SAVE are always
//! blacklisted so the middleware never reacts to its own traffic or to
//! hydration.
//!
//! Debug builds emit diagnostics for malformed actions and for types listed
//! on both lists. Release builds stay silent. Diagnostics never change the
//! outcome.

use std::fmt;
use std::sync::Arc;

use hoard_core::config::MiddlewareConfig;
use hoard_core::{Action, LOAD, SAVE};
use serde_json::{Map, Value};
use tracing::warn;

const DIAGNOSTICS: bool = cfg!(debug_assertions);

/// Custom whitelist test over a well-formed action record.
pub type Predicate = Arc<dyn Fn(&Map<String, Value>) -> bool + Send + Sync>;

/// Which actions may trigger a save once past the blacklist.
#[derive(Clone)]
pub enum Whitelist {
    /// Exact type match. An empty list accepts every type.
    Types(Vec<String>),
    /// Caller-supplied decision.
    Predicate(Predicate),
}

impl Whitelist {
    pub fn types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Whitelist::Types(types.into_iter().map(Into::into).collect())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> bool + Send + Sync + 'static,
    {
        Whitelist::Predicate(Arc::new(f))
    }

    fn accepts(&self, action: &Map<String, Value>) -> bool {
        match self {
            Whitelist::Types(types) if types.is_empty() => true,
            Whitelist::Types(types) => type_in(action.get("type"), types),
            Whitelist::Predicate(f) => f(action),
        }
    }
}

impl Default for Whitelist {
    fn default() -> Self {
        Whitelist::Types(Vec::new())
    }
}

impl fmt::Debug for Whitelist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Whitelist::Types(types) => f.debug_tuple("Types").field(types).finish(),
            Whitelist::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Why an action is not eligible to trigger a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// An unresolved deferred action reached the storage layer.
    Function,
    /// The action is not a record.
    NotObject,
    /// The record has no `type` field.
    MissingType,
}

/// Sort `action` into well-formed record or [`Rejection`].
///
/// Arrays count as records without a `type` field rather than as
/// non-records, so they are reported as [`Rejection::MissingType`].
pub fn classify(action: &Action) -> Result<&Map<String, Value>, Rejection> {
    match action {
        Action::Thunk(_) => Err(Rejection::Function),
        Action::Scalar(Value::Array(_)) => Err(Rejection::MissingType),
        Action::Scalar(_) => Err(Rejection::NotObject),
        Action::Object(map) if !map.contains_key("type") => Err(Rejection::MissingType),
        Action::Object(map) => Ok(map),
    }
}

/// Whether `action` is a well-formed action. Warns about malformed ones in
/// debug builds.
pub fn is_valid_action(action: &Action) -> bool {
    match classify(action) {
        Ok(_) => true,
        Err(rejection) => {
            if DIAGNOSTICS {
                warn_rejected(action, rejection);
            }
            false
        }
    }
}

fn warn_rejected(action: &Action, rejection: Rejection) {
    match rejection {
        Rejection::Function => warn!(
            "[hoard] ACTION IGNORED! Actions should be objects with a type property \
             but received a function! Your function resolving middleware must be \
             placed BEFORE hoard!"
        ),
        Rejection::NotObject => warn!(
            "[hoard] ACTION IGNORED! Actions should be objects with a type property \
             but received: {}",
            action
        ),
        Rejection::MissingType => {
            warn!("[hoard] ACTION IGNORED! Action objects should have a type property.")
        }
    }
}

fn type_in(action_type: Option<&Value>, list: &[String]) -> bool {
    match action_type.and_then(Value::as_str) {
        Some(t) => list.iter().any(|item| item == t),
        None => false,
    }
}

/// Combined decision over an already-built blacklist and whitelist.
///
/// `blacklist` is used as given; [`ActionFilter`] is what adds the sentinel
/// types.
pub fn passes_filter(action: &Action, blacklist: &[String], whitelist: &Whitelist) -> bool {
    if !is_valid_action(action) {
        return false;
    }
    let Some(record) = action.as_object() else {
        return false;
    };
    !type_in(record.get("type"), blacklist) && whitelist.accepts(record)
}

/// Blacklist entries that also appear on a list whitelist, in blacklist
/// order.
pub fn overlapping_entries(blacklist: &[String], whitelist: &Whitelist) -> Vec<String> {
    match whitelist {
        Whitelist::Types(types) => blacklist
            .iter()
            .filter(|item| types.contains(item))
            .cloned()
            .collect(),
        Whitelist::Predicate(_) => Vec::new(),
    }
}

/// Blacklist plus whitelist, with LOAD and SAVE always excluded.
#[derive(Debug, Clone)]
pub struct ActionFilter {
    blacklist: Vec<String>,
    whitelist: Whitelist,
}

impl ActionFilter {
    pub fn new(blacklist: Vec<String>, whitelist: Whitelist) -> Self {
        if DIAGNOSTICS {
            for item in overlapping_entries(&blacklist, &whitelist) {
                warn!(
                    "[hoard] Action {} is on BOTH black- and whitelist. \
                     This is most likely a mistake!",
                    item
                );
            }
        }

        let mut effective = blacklist;
        effective.push(LOAD.to_string());
        effective.push(SAVE.to_string());
        Self {
            blacklist: effective,
            whitelist,
        }
    }

    pub fn from_config(config: &MiddlewareConfig) -> Self {
        Self::new(
            config.blacklist.clone(),
            Whitelist::Types(config.whitelist.clone()),
        )
    }

    /// The blacklist as applied, sentinel types included.
    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Whether `action` should trigger a save.
    pub fn accepts(&self, action: &Action) -> bool {
        passes_filter(action, &self.blacklist, &self.whitelist)
    }
}

impl Default for ActionFilter {
    fn default() -> Self {
        Self::new(Vec::new(), Whitelist::default())
    }
}
