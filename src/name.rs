//! # Channel names.
//!
//! A channel is keyed by a [`ChannelName`], which is either a string or a
//! [`Symbol`]. Strings are shared by value: two calls with `"db.query"`
//! resolve to the same channel. Symbols are shared by identity: every
//! [`Symbol::new`] creates a token no other symbol (or string) can collide with.
//!
//! ## Derived names
//! Storage and tracing channels are built from sub-channels whose names are
//! derived from the user-facing one:
//! ```text
//! "db"            ──► "db.enter-store" / "db.exit-store"
//!                 ──► "tracing:db:start" / ... / "tracing:db:error"
//! Symbol(db)#7    ──► Symbol(db)#7 with role ("", ".enter-store"), ...
//! ```
//! String-derived names are plain strings, so a consumer can subscribe to
//! `"tracing:db:start"` directly.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::error::ChannelError;

/// Global counter for symbol identities.
static SYMBOL_SEQ: AtomicU64 = AtomicU64::new(1);

/// Unique, non-forgeable channel key.
///
/// Equality and hashing use the identity assigned at creation, never the
/// description.
///
/// ```
/// use diagnostics_channel::Symbol;
///
/// let a = Symbol::new("http");
/// let b = Symbol::new("http");
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// assert_eq!(a.description(), "http");
/// ```
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Arc<str>,
    role: Option<(&'static str, &'static str)>,
}

impl Symbol {
    /// Creates a fresh symbol.
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: SYMBOL_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            description: description.into(),
            role: None,
        }
    }

    /// Human-readable description given at creation.
    pub fn description(&self) -> &str {
        &self.description
    }

    fn with_role(&self, prefix: &'static str, suffix: &'static str) -> Self {
        Self {
            id: self.id,
            description: Arc::clone(&self.description),
            role: Some((prefix, suffix)),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.role == other.role
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.role.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Some((prefix, suffix)) => {
                write!(f, "{prefix}Symbol({})#{}{suffix}", self.description, self.id)
            }
            None => write!(f, "Symbol({})#{}", self.description, self.id),
        }
    }
}

/// Registry key of a channel.
#[derive(Clone, PartialEq, Eq)]
pub enum ChannelName {
    /// Plain string name, shared by value.
    Str(Arc<str>),
    /// Symbol name, shared by identity.
    Symbol(Symbol),
}

impl ChannelName {
    /// Builds the name of a sub-channel: `{prefix}{self}{suffix}`.
    pub(crate) fn derive(&self, prefix: &'static str, suffix: &'static str) -> Self {
        match self {
            ChannelName::Str(s) => ChannelName::Str(format!("{prefix}{s}{suffix}").into()),
            ChannelName::Symbol(sym) => ChannelName::Symbol(sym.with_role(prefix, suffix)),
        }
    }

    /// Returns the string form if this is a string name.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ChannelName::Str(s) => Some(s),
            ChannelName::Symbol(_) => None,
        }
    }

    /// Returns the borrowed form of this name.
    pub fn as_name_ref(&self) -> NameRef<'_> {
        match self {
            ChannelName::Str(s) => NameRef::Str(s),
            ChannelName::Symbol(sym) => NameRef::Symbol(sym),
        }
    }
}

// Hashes through `NameRef` so owned and borrowed keys hash alike.
impl Hash for ChannelName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_name_ref().hash(state);
    }
}

/// Borrowed [`ChannelName`], used to look channels up without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameRef<'a> {
    /// Borrowed string name.
    Str(&'a str),
    /// Borrowed symbol name.
    Symbol(&'a Symbol),
}

/// Map key that can be compared in its borrowed form.
///
/// `HashMap<ChannelName, _>` is queried with `&dyn NameKey`, so a `&str`
/// lookup needs no owned `ChannelName`.
pub trait NameKey {
    /// Returns the borrowed key.
    fn key(&self) -> NameRef<'_>;
}

impl NameKey for ChannelName {
    fn key(&self) -> NameRef<'_> {
        self.as_name_ref()
    }
}

impl NameKey for NameRef<'_> {
    fn key(&self) -> NameRef<'_> {
        *self
    }
}

impl<'a> Borrow<dyn NameKey + 'a> for ChannelName {
    fn borrow(&self) -> &(dyn NameKey + 'a) {
        self
    }
}

impl PartialEq for dyn NameKey + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for dyn NameKey + '_ {}

impl Hash for dyn NameKey + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelName::Str(s) => write!(f, "{s:?}"),
            ChannelName::Symbol(sym) => write!(f, "{sym}"),
        }
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelName::Str(s) => f.write_str(s),
            ChannelName::Symbol(sym) => write!(f, "{sym}"),
        }
    }
}

impl From<Symbol> for ChannelName {
    fn from(sym: Symbol) -> Self {
        ChannelName::Symbol(sym)
    }
}

impl PartialEq<str> for ChannelName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for ChannelName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// Conversion into a validated [`ChannelName`].
///
/// Implemented for the accepted name shapes only: strings and symbols.
pub trait IntoChannelName {
    /// Validates and converts.
    ///
    /// # Errors
    /// [`ChannelError::InvalidName`] for an empty string.
    fn into_channel_name(self) -> Result<ChannelName, ChannelError>;

    /// Validates and hands the borrowed name to `f`.
    ///
    /// Borrowed inputs (`&str`, `&String`, `&Symbol`, `&ChannelName`) do not
    /// allocate; owned inputs are converted first.
    ///
    /// # Errors
    /// [`ChannelError::InvalidName`] for an empty string.
    fn with_name_ref<R>(self, f: impl FnOnce(NameRef<'_>) -> R) -> Result<R, ChannelError>
    where
        Self: Sized,
    {
        let name = self.into_channel_name()?;
        Ok(f(name.as_name_ref()))
    }
}

const EMPTY_NAME: ChannelError = ChannelError::InvalidName {
    reason: "name must not be empty",
};

fn validate_str(s: Arc<str>) -> Result<ChannelName, ChannelError> {
    if s.is_empty() {
        return Err(EMPTY_NAME);
    }
    Ok(ChannelName::Str(s))
}

fn validate_ref(s: &str) -> Result<NameRef<'_>, ChannelError> {
    if s.is_empty() {
        return Err(EMPTY_NAME);
    }
    Ok(NameRef::Str(s))
}

impl IntoChannelName for &str {
    fn into_channel_name(self) -> Result<ChannelName, ChannelError> {
        validate_str(self.into())
    }

    fn with_name_ref<R>(self, f: impl FnOnce(NameRef<'_>) -> R) -> Result<R, ChannelError> {
        validate_ref(self).map(f)
    }
}

impl IntoChannelName for String {
    fn into_channel_name(self) -> Result<ChannelName, ChannelError> {
        validate_str(self.into())
    }
}

impl IntoChannelName for &String {
    fn into_channel_name(self) -> Result<ChannelName, ChannelError> {
        validate_str(self.as_str().into())
    }

    fn with_name_ref<R>(self, f: impl FnOnce(NameRef<'_>) -> R) -> Result<R, ChannelError> {
        validate_ref(self).map(f)
    }
}

impl IntoChannelName for Arc<str> {
    fn into_channel_name(self) -> Result<ChannelName, ChannelError> {
        validate_str(self)
    }
}

impl IntoChannelName for Symbol {
    fn into_channel_name(self) -> Result<ChannelName, ChannelError> {
        Ok(ChannelName::Symbol(self))
    }
}

impl IntoChannelName for &Symbol {
    fn into_channel_name(self) -> Result<ChannelName, ChannelError> {
        Ok(ChannelName::Symbol(self.clone()))
    }

    fn with_name_ref<R>(self, f: impl FnOnce(NameRef<'_>) -> R) -> Result<R, ChannelError> {
        Ok(f(NameRef::Symbol(self)))
    }
}

impl IntoChannelName for ChannelName {
    fn into_channel_name(self) -> Result<ChannelName, ChannelError> {
        match self {
            ChannelName::Str(s) => validate_str(s),
            sym @ ChannelName::Symbol(_) => Ok(sym),
        }
    }
}

impl IntoChannelName for &ChannelName {
    fn into_channel_name(self) -> Result<ChannelName, ChannelError> {
        self.clone().into_channel_name()
    }

    fn with_name_ref<R>(self, f: impl FnOnce(NameRef<'_>) -> R) -> Result<R, ChannelError> {
        match self {
            ChannelName::Str(s) => validate_ref(s).map(f),
            ChannelName::Symbol(sym) => Ok(f(NameRef::Symbol(sym))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_rejected() {
        let err = "".into_channel_name().unwrap_err();
        assert_eq!(err.as_label(), "channel_invalid_name");
    }

    #[test]
    fn strings_compare_by_value() {
        let a = "db".into_channel_name().unwrap();
        let b = String::from("db").into_channel_name().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "db");
    }

    #[test]
    fn derived_string_names_are_plain_strings() {
        let base = "db".into_channel_name().unwrap();
        assert_eq!(base.derive("", ".enter-store"), "db.enter-store");
        assert_eq!(base.derive("tracing:", ":start"), "tracing:db:start");
    }

    #[test]
    fn derived_symbol_names_keep_identity() {
        let sym = Symbol::new("db");
        let other = Symbol::new("db");
        let base = ChannelName::Symbol(sym.clone());

        let enter = base.derive("", ".enter-store");
        assert_eq!(enter, ChannelName::Symbol(sym.clone()).derive("", ".enter-store"));
        assert_ne!(enter, base);
        assert_ne!(enter, ChannelName::Symbol(other).derive("", ".enter-store"));
        assert!(enter.as_str().is_none());
    }

    fn hash_of<K: Hash + ?Sized>(key: &K) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut h = DefaultHasher::new();
        key.hash(&mut h);
        h.finish()
    }

    #[test]
    fn borrowed_keys_hash_and_compare_like_owned_names() {
        let sym = Symbol::new("db");
        for owned in [ChannelName::Str("db".into()), ChannelName::Symbol(sym.clone())] {
            let borrowed: &dyn NameKey = &owned.as_name_ref();
            assert_eq!(hash_of(&owned), hash_of(borrowed));
            assert!(<ChannelName as Borrow<dyn NameKey>>::borrow(&owned) == borrowed);
        }
        let string: &dyn NameKey = &NameRef::Str("db");
        let symbol: &dyn NameKey = &NameRef::Symbol(&sym);
        assert!(string != symbol);
    }

    #[test]
    fn borrowed_lookup_finds_owned_key() {
        let mut map = std::collections::HashMap::new();
        map.insert("db".into_channel_name().unwrap(), 1);
        let key: &dyn NameKey = &NameRef::Str("db");
        assert_eq!(map.get(key), Some(&1));
        let miss: &dyn NameKey = &NameRef::Str("dc");
        assert_eq!(map.get(miss), None);
    }

    #[test]
    fn borrowed_validation_rejects_empty_names() {
        assert!("".with_name_ref(|_| ()).is_err());
        assert!(ChannelName::Str("".into()).with_name_ref(|_| ()).is_err());
        assert_eq!("db".with_name_ref(|k| k == NameRef::Str("db")), Ok(true));
    }

    #[test]
    fn symbol_display_never_matches_its_description() {
        let sym = Symbol::new("db");
        let as_name = ChannelName::Symbol(sym);
        assert_ne!(as_name, "db");
        assert!(as_name.to_string().starts_with("Symbol(db)#"));
    }
}
