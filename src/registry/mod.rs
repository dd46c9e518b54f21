//! Process-wide channel registry.
//!
//! Resolves names to [`Channel`]s. Channels are created lazily, held weakly,
//! and pinned while they have subscribers:
//!
//! ```text
//! channel("db") ──► CHANNELS ──► live? ── yes ──► same Channel
//!                                  └──── no ──► new Channel (Inactive), weak slot
//!
//! subscribe   ──► refs += 1 ──► slot pins the channel
//! unsubscribe ──► refs -= 1 ──► refs == 0 ──► collectable once handles are gone
//! ```
//!
//! ## Rules
//! - Repeated lookups of a live name return the same channel.
//! - A name whose channel was collected resolves to a fresh, empty channel.
//! - [`has_subscribers`] and [`unsubscribe`] never create a channel.

mod weak;

pub(crate) use weak::Registry;

use std::sync::LazyLock;

use crate::channel::{Channel, ChannelInner, Subscriber};
use crate::error::ChannelError;
use crate::name::{ChannelName, IntoChannelName};

pub(crate) static CHANNELS: LazyLock<Registry<ChannelInner>> =
    LazyLock::new(|| Registry::new("channel"));

/// Returns the channel for an already validated name.
pub(crate) fn lookup(name: ChannelName) -> Channel {
    Channel::from_inner(CHANNELS.get_or_insert_with(name, ChannelInner::new))
}

/// Returns the channel registered under `name`, creating it if needed.
///
/// # Errors
/// [`ChannelError::InvalidName`] when `name` is not a valid channel name.
///
/// # Example
/// ```rust
/// use diagnostics_channel::{Symbol, channel};
///
/// let a = channel("doc.registry.channel")?;
/// let b = channel(String::from("doc.registry.channel"))?;
/// assert_eq!(a, b);
///
/// let private = channel(Symbol::new("doc.registry.channel"))?;
/// assert_ne!(a, private);
///
/// assert!(channel("").is_err());
/// # Ok::<(), diagnostics_channel::ChannelError>(())
/// ```
pub fn channel(name: impl IntoChannelName) -> Result<Channel, ChannelError> {
    Ok(lookup(name.into_channel_name()?))
}

/// Subscribes `subscriber` to the channel named `name`.
///
/// The channel stays registered for as long as the subscription exists, even
/// when no handle to it is kept.
///
/// # Errors
/// [`ChannelError::InvalidName`] when `name` is not a valid channel name.
pub fn subscribe(name: impl IntoChannelName, subscriber: Subscriber) -> Result<(), ChannelError> {
    channel(name)?.subscribe(subscriber);
    Ok(())
}

/// Unsubscribes `subscriber` from the channel named `name`.
///
/// Returns `Ok(false)` without side effects when the channel does not exist or
/// `subscriber` is not registered on it.
///
/// # Errors
/// [`ChannelError::InvalidName`] when `name` is not a valid channel name.
pub fn unsubscribe(name: impl IntoChannelName, subscriber: &Subscriber) -> Result<bool, ChannelError> {
    let live = name.with_name_ref(|key| CHANNELS.get_by(key))?;
    Ok(live.is_some_and(|inner| Channel::from_inner(inner).unsubscribe(subscriber)))
}

/// Returns true iff a live channel named `name` has subscribers.
///
/// Never creates or registers a channel; invalid names report `false`.
/// Borrowed names (`&str`, `&Symbol`, ...) are looked up without allocating;
/// the registry lock is held only for the map probe.
pub fn has_subscribers(name: impl IntoChannelName) -> bool {
    name.with_name_ref(|key| CHANNELS.get_by(key).is_some_and(|inner| inner.has_subscribers()))
        .unwrap_or(false)
}
