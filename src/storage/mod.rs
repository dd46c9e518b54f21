//! Context propagation through channel publishes.
//!
//! A storage binding lets a consumer piggyback on a producer's scoped
//! operation: whenever the producer calls
//! [`StorageChannel::run`], every bound [`ContextStore`] is entered with a
//! value derived from the published data, and restored afterwards.
//!
//! ## Contents
//! - [`ContextStore`], [`AmbientStore`] the store collaborator and a ready-made cell
//! - [`StorageChannel`] enter/exit channel pair with bound stores
//! - [`StoreFrame`], [`RunToken`] the per-run payload and its correlation token
//! - [`StoreDisposer`] removes a binding made with [`bind_store`]
//!
//! ## Quick wiring
//! ```text
//! consumer:  bind_store("db", store)  ──► subscribes "db.enter-store" / "db.exit-store"
//! producer:  storage_channel("db")?.run(query, || execute(query))
//!                 └─► store.get_current() inside execute() == query
//! ```

mod binding;
mod channel;
mod store;

pub use binding::{RunToken, StoreFrame};
pub use channel::{ENTER_SUFFIX, EXIT_SUFFIX, StorageChannel, StoreDisposer};
pub use store::{AmbientStore, ContextStore};

use std::any::Any;
use std::sync::Arc;

use crate::error::ChannelError;
use crate::name::IntoChannelName;

use binding::StoreId;

/// Returns the storage channel named `name`, creating it if needed.
///
/// # Errors
/// [`ChannelError::InvalidName`] when `name` is not a valid channel name.
pub fn storage_channel(name: impl IntoChannelName) -> Result<StorageChannel, ChannelError> {
    Ok(channel::lookup(name.into_channel_name()?))
}

/// Binds `store` to the storage channel `name`, entering the published data itself.
///
/// # Errors
/// - [`ChannelError::InvalidName`] when `name` is not a valid channel name.
/// - [`ChannelError::StoreAlreadyBound`] when `store` is already bound there.
pub fn bind_store<S>(name: impl IntoChannelName, store: Arc<S>) -> Result<StoreDisposer, ChannelError>
where
    S: ContextStore,
    S::Value: Clone,
{
    bind_store_with(name, store, |data: &dyn Any| {
        data.downcast_ref::<S::Value>().cloned()
    })
}

/// Binds `store` to the storage channel `name`, entering `build(data)` per run.
///
/// # Errors
/// - [`ChannelError::InvalidName`] when `name` is not a valid channel name.
/// - [`ChannelError::StoreAlreadyBound`] when `store` is already bound there.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use diagnostics_channel::{AmbientStore, ContextStore, bind_store_with, storage_channel};
///
/// struct Query { sql: &'static str }
///
/// let store = Arc::new(AmbientStore::<String>::new());
/// let _binding = bind_store_with("doc.storage.build", store.clone(), |data| {
///     data.downcast_ref::<Query>().map(|q| format!("span:{}", q.sql))
/// })?;
///
/// let ch = storage_channel("doc.storage.build")?;
/// ch.run(Query { sql: "select 1" }, || {
///     assert_eq!(store.get_current().as_deref(), Some("span:select 1"));
/// });
/// # Ok::<(), diagnostics_channel::ChannelError>(())
/// ```
pub fn bind_store_with<S, B>(
    name: impl IntoChannelName,
    store: Arc<S>,
    build: B,
) -> Result<StoreDisposer, ChannelError>
where
    S: ContextStore,
    B: Fn(&dyn Any) -> Option<S::Value> + Send + Sync + 'static,
{
    let channel = storage_channel(name)?;
    let id = StoreId::of(&store);
    if !channel.bind_store_with(store, build) {
        return Err(ChannelError::StoreAlreadyBound {
            name: channel.name().clone(),
        });
    }
    Ok(StoreDisposer::new(channel, id))
}
