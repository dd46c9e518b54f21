//! Storage binding seen from a producer and a consumer crate.

use std::any::Any;
use std::sync::{Arc, Mutex};

use diagnostics_channel::{
    AmbientStore, ChannelError, ContextStore, Symbol, bind_store, bind_store_with, has_subscribers,
    storage_channel,
};

#[derive(Debug, Clone, PartialEq)]
struct Input {
    foo: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
struct Output {
    baz: &'static str,
}

#[test]
fn run_enters_transformed_value_for_its_duration() -> Result<(), ChannelError> {
    let store = Arc::new(AmbientStore::<Output>::new());
    // the build closure runs inside a subscriber; record what it saw, check later
    let found = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&found);

    let _binding = bind_store_with("it.storage.transform", store.clone(), move |data: &dyn Any| {
        seen.lock().unwrap().push(data.downcast_ref::<Input>().cloned());
        Some(Output { baz: "buz" })
    })?;

    let channel = storage_channel("it.storage.transform")?;
    assert_eq!(store.get_current(), None);

    let ran = channel.run(Input { foo: "bar" }, || {
        assert_eq!(store.get_current(), Some(Output { baz: "buz" }));
        true
    });

    assert!(ran);
    assert_eq!(store.get_current(), None);
    assert_eq!(found.lock().unwrap().as_slice(), [Some(Input { foo: "bar" })]);
    Ok(())
}

#[test]
fn two_stores_on_one_channel_are_entered_independently() -> Result<(), ChannelError> {
    let ids = Arc::new(AmbientStore::<u64>::new());
    let labels = Arc::new(AmbientStore::<String>::new());
    let a = bind_store("it.storage.two", ids.clone())?;
    let b = bind_store_with("it.storage.two", labels.clone(), |data| {
        data.downcast_ref::<u64>().map(|id| format!("req-{id}"))
    })?;

    storage_channel("it.storage.two")?.run(11u64, || {
        assert_eq!(ids.get_current(), Some(11));
        assert_eq!(labels.get_current().as_deref(), Some("req-11"));
    });

    assert!(a.dispose());
    assert!(b.dispose());
    assert!(!has_subscribers("it.storage.two.enter-store"));
    Ok(())
}

#[test]
fn symbol_storage_channels_do_not_collide_with_strings() -> Result<(), ChannelError> {
    let sym = Symbol::new("it.storage.symbol");
    let store = Arc::new(AmbientStore::<u8>::new());
    let binding = bind_store(&sym, store.clone())?;

    storage_channel("it.storage.symbol")?.run(1u8, || assert_eq!(store.get_current(), None));
    storage_channel(&sym)?.run(2u8, || assert_eq!(store.get_current(), Some(2)));

    assert!(binding.dispose());
    Ok(())
}

#[test]
fn invalid_name_is_rejected() {
    let store = Arc::new(AmbientStore::<u8>::new());
    let err = bind_store("", store).unwrap_err();
    assert_eq!(err.as_label(), "channel_invalid_name");
    assert!(storage_channel("").is_err());
}
