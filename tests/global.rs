//! Process-wide acquisition.
//!
//! Runs as its own test binary, so the static slot starts empty. Everything
//! lives in one test because the slot cannot be reset.

mod common;

use std::sync::Arc;

use tokio_test::assert_err;

use websock::{Error, ReadyState};

use common::{init_tracing, next_event, spawn_echo_server};

#[tokio::test]
async fn test_global_acquire_lifecycle() -> anyhow::Result<()> {
    init_tracing();
    assert!(websock::current().is_none());

    // Rejected addresses do not bind the slot
    let err = assert_err!(websock::acquire("not a url"));
    assert!(matches!(err, Error::InvalidAddress { .. }));
    assert!(websock::current().is_none());
    assert!(websock::global::address().is_none());

    let url = spawn_echo_server().await;
    let other = spawn_echo_server().await;

    let first = websock::acquire(&url)?;
    let second = websock::acquire(&url)?;
    let third = websock::acquire(&other)?;

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
    assert_eq!(third.url(), url);
    assert_eq!(websock::global::address().as_deref(), Some(url.as_str()));

    let current = websock::current().expect("bound");
    assert_eq!(current.id(), first.id());

    let mut events = first.subscribe();
    first.wait_open().await?;
    third.send_text("shared")?;
    assert_eq!(next_event(&mut events).await.as_text(), Some("shared"));

    first.close();
    assert_eq!(first.closed().await, ReadyState::Closed);

    // Closing does not empty the slot
    let after = websock::acquire(&other)?;
    assert!(Arc::ptr_eq(&first, &after));
    Ok(())
}
