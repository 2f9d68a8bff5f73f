//! Connection lifecycle against a local echo endpoint.

mod common;

use std::error::Error as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use titanium_link::{
    ConnectOptions, ConnectionEvent, ConnectionHandle, Disconnected, Error, Listener, Port,
    connect,
};

use common::{CLOSE_REQUEST, EchoServer, WAIT, unused_port};

fn counter() -> (Arc<AtomicUsize>, Listener) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = Arc::clone(&count);
    let listener = Listener::new(move |_| {
        count_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    (count, listener)
}

#[tokio::test]
async fn test_open_reaches_listener_attached_after_connect() -> anyhow::Result<()> {
    let server = EchoServer::start().await;
    let connection = Disconnected::parse(server.url()).connect().await?;

    let (opens, on_open) = counter();
    connection.subscribe(ConnectionEvent::Open, &on_open);
    connection
        .pull(ConnectionEvent::Open, Some(WAIT))
        .await?;

    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert!(connection.is_open());
    Ok(())
}

#[tokio::test]
async fn test_message_round_trip() -> anyhow::Result<()> {
    let server = EchoServer::start().await;
    let connection = connect(server.url()).await?;

    let reply = connection.pull(ConnectionEvent::Message, Some(WAIT));
    connection.send("hello").await?;

    assert_eq!(reply.await?, vec![json!("hello")]);
    Ok(())
}

#[tokio::test]
async fn test_failing_listener_does_not_stop_delivery() -> anyhow::Result<()> {
    let server = EchoServer::start().await;
    let connection = connect(server.url()).await?;

    let failing = Listener::new(|_| Err("listener broke".into()));
    let (messages, on_message) = counter();
    connection
        .subscribe(ConnectionEvent::Message, &failing)
        .subscribe(ConnectionEvent::Message, &on_message);

    let reply = connection.pull(ConnectionEvent::Message, Some(WAIT));
    connection.send("x").await?;
    reply.await?;

    assert_eq!(messages.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_disconnect_keeps_descriptor() -> anyhow::Result<()> {
    let server = EchoServer::start().await;
    let before = Disconnected::parse(format!("127.0.0.1:{}", server.port()));

    let connection = before.connect().await?;
    let after = connection.disconnect();

    assert_eq!(after, before);
    assert_eq!(after.host(), "127.0.0.1");
    assert_eq!(after.port(), Port::Number(i64::from(server.port())));
    assert!(!after.is_secure());
    Ok(())
}

#[tokio::test]
async fn test_disconnect_does_not_close_transport() -> anyhow::Result<()> {
    let mut server = EchoServer::start().await;
    let connection = connect(server.url()).await?;
    let (_, on_message) = counter();
    connection.subscribe(ConnectionEvent::Message, &on_message);

    let _server_handle = connection.disconnect();

    assert!(!server.wait_closed(std::time::Duration::from_millis(200)).await);
    assert!(connection.is_open());
    assert_eq!(connection.events().listener_count("message"), 1);

    let reply = connection.pull(ConnectionEvent::Message, Some(WAIT));
    connection.send("still here").await?;
    assert_eq!(reply.await?, vec![json!("still here")]);
    Ok(())
}

#[tokio::test]
async fn test_dropping_last_handle_closes_transport() -> anyhow::Result<()> {
    let mut server = EchoServer::start().await;
    let connection = connect(server.url()).await?;
    let clone = connection.clone();

    drop(connection);
    assert!(!server.wait_closed(std::time::Duration::from_millis(200)).await);

    drop(clone);
    assert!(server.wait_closed(WAIT).await);
    Ok(())
}

#[tokio::test]
async fn test_peer_close_emits_close_once() -> anyhow::Result<()> {
    let server = EchoServer::start().await;
    let connection = connect(server.url()).await?;

    let (closes, on_close) = counter();
    connection.subscribe(ConnectionEvent::Close, &on_close);

    let closed = connection.pull(ConnectionEvent::Close, Some(WAIT));
    connection.send(CLOSE_REQUEST).await?;
    closed.await?;

    assert_eq!(closes.load(Ordering::SeqCst), 1);

    let err = connection.send("too late").await.unwrap_err();
    assert!(err.is_transport_error());
    assert!(!connection.is_open());
    Ok(())
}

#[tokio::test]
async fn test_explicit_close() -> anyhow::Result<()> {
    let mut server = EchoServer::start().await;
    let connection = connect(server.url()).await?;

    let closed = connection.pull(ConnectionEvent::Close, Some(WAIT));
    connection.close().await?;
    closed.await?;

    assert!(server.wait_closed(WAIT).await);
    Ok(())
}

#[tokio::test]
async fn test_unsubscribe_through_connection() -> anyhow::Result<()> {
    let server = EchoServer::start().await;
    let connection = connect(server.url()).await?;
    let (messages, on_message) = counter();

    connection.subscribe(ConnectionEvent::Message, &on_message);
    connection.unsubscribe(Some(ConnectionEvent::Message), Some(&on_message))?;

    let err = connection.unsubscribe(None, Some(&on_message)).unwrap_err();
    assert!(matches!(err, Error::InvalidUnsubscribe));

    let reply = connection.pull(ConnectionEvent::Message, Some(WAIT));
    connection.send("ignored").await?;
    reply.await?;

    assert_eq!(messages.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_connect_refused() {
    let port = unused_port().await;
    let server = Disconnected::parse(format!("ws://127.0.0.1:{port}"));

    let err = server.connect().await.unwrap_err();

    assert!(err.is_connect_error());
    assert_eq!(err.descriptor(), Some(server.descriptor()));
    assert!(err.source().is_some());
    assert_eq!(
        err.to_string(),
        format!("Failed to connect to ws://127.0.0.1:{port}!")
    );
}

#[tokio::test]
async fn test_connect_with_options() -> anyhow::Result<()> {
    let server = EchoServer::start().await;
    let options = ConnectOptions::new()
        .with_open_timeout(WAIT)
        .with_max_message_size(1024);

    let connection = Disconnected::parse(server.url())
        .connect_with(&options)
        .await?;

    let reply = connection.pull(ConnectionEvent::Message, Some(WAIT));
    connection.send("small").await?;
    assert_eq!(reply.await?, vec![json!("small")]);
    Ok(())
}

#[tokio::test]
async fn test_handle_connected() -> anyhow::Result<()> {
    let server = EchoServer::start().await;
    let connection = connect(server.url()).await?;
    let descriptor = connection.descriptor().clone();

    let handle = ConnectionHandle::from(connection);
    assert!(handle.is_connected());
    assert_eq!(handle.descriptor(), &descriptor);

    let server_handle = handle.into_disconnected();
    assert_eq!(server_handle.descriptor(), &descriptor);
    Ok(())
}
