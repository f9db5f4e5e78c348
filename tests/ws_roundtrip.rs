use std::time::Duration;

use futures::{SinkExt, StreamExt};
use split_relay::{TimerClient, TimerConnection};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;

async fn serve() -> (TimerConnection, String) {
    let connection = TimerConnection::listen("127.0.0.1", 0)
        .await
        .expect("listen");
    let port = connection.local_addr().expect("bound").port();
    (connection, format!("ws://127.0.0.1:{}", port))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ws_roundtrip() {
    let (connection, url) = serve().await;

    let (ws, _) = tokio_tungstenite::connect_async(url).await.expect("ws connect");
    let (mut write, mut read) = ws.split();

    timeout(Duration::from_secs(3), connection.wait_connected())
        .await
        .expect("handshake in time")
        .unwrap();
    assert!(connection.connected());
    assert!(connection.peer().is_some());

    // Inbound frames are ignored, not echoed
    write.send(Message::Text("hello".into())).await.unwrap();

    let client = TimerClient::new(connection.clone(), false);
    client.start();
    client.set_game_time(12.5);
    client.split();
    client.undo();

    let mut received = Vec::new();
    while received.len() < 4 {
        let msg = timeout(Duration::from_secs(3), read.next())
            .await
            .expect("frame in time")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(t) = msg {
            received.push(t.to_string());
        }
    }
    assert_eq!(received, vec!["start", "setgametime 12.5", "split", "undo"]);

    connection.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ws_disconnect_clears_connection() {
    let (connection, url) = serve().await;

    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.expect("ws connect");
    timeout(Duration::from_secs(3), connection.wait_connected())
        .await
        .expect("handshake in time")
        .unwrap();

    ws.close(None).await.unwrap();

    let start = std::time::Instant::now();
    while connection.connected() {
        if start.elapsed() > Duration::from_secs(3) {
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    assert!(!connection.connected(), "peer still attached after close");

    // Dropped silently once the peer is gone
    connection.send("split", true);
    assert!(!connection.connected());

    connection.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ws_last_handshake_wins() {
    let (connection, url) = serve().await;

    let (ws_a, _) = tokio_tungstenite::connect_async(url.clone())
        .await
        .expect("ws A");
    timeout(Duration::from_secs(3), connection.wait_connected())
        .await
        .expect("A handshake")
        .unwrap();
    let first = connection.peer().expect("A attached").id;

    let (ws_b, _) = tokio_tungstenite::connect_async(url.clone())
        .await
        .expect("ws B");

    let start = std::time::Instant::now();
    while connection.peer().map(|p| p.id) == Some(first) {
        if start.elapsed() > Duration::from_secs(3) {
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    assert_ne!(connection.peer().map(|p| p.id), Some(first));

    connection.send("split", true);

    let (_write_a, mut read_a) = ws_a.split();
    let (_write_b, mut read_b) = ws_b.split();

    // B gets the command
    let msg = timeout(Duration::from_secs(3), read_b.next())
        .await
        .expect("B frame in time")
        .expect("B open")
        .expect("B valid");
    assert_eq!(msg, Message::Text("split".into()));

    // A was closed when superseded and never sees it
    let mut a_got_split = false;
    while let Ok(Some(Ok(msg))) = timeout(Duration::from_millis(500), read_a.next()).await {
        if msg == Message::Text("split".into()) {
            a_got_split = true;
        }
        if msg.is_close() {
            break;
        }
    }
    assert!(!a_got_split, "superseded client received a command");

    connection.shutdown().await;
}
