use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ichat_server::config::Config;
use tokio::net::UdpSocket;
use tokio::time::timeout;

const SERVER: &str = "127.0.0.1:47320";

async fn recv(socket: &UdpSocket) -> Result<String> {
    let mut buf = [0u8; codec::BUFFER_SIZE];
    let (size, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf)).await??;
    Ok(String::from_utf8(buf[..size].to_vec())?)
}

#[tokio::test]
async fn connect_chat_and_disconnect_end_to_end() -> Result<()> {
    let mut config = Config::default();
    config.chat.listen = SERVER.parse()?;
    tokio::spawn(ichat_server::server_main(Arc::new(config)));

    // Give the server a moment to bind.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let alice = UdpSocket::bind("127.0.0.1:0").await?;
    alice.connect(SERVER).await?;
    alice.send(b"conn$Alice").await?;
    assert_eq!(
        recv(&alice).await?,
        "conn$ Hi Alice, you have successfully connected to the chat\n"
    );

    alice.send(b"say$hello").await?;
    assert_eq!(recv(&alice).await?, "say$ Alice: hello\n");

    // A later joiner gets the acknowledgement, then the history replay.
    let bob = UdpSocket::bind("127.0.0.1:0").await?;
    bob.connect(SERVER).await?;
    bob.send(b"conn$Bob").await?;
    assert_eq!(
        recv(&bob).await?,
        "conn$ Hi Bob, you have successfully connected to the chat\n"
    );
    assert_eq!(recv(&bob).await?, "history$ Alice: hello\n");

    // Directed message reaches the recipient and echoes to the sender.
    alice.send(b"sayto$Bob are you there").await?;
    assert_eq!(recv(&bob).await?, "sayto$ Alice: are you there\n");
    assert_eq!(recv(&alice).await?, "sayto$ Alice: are you there\n");

    alice.send(b"disconn$").await?;
    assert_eq!(recv(&alice).await?, "disconn$ Disconnected. Bye!\n");

    // Alice is gone: Bob's broadcast only reaches Bob.
    bob.send(b"say$bye").await?;
    assert_eq!(recv(&bob).await?, "say$ Bob: bye\n");
    assert!(recv(&alice).await.is_err());

    Ok(())
}
