use anyhow::Context;
use tokio::{io::AsyncWriteExt, net::TcpStream, sync::mpsc};

use crate::reader;

/// Relays bytes between `client` and a fresh connection to `target` until
/// either side closes its connection, then releases both of them.
pub async fn serve(client: TcpStream, target: &str) -> anyhow::Result<()> {
    // Connect to the server.
    let server = TcpStream::connect(target)
        .await
        .with_context(|| format!("failed to dial {}", target))?;

    let (client_read, mut client_write) = client.into_split();
    let (server_read, mut server_write) = server.into_split();

    // Read from the client.
    let (tx, mut from_client) = mpsc::channel(1);
    let client_reader = tokio::spawn(reader::pump(client_read, tx));

    // Read from the server.
    let (tx, mut from_server) = mpsc::channel(1);
    let server_reader = tokio::spawn(reader::pump(server_read, tx));

    // Forward the data back and forth.
    loop {
        let (chunk, dest) = tokio::select! {
            chunk = from_client.recv() => (chunk, &mut server_write),
            chunk = from_server.recv() => (chunk, &mut client_write),
        };

        let Some(chunk) = chunk else {
            break; // Either side closed the connection.
        };

        // A failed write only loses this direction, keep serving the other.
        if let Err(err) = dest.write_all(&chunk).await {
            tracing::warn!("forward failed: {}", err);
        }
    }

    // Drop the read halves so both sockets fully close.
    client_reader.abort();
    server_reader.abort();
    let _ = client_write.shutdown().await;
    let _ = server_write.shutdown().await;

    Ok(())
}
