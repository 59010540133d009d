use tokio::{io::AsyncReadExt, sync::mpsc};

pub const CHUNK_SIZE: usize = 1024;

/// Reads from `conn` and hands each chunk to `chunks`,
/// until EOF or some error occurred.
/// The channel is closed when `pump` returns.
pub async fn pump<R>(mut conn: R, chunks: mpsc::Sender<Vec<u8>>)
where
    R: AsyncReadExt + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        match conn.read(&mut buf).await {
            // clean end of stream
            Ok(0) => return,
            Ok(rcount) => {
                // copy out of the buffer, the chunk must survive the next read
                if chunks.send(buf[..rcount].to_vec()).await.is_err() {
                    // the relay is gone, nobody is listening anymore
                    return;
                }
            }
            Err(err) => {
                tracing::error!("read failed: {}", err);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, time::Duration};

    use tokio::{io::AsyncWriteExt, sync::mpsc, time::timeout};

    #[tokio::test]
    async fn splits_input_into_bounded_chunks_in_order() {
        let data: Vec<u8> = (0..2500).map(|i| (i % 256) as u8).collect();

        let (tx, mut rx) = mpsc::channel(1);
        let pump = tokio::spawn(super::pump(Cursor::new(data.clone()), tx));

        let mut received = Vec::new();
        while let Some(chunk) = rx.recv().await {
            assert!(!chunk.is_empty());
            assert!(chunk.len() <= super::CHUNK_SIZE);
            received.extend_from_slice(&chunk);
        }

        assert_eq!(received, data);
        pump.await.unwrap();
    }

    #[tokio::test]
    async fn closes_the_channel_on_eof() {
        let (tx, mut rx) = mpsc::channel(1);
        let pump = tokio::spawn(super::pump(Cursor::new(Vec::new()), tx));

        assert!(rx.recv().await.is_none());
        pump.await.unwrap();
    }

    #[tokio::test]
    async fn stops_once_the_consumer_is_gone() {
        let (mut near, far) = tokio::io::duplex(64);
        let (tx, rx) = mpsc::channel(1);
        let pump = tokio::spawn(super::pump(far, tx));

        near.write_all(b"first").await.unwrap();
        drop(rx);
        near.write_all(b"second").await.unwrap();

        timeout(Duration::from_secs(1), pump)
            .await
            .expect("pump did not stop after its consumer was dropped")
            .unwrap();
    }
}
