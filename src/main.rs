use clap::Parser;
use tokio::net::TcpListener;

mod reader;
mod relay;

/// TCP port forwarder: relays every inbound connection to a fixed remote server.
#[derive(Parser, Debug)]
struct Args {
    /// TCP server address
    #[arg(long)]
    server: String,

    /// TCP server port
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    server_port: u16,

    /// Local address to listen
    #[arg(long, default_value = "localhost")]
    addr: String,

    /// Local port to listen
    #[arg(long, default_value_t = 8888, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // connect tracing to stdout
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    anyhow::ensure!(!args.server.is_empty(), "invalid server");
    anyhow::ensure!(!args.addr.is_empty(), "invalid addr");

    let target = format!("{}:{}", args.server, args.server_port);

    let listener = TcpListener::bind((args.addr.as_str(), args.port)).await?;
    tracing::info!("Server listening on: {}", listener.local_addr()?);

    loop {
        let conn = match listener.accept().await {
            Ok((conn, _)) => conn,
            Err(err) => {
                // a failed accept only loses that one connection
                tracing::error!("accept failed: {}", err);
                continue;
            }
        };

        let target = target.clone();
        tokio::spawn(async move {
            if let Err(err) = relay::serve(conn, &target).await {
                tracing::error!("session failed: {:#}", err);
            }
        });
    }
}
