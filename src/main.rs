use chrono::Local;
use clap::Parser;
use log::info;
use relay_client::config::{KEY_PASSPHRASE, KEY_SERVER_ADDRESS};
use relay_client::websocket::WebSocketTransportFactory;
use relay_client::{Connector, GetChatMessagesOptions, GetChatsOptions, MemoryConfigStore};
use std::sync::Arc;

/// Small demo client: connects to a relay server and prints chats or the
/// recent messages of one chat.
#[derive(Parser)]
#[command(name = "relay-client", about = "Messaging-relay demo client")]
struct Args {
    /// Relay server URL, e.g. https://relay.example.com
    #[arg(long, short = 's')]
    server: String,
    /// Connection passphrase
    #[arg(long, short = 'p')]
    passphrase: String,
    /// Chat guid to dump messages from (omit to list chats)
    #[arg(long, short = 'c')]
    chat: Option<String>,
    /// How many messages to fetch
    #[arg(long, default_value_t = 25)]
    limit: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{:<5}] [{}] - {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let store = Arc::new(MemoryConfigStore::new());
    store.set(KEY_SERVER_ADDRESS, &args.server);
    store.set(KEY_PASSPHRASE, &args.passphrase);

    let connector = Connector::new(store, Arc::new(WebSocketTransportFactory::new()));
    connector.connect(true).await?;

    match args.chat {
        Some(chat_guid) => {
            let messages = connector
                .get_chat_messages(
                    &chat_guid,
                    GetChatMessagesOptions {
                        limit: args.limit,
                        ..Default::default()
                    },
                )
                .await?;
            info!("Fetched {} message(s) from {chat_guid}", messages.len());
            for message in messages {
                let when = message
                    .date_created
                    .and_then(chrono::DateTime::from_timestamp_millis)
                    .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown time".to_string());
                let who = if message.is_from_me {
                    "me".to_string()
                } else {
                    message
                        .handle
                        .as_ref()
                        .map(|h| h.address.clone())
                        .unwrap_or_else(|| "unknown".to_string())
                };
                println!("[{when}] {who}: {}", message.text.as_deref().unwrap_or(""));
            }
        }
        None => {
            let chats = connector.get_chats(GetChatsOptions::default()).await?;
            info!("Fetched {} chat(s)", chats.len());
            for chat in chats {
                let name = chat.display_name.as_deref().unwrap_or(&chat.guid);
                println!("{name} ({} participant(s))", chat.participants.len());
            }
        }
    }

    connector.disconnect().await;
    Ok(())
}
