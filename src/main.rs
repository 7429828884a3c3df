//! MQTT Console
//!
//! Terminal consumer for a broker session: connects, subscribes to the
//! given topic filters, optionally publishes one message, then streams
//! session events to stdout until Ctrl-C.

use clap::Parser;
use mqtt_session::config::{ConfigError, QosLevel, SessionConfig};
use mqtt_session::observability::init_default_logging;
use mqtt_session::session::{ConnectionState, SessionController, SessionEvent};
use mqtt_session::sink::EventSink;
use mqtt_session::transport::MqttTransport;
use std::path::PathBuf;
use std::process;
use tokio::signal;
use tracing::{error, info, warn};

/// Connect to an MQTT broker and stream session events
#[derive(Parser)]
#[command(name = "mqtt-console")]
#[command(about = "Connect to an MQTT broker and stream session events")]
#[command(version)]
struct Args {
    /// Configuration file (TOML); flags below override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Broker host
    #[arg(long)]
    broker_host: Option<String>,

    /// Broker port
    #[arg(long)]
    port: Option<u16>,

    /// Client identifier (auto-generated when omitted)
    #[arg(long)]
    client_id: Option<String>,

    /// Topic filter to subscribe to (repeatable)
    #[arg(short, long = "subscribe", value_name = "FILTER")]
    subscribe: Vec<String>,

    /// QoS for subscriptions and the publish (0, 1 or 2)
    #[arg(short, long)]
    qos: Option<u8>,

    /// Publish one message to this topic once the session is up
    #[arg(long, value_name = "TOPIC")]
    publish: Option<String>,

    /// Payload for --publish
    #[arg(long, value_name = "PAYLOAD", default_value = "")]
    message: String,

    /// Output format (pretty, compact, or json)
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,
}

/// Output formatting options
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    /// Timestamped, human-readable (default)
    Pretty,
    /// Single line per event, minimal formatting
    Compact,
    /// JSON lines for programmatic processing
    Json,
}

/// Sink rendering the event stream to stdout.
struct ConsoleSink {
    format: OutputFormat,
}

impl EventSink for ConsoleSink {
    fn deliver(&mut self, event: &SessionEvent) {
        match self.format {
            OutputFormat::Pretty => {
                // Messages carry their own arrival timestamp; everything
                // else is stamped at render time.
                let stamp = match event {
                    SessionEvent::MessageReceived { received_at, .. } => {
                        received_at.with_timezone(&chrono::Local)
                    }
                    _ => chrono::Local::now(),
                };
                println!("[{}] {event}", stamp.format("%H:%M:%S"));
            }
            OutputFormat::Compact => println!("{event}"),
            OutputFormat::Json => match serde_json::to_string(event) {
                Ok(json) => println!("{json}"),
                Err(e) => warn!("failed to encode event: {e}"),
            },
        }
    }
}

fn build_config(args: &Args) -> Result<SessionConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load_from_file(path)?,
        None => SessionConfig::new("localhost"),
    };

    if let Some(host) = &args.broker_host {
        config.broker_host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(client_id) = &args.client_id {
        config.client_id = Some(client_id.clone());
    }
    if let Some(qos) = args.qos {
        config.default_qos = QosLevel::try_from(qos)?;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_default_logging();

    if let Err(e) = run(args).await {
        error!("mqtt-console failed: {e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    let qos = config.default_qos;

    let transport = MqttTransport::new(config.clone());
    let mut session = SessionController::new(transport, config);
    let mut sink = ConsoleSink {
        format: args.format,
    };

    session.connect().await?;
    while session.state() == ConnectionState::Connecting {
        session.dispatch_next(&mut sink).await;
    }
    if session.state() != ConnectionState::Connected {
        return Err("broker rejected the connection".into());
    }

    for filter in &args.subscribe {
        session.subscribe(filter, qos).await?;
    }
    if let Some(topic) = &args.publish {
        session.publish(topic, args.message.as_bytes(), qos).await?;
    }

    info!("session up, streaming events until Ctrl-C");
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            _ = session.dispatch_next(&mut sink) => {
                if session.state() == ConnectionState::Disconnected {
                    // Unsolicited end of session; the sink already showed it.
                    return Ok(());
                }
            }
        }
    }

    if session.state() == ConnectionState::Connected {
        session.disconnect().await?;
        session.run_until_disconnected(&mut sink).await;
    }
    Ok(())
}
