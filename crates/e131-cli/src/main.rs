mod dump;

use std::fs;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use e131_core::{
    DEFAULT_PORT, DEFAULT_PRIORITY, DecodeError, Destination, InvalidArgument, Packet,
    PacketBuilder, PacketOption, ProtocolError, Received, Receiver, Sender, Transport,
    TransportError, UdpTransport, decode, encode, validate,
};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::dump::{Dump, hex};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("E131_BUILD_COMMIT"),
    " ",
    env!("E131_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  e131 send --universe 1 --channels 24 --preview\n  e131 send --host 192.168.1.50 --count 10 --dump\n  e131 recv --universe 1 --json\n  e131 encode --universe 7 --level 255 -o packet.bin\n  e131 inspect packet.bin";

#[derive(Parser, Debug)]
#[command(name = "e131")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "E1.31 (Streaming ACN) test sender, receiver and packet inspector.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stream cycling levels to a universe (multicast unless --host is given).
    Send(SendArgs),
    /// Listen for E1.31 packets and print them.
    Recv(RecvArgs),
    /// Write one encoded packet to a file, or as hex to stdout.
    Encode(EncodeArgs),
    /// Validate and decode a raw packet file.
    Inspect {
        /// File holding one raw E1.31 packet
        input: PathBuf,

        /// Print the decoded packet as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Packet template shared by `send` and `encode`.
#[derive(Args, Debug)]
struct StreamArgs {
    /// Universe number (1-63999)
    #[arg(short, long, default_value_t = 1)]
    universe: u16,

    /// Number of DMX channels (1-512)
    #[arg(short, long, default_value_t = 24)]
    channels: usize,

    /// Source name (truncated to 63 bytes)
    #[arg(long, default_value = "E1.31 Test Client")]
    name: String,

    /// Stream priority (0-200)
    #[arg(long, default_value_t = DEFAULT_PRIORITY)]
    priority: u8,

    /// Mark packets as preview data
    #[arg(long)]
    preview: bool,

    /// Component identifier as 32 hex digits (dashes allowed)
    #[arg(long)]
    cid: Option<String>,
}

#[derive(Args, Debug)]
struct SendArgs {
    #[command(flatten)]
    stream: StreamArgs,

    /// Unicast destination host; multicast to the universe group when absent
    #[arg(long)]
    host: Option<String>,

    /// Destination UDP port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Stop after this many packets (runs forever when absent)
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Delay between packets
    #[arg(long, default_value_t = 250)]
    interval_ms: u64,

    /// Dump every packet to stderr before sending
    #[arg(long)]
    dump: bool,
}

#[derive(Args, Debug)]
struct RecvArgs {
    /// UDP port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Join this universe's multicast group and ignore other universes
    #[arg(short, long)]
    universe: Option<u16>,

    /// Local interface address used for the multicast join
    #[arg(long, default_value_t = Ipv4Addr::UNSPECIFIED)]
    iface: Ipv4Addr,

    /// Print accepted packets as JSON lines on stdout
    #[arg(long, conflicts_with = "quiet")]
    json: bool,

    /// Stop after this many accepted packets
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Stop when nothing arrives for this long
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Only print the final summary
    #[arg(long)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    #[command(flatten)]
    stream: StreamArgs,

    /// Level written to every channel
    #[arg(long, default_value_t = 0)]
    level: u8,

    /// Sequence number of the packet
    #[arg(long, default_value_t = 0)]
    sequence: u8,

    /// Output file (hex on stdout when absent)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Send(args) => cmd_send(args),
        Commands::Recv(args) => cmd_recv(args),
        Commands::Encode(args) => cmd_encode(args),
        Commands::Inspect { input, json } => cmd_inspect(&input, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

impl From<InvalidArgument> for CliError {
    fn from(err: InvalidArgument) -> Self {
        let hint = match err {
            InvalidArgument::Universe(_) => Some("use --universe between 1 and 63999"),
            InvalidArgument::ChannelCount(_) => Some("use --channels between 1 and 512"),
            InvalidArgument::Priority(_) => Some("use --priority between 0 and 200"),
            InvalidArgument::EmptyHost => Some("pass a host name or IPv4 address to --host"),
            _ => None,
        };
        CliError::new(err.to_string(), hint.map(str::to_string))
    }
}

fn cmd_send(args: SendArgs) -> Result<(), CliError> {
    let packet = build_packet(&args.stream)?;
    let destination = match args.host.as_deref() {
        Some(host) => Destination::unicast(host, args.port).map_err(|err| {
            CliError::new(
                format!("cannot resolve destination: {}", err),
                Some("use an IPv4 address or a resolvable host name".to_string()),
            )
        })?,
        None => Destination::multicast(packet.universe(), args.port)?,
    };

    let mut transport = UdpTransport::open();
    transport
        .ensure_bound()
        .context("Failed to open UDP socket")?;
    let sender = Sender::new(transport, destination, packet);
    log::info!("send: streaming to {}", destination);

    let interval = Duration::from_millis(args.interval_ms);
    let mut level: u8 = 0;
    let mut sent: u64 = 0;
    while args.count.is_none_or(|count| sent < count) {
        if sent > 0 && !interval.is_zero() {
            thread::sleep(interval);
        }
        sender
            .send_with(|packet| {
                packet.channels_mut().fill(level);
                if args.dump {
                    eprint!("{}", Dump(packet));
                }
                Ok(())
            })
            .with_context(|| format!("Failed to send to {}", destination))?;
        level = level.wrapping_add(1);
        sent += 1;
    }

    sender
        .terminate()
        .with_context(|| format!("Failed to terminate stream to {}", destination))?;
    eprintln!("OK: sent {} packets -> {}", sent, destination);
    Ok(())
}

fn cmd_recv(args: RecvArgs) -> Result<(), CliError> {
    let mut transport = UdpTransport::open();
    if let Some(ms) = args.timeout_ms {
        transport = transport.with_read_timeout(Duration::from_millis(ms));
    }
    transport.bind(args.port).map_err(|err| {
        CliError::new(
            format!("cannot listen on UDP port {}: {}", args.port, err),
            Some("choose another --port or stop the other listener".to_string()),
        )
    })?;
    if let Some(universe) = args.universe {
        transport
            .join_multicast(universe, args.iface)
            .map_err(|err| {
                CliError::new(
                    format!("cannot join multicast group of universe {}: {}", universe, err),
                    Some("check --universe and pass the receiving interface with --iface".to_string()),
                )
            })?;
    }

    let mut receiver = Receiver::new(transport);
    let mut accepted: u64 = 0;
    while args.count.is_none_or(|count| accepted < count) {
        let received = match receiver.next_accepted() {
            Ok(received) => received,
            Err(TransportError::Io(err)) if is_timeout(&err) => {
                log::info!("recv: no packet within timeout, stopping");
                break;
            }
            Err(err) => return Err(anyhow::Error::new(err).context("Receive failed").into()),
        };
        if args
            .universe
            .is_some_and(|universe| universe != received.packet.universe())
        {
            continue;
        }
        accepted += 1;

        if args.quiet {
            continue;
        }
        if args.json {
            println!("{}", packet_line(&received)?);
        } else {
            eprintln!("from {}", received.from);
            eprint!("{}", Dump(&received.packet));
        }
    }

    let summary =
        serde_json::to_string(&receiver.summary()).context("JSON serialization failed")?;
    println!("{}", summary);
    Ok(())
}

fn cmd_encode(args: EncodeArgs) -> Result<(), CliError> {
    let mut packet = build_packet(&args.stream)?;
    packet.set_sequence_number(args.sequence);
    packet.channels_mut().fill(args.level);
    let bytes = encode(&packet);

    let Some(output) = args.output else {
        println!("{}", hex(&bytes, ""));
        return Ok(());
    };
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write packet: {}", output.display()))?;
    if !args.quiet {
        eprintln!("OK: {} bytes written -> {}", bytes.len(), output.display());
    }
    Ok(())
}

fn cmd_inspect(input: &Path, json: bool) -> Result<(), CliError> {
    if !input.is_file() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a file holding one raw E1.31 packet".to_string()),
        ));
    }
    let bytes = fs::read(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;

    validate(&bytes).map_err(|err| {
        CliError::new(
            format!("invalid packet: {}", err),
            Some(protocol_hint(err).to_string()),
        )
    })?;
    let packet = decode(&bytes).map_err(|err| {
        CliError::new(
            format!("malformed packet: {}", err),
            Some(decode_hint(&err).to_string()),
        )
    })?;

    if json {
        let text = serde_json::to_string_pretty(&packet).context("JSON serialization failed")?;
        println!("{}", text);
    } else {
        print!("{}", Dump(&packet));
    }
    Ok(())
}

fn build_packet(args: &StreamArgs) -> Result<Packet, CliError> {
    let cid = args
        .cid
        .as_deref()
        .map(parse_cid)
        .transpose()?
        .unwrap_or_default();
    let packet = PacketBuilder::new(args.universe, args.channels)
        .source_name(&args.name)
        .priority(args.priority)
        .option(PacketOption::Preview, args.preview)
        .cid(cid)
        .build()?;
    Ok(packet)
}

fn parse_cid(text: &str) -> Result<[u8; 16], CliError> {
    let invalid = || {
        CliError::new(
            format!("invalid CID '{}'", text),
            Some("expected 32 hex digits, e.g. 0123456789abcdef0123456789abcdef".to_string()),
        )
    };
    let digits: Vec<u8> = text.bytes().filter(|b| *b != b'-').collect();
    if digits.len() != 32 || !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(invalid());
    }
    let mut cid = [0u8; 16];
    for (slot, pair) in cid.iter_mut().zip(digits.chunks_exact(2)) {
        let pair = std::str::from_utf8(pair).map_err(|_| invalid())?;
        *slot = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
    }
    Ok(cid)
}

#[derive(Serialize)]
struct PacketLine<'a> {
    received_at: String,
    from: SocketAddr,
    stream: String,
    packet: &'a Packet,
}

fn packet_line(received: &Received) -> Result<String, CliError> {
    let line = PacketLine {
        received_at: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("Failed to format timestamp")?,
        from: received.from,
        stream: received.key.to_string(),
        packet: &received.packet,
    };
    Ok(serde_json::to_string(&line).context("JSON serialization failed")?)
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn protocol_hint(err: ProtocolError) -> &'static str {
    match err {
        ProtocolError::NullInput => "the file is empty",
        ProtocolError::BadAcnIdentifier => {
            "the file does not start with an ACN root layer (\"ASC-E1.17\")"
        }
        ProtocolError::BadRootVector | ProtocolError::BadFrameVector => {
            "only E1.31 data packets are supported (no sync or discovery packets)"
        }
        ProtocolError::BadDmpVector => "the DMP layer must carry a set-property message",
    }
}

fn decode_hint(err: &DecodeError) -> &'static str {
    match err {
        DecodeError::TooShort { .. } => "the file is truncated",
        DecodeError::InvalidPropertyValueCount { .. } => {
            "property value count must be between 1 and 513"
        }
        DecodeError::InvalidFlags { .. } | DecodeError::LengthMismatch { .. } => {
            "a layer length field disagrees with the packet size"
        }
    }
}
