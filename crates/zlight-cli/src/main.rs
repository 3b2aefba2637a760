//! `zlight`: control lights behind a ZigBee gateway from the command line.
//!
//! Every invocation opens one session, waits briefly for the gateway to list
//! its devices, groups and scenes, runs one command and closes the link.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use zlight_gateway::srpc_protocol::{AttributeKind, CLUSTER_ON_OFF};
use zlight_gateway::{
    Device, DeviceAddress, Gateway, GatewayConfig, GatewayError, Notification, Registry,
    ResponseStatus, Target,
};

#[derive(Parser, Debug)]
#[command(name = "zlight", about = "Control lights behind a ZigBee gateway", version)]
struct Cli {
    /// Gateway host name or IP address
    #[arg(short, long)]
    gateway: Option<String>,

    /// Gateway TCP port
    #[arg(short, long)]
    port: Option<u16>,

    /// YAML settings file; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How long to let discovery answers arrive before running the command (ms)
    #[arg(long, default_value_t = 1000)]
    settle: u64,

    /// Log more (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List devices
    Devices {
        /// Print JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
    /// List groups
    Groups,
    /// List scenes
    Scenes,
    /// Switch a device or group on
    On { target: String },
    /// Switch a device or group off
    Off { target: String },
    /// Set the level of a device or group
    Level { target: String, level: u8 },
    /// Set the hue and saturation of a device or group
    Color { target: String, hue: u8, sat: u8 },
    /// Read state, level, hue and saturation of a device
    Query { device: String },
    /// Make a device identify itself
    Identify {
        device: String,
        #[arg(default_value_t = 5)]
        seconds: u16,
    },
    /// Create a group, optionally adding a device to it
    GroupCreate {
        name: String,
        #[arg(long)]
        device: Option<String>,
    },
    /// Store the current state of a group as a scene
    SceneStore { group: String, name: String },
    /// Recall a scene on a group
    SceneRecall { group: String, name: String },
    /// Rename a device
    Rename { old: String, new: String },
    /// Bind a switch to a device
    Bind {
        src: String,
        dst: String,
        /// Cluster id, decimal or 0x-prefixed hex
        #[arg(long, value_parser = parse_u16, conflicts_with = "all")]
        cluster: Option<u16>,
        /// Bind on/off, level, colour, scenes and groups
        #[arg(long)]
        all: bool,
    },
    /// Print notifications until Ctrl-C
    Watch,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("no device or group matches {0:?}")]
    NoTarget(String),

    #[error("{0:?} is a group; a single device is needed here")]
    NotADevice(String),

    #[error("group {0:?} is unknown or not yet confirmed by the gateway")]
    UnknownGroup(String),

    #[error("invalid address {0:?}, expected 0xADDR:EP")]
    BadAddress(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("cannot install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

type CliResult<T> = Result<T, CliError>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("zlight: {}", err);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> CliResult<GatewayConfig> {
    let mut config = match &cli.config {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(host) = &cli.gateway {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    Ok(config)
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli)?;
    info!("connecting to {}", config.address());
    let gateway = Gateway::connect(config).await?;

    tokio::time::sleep(Duration::from_millis(cli.settle)).await;
    debug!("{} devices after discovery", gateway.registry().devices().len());

    let result = execute(&gateway, cli.command, cli.settle).await;
    gateway.close().await?;
    result
}

async fn execute(gateway: &Gateway, command: Command, settle: u64) -> CliResult<()> {
    let registry = gateway.registry();

    match command {
        Command::Devices { json: false } => print!("{}", registry.summary()),
        Command::Devices { json: true } => {
            let rows: Vec<DeviceRow> = registry.devices().iter().map(DeviceRow::from).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Groups => {
            for group in registry.groups() {
                println!("{:>5}  {}  ({:?})", group.id, group.name, group.status);
            }
        }
        Command::Scenes => {
            for scene in registry.scenes() {
                println!(
                    "{:>5}/{:<3}  {}  ({:?})",
                    scene.group_id, scene.scene_id, scene.name, scene.status
                );
            }
        }
        Command::On { target } => gateway.set_state(resolve(registry, &target)?, true).await?,
        Command::Off { target } => gateway.set_state(resolve(registry, &target)?, false).await?,
        Command::Level { target, level } => {
            gateway.set_level(resolve(registry, &target)?, level).await?
        }
        Command::Color { target, hue, sat } => {
            gateway
                .set_hue_sat(resolve(registry, &target)?, hue, sat)
                .await?
        }
        Command::Query { device } => {
            let addr = resolve_device(registry, &device)?;
            let report = gateway.wait_for_attributes(addr).await?;
            println!("{} ({:?})", report.device().name, report.status);
            for kind in AttributeKind::ALL {
                if !report.device().supports(kind) {
                    continue;
                }
                let marker = if report.value(kind).is_some() { "" } else { " (last known)" };
                println!("  {:<10} {}{}", kind, report.last_known(kind), marker);
            }
            if report.status == ResponseStatus::Unresponsive {
                println!("  no answer from the device");
            }
        }
        Command::Identify { device, seconds } => {
            gateway.identify(resolve_device(registry, &device)?, seconds).await?
        }
        Command::GroupCreate { name, device } => {
            match device {
                Some(device) => {
                    let addr = resolve_device(registry, &device)?;
                    gateway.add_device_to_group(addr, &name).await?;
                }
                None => {
                    gateway.create_group(&name).await?;
                }
            }
            tokio::time::sleep(Duration::from_millis(settle)).await;
            match registry.group(&name) {
                Some(group) if group.is_active() => println!("{} has id {}", name, group.id),
                _ => println!("{} is waiting for the gateway", name),
            }
        }
        Command::SceneStore { group, name } => {
            gateway.create_scene(&name, group_id(registry, &group)?).await?
        }
        Command::SceneRecall { group, name } => {
            gateway.recall_scene(&name, group_id(registry, &group)?).await?
        }
        Command::Rename { old, new } => {
            let addr = gateway.rename_device(&old, &new).await?;
            println!("{} is now {}", addr, new);
        }
        Command::Bind {
            src,
            dst,
            cluster,
            all,
        } => {
            let src = resolve_device(registry, &src)?;
            let dst = resolve_device(registry, &dst)?;
            if all {
                gateway.bind_all(src, dst).await?;
            } else {
                let cluster = cluster.unwrap_or(CLUSTER_ON_OFF);
                gateway.bind_devices(src, dst, cluster).await?;
            }
        }
        Command::Watch => watch(gateway).await?,
    }
    Ok(())
}

/// Print notifications until Ctrl-C or the link goes away.
async fn watch(gateway: &Gateway) -> CliResult<()> {
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })?;

    print!("{}", gateway.registry().summary());
    let notifications = gateway.notifications().clone();
    let printer = tokio::task::spawn_blocking(move || loop {
        crossbeam_channel::select! {
            recv(notifications.receiver()) -> note => match note {
                Ok(note) => {
                    println!("{}", note);
                    if matches!(note, Notification::ConnectionLost { .. }) {
                        break;
                    }
                }
                Err(_) => break,
            },
            recv(stop_rx) -> _ => break,
        }
    });

    if let Err(e) = printer.await {
        debug!("notification printer stopped: {}", e);
    }
    Ok(())
}

// ============================================================================
// Target resolution
// ============================================================================

/// How the user named a device or group.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Name(String),
    Address(DeviceAddress),
    Group(String),
}

fn parse_selector(text: &str) -> Result<Selector, CliError> {
    if let Some(group) = text.strip_prefix("group:") {
        return Ok(Selector::Group(group.to_string()));
    }
    if text.starts_with("0x") || text.starts_with("0X") {
        let (addr, ep) = text
            .split_once(':')
            .ok_or_else(|| CliError::BadAddress(text.to_string()))?;
        let nwk_addr = parse_u16(addr).map_err(|_| CliError::BadAddress(text.to_string()))?;
        let endpoint = ep
            .parse::<u8>()
            .map_err(|_| CliError::BadAddress(text.to_string()))?;
        return Ok(Selector::Address(DeviceAddress::new(nwk_addr, endpoint)));
    }
    Ok(Selector::Name(text.to_string()))
}

fn resolve(registry: &Registry, text: &str) -> CliResult<Target> {
    match parse_selector(text)? {
        Selector::Group(name) => registry
            .group(&name)
            .filter(|g| g.is_active())
            .map(|g| Target::from(&g))
            .ok_or(CliError::UnknownGroup(name)),
        _ => resolve_device(registry, text).map(Target::Device),
    }
}

fn resolve_device(registry: &Registry, text: &str) -> CliResult<DeviceAddress> {
    let device = match parse_selector(text)? {
        Selector::Group(_) => return Err(CliError::NotADevice(text.to_string())),
        Selector::Address(addr) => registry.device(addr),
        Selector::Name(name) => registry.device_by_name(&name),
    };
    device
        .map(|d| d.address)
        .ok_or_else(|| CliError::NoTarget(text.to_string()))
}

/// A group given by name, or by id if no group has that name.
fn group_id(registry: &Registry, text: &str) -> CliResult<u16> {
    match registry.group(text) {
        Some(group) if group.is_active() => Ok(group.id),
        _ => parse_u16(text).map_err(|_| CliError::UnknownGroup(text.to_string())),
    }
}

fn parse_u16(text: &str) -> Result<u16, std::num::ParseIntError> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse(),
    }
}

// ============================================================================
// JSON output
// ============================================================================

#[derive(Serialize, Debug)]
struct DeviceRow {
    name: String,
    address: String,
    ieee: String,
    /// The IEEE address in wire byte order, as the gateway sends it.
    ieee_wire: String,
    profile_id: u16,
    device_id: u16,
    kind: &'static str,
    capabilities: Vec<&'static str>,
}

impl From<&Device> for DeviceRow {
    fn from(device: &Device) -> Self {
        DeviceRow {
            name: device.name.clone(),
            address: device.address.to_string(),
            ieee: device.ieee.to_string(),
            ieee_wire: device.ieee.to_hex(),
            profile_id: device.profile_id,
            device_id: device.device_id,
            kind: device.type_label,
            capabilities: device.capabilities.descriptions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zlight_gateway::notify;
    use zlight_gateway::srpc_protocol::{
        DeviceAnnouncement, IeeeAddress, HA_DEVICEID_DIMMABLE_LIGHT, ZCL_HA_PROFILE_ID,
    };

    fn registry_with_light() -> Registry {
        let (sink, _notes) = notify::channel();
        let registry = Registry::new(sink);
        registry.announce_device(&DeviceAnnouncement {
            nwk_addr: 0x1234,
            endpoint: 1,
            profile_id: ZCL_HA_PROFILE_ID,
            device_id: HA_DEVICEID_DIMMABLE_LIGHT,
            version: 0,
            name: "Light".to_string(),
            status: 0,
            ieee: IeeeAddress::new([0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]),
        });
        registry
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(
            parse_selector("0x1234:1").unwrap(),
            Selector::Address(DeviceAddress::new(0x1234, 1))
        );
        assert_eq!(
            parse_selector("group:Kitchen").unwrap(),
            Selector::Group("Kitchen".to_string())
        );
        assert_eq!(
            parse_selector("1: Light").unwrap(),
            Selector::Name("1: Light".to_string())
        );
        assert!(matches!(
            parse_selector("0x12zz:1"),
            Err(CliError::BadAddress(_))
        ));
        assert!(matches!(parse_selector("0x1234"), Err(CliError::BadAddress(_))));
    }

    #[test]
    fn test_parse_u16() {
        assert_eq!(parse_u16("0x0300").unwrap(), 0x0300);
        assert_eq!(parse_u16("6").unwrap(), 6);
        assert!(parse_u16("0x10000").is_err());
    }

    #[test]
    fn test_resolve_device_and_group() {
        let registry = registry_with_light();
        let by_name = resolve(&registry, "1: Light").unwrap();
        let by_addr = resolve(&registry, "0x1234:1").unwrap();
        assert_eq!(by_name, by_addr);
        assert!(matches!(resolve(&registry, "Nope"), Err(CliError::NoTarget(_))));

        registry.upsert_group(7, "Kitchen");
        assert_eq!(resolve(&registry, "group:Kitchen").unwrap(), Target::Group(7));
        assert!(matches!(
            resolve_device(&registry, "group:Kitchen"),
            Err(CliError::NotADevice(_))
        ));
    }

    #[test]
    fn test_group_id_by_name_or_number() {
        let registry = registry_with_light();
        registry.upsert_group(7, "Kitchen");
        assert_eq!(group_id(&registry, "Kitchen").unwrap(), 7);
        assert_eq!(group_id(&registry, "12").unwrap(), 12);
        assert!(group_id(&registry, "Attic").is_err());
    }

    #[test]
    fn test_json_row() {
        let registry = registry_with_light();
        let row = DeviceRow::from(&registry.devices()[0]);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["name"], "1: Light");
        assert_eq!(json["address"], "0x1234:1");
        assert_eq!(json["capabilities"][1], "Dimmable");
        assert_eq!(json["ieee"], "1122334455667788");
        assert_eq!(json["ieee_wire"], "8877665544332211");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "zlight", "--gateway", "10.0.0.2", "-vv", "bind", "a", "b", "--cluster", "0x0008",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Bind { cluster: Some(0x0008), all: false, .. }
        ));
        assert!(Cli::try_parse_from(["zlight", "bind", "a", "b", "--cluster", "6", "--all"]).is_err());
    }
}
