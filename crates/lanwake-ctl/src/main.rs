//! lanwake-ctl: command-line interface for the lanwake agent.

use anyhow::{Context, Result};

mod cmd;

const DEFAULT_PORT: u16 = 9101;

fn print_usage() {
    println!("Usage: lanwake-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status                          Show agent status");
    println!("  devices                         List registered devices");
    println!("  show <name>                     Show one device in detail");
    println!("  add <name> <ip> [mac] [desc]    Register or update a device");
    println!("  remove <name>                   Remove a device");
    println!("  wake <name>                     Send a wake packet to a device");
    println!("  enable <name>                   Resume probing a device");
    println!("  disable <name>                  Stop probing a device");
    println!("  check <name>                    Ask for a device status reply");
    println!("  wake-mac <mac> [broadcast]      Wake a MAC address directly");
    println!("  probe <address>                 Run a one-off reachability probe");
    println!("  messages [since]                Show published channel messages");
    println!("  shutdown                        Stop the agent");
    println!();
    println!("Options:");
    println!("  --port <port>   API port (default: {})", DEFAULT_PORT);
}

/// Split `--port` out of the argument list.
fn parse_args(args: &[String]) -> Result<(u16, Vec<&str>)> {
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }
    Ok((port, remaining))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (port, remaining) = parse_args(&args)?;

    match remaining.as_slice() {
        ["status"] | [] => cmd::status::cmd_status(port).await,
        ["devices"] => cmd::devices::cmd_devices(port).await,
        ["show", name] => cmd::devices::cmd_show(port, name).await,
        ["add", name, ip] => cmd::devices::cmd_add(port, name, ip, None, None).await,
        ["add", name, ip, mac] => cmd::devices::cmd_add(port, name, ip, Some(*mac), None).await,
        ["add", name, ip, mac, desc @ ..] => {
            let description = desc.join(" ");
            cmd::devices::cmd_add(port, name, ip, Some(*mac), Some(&description)).await
        }
        ["remove", name] => cmd::devices::cmd_remove(port, name).await,
        ["wake", name] => cmd::devices::cmd_verb(port, name, "wake").await,
        ["enable", name] => cmd::devices::cmd_verb(port, name, "enable").await,
        ["disable", name] => cmd::devices::cmd_verb(port, name, "disable").await,
        ["check", name] => cmd::devices::cmd_verb(port, name, "status").await,
        ["wake-mac", mac] => cmd::wake::cmd_wake_mac(port, mac, None).await,
        ["wake-mac", mac, broadcast] => cmd::wake::cmd_wake_mac(port, mac, Some(*broadcast)).await,
        ["probe", address] => cmd::wake::cmd_probe(port, address).await,
        ["messages"] => cmd::status::cmd_messages(port, 0).await,
        ["messages", since] => {
            let since = since.parse().context("since must be a sequence number")?;
            cmd::status::cmd_messages(port, since).await
        }
        ["shutdown"] => cmd::status::cmd_shutdown(port).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
