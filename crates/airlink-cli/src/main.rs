//! airlink demo command-line interface
//!
//! Drives simulated nodes over an in-memory shared channel to exercise
//! the link-layer protocol end to end:
//! - acknowledged unicast and multicast delivery
//! - the acknowledgment-timeout path on a lossy channel

use airlink_core::{
    LinkConfig, LinkError, LinkHandle, LinkNode, NodeAddress, Packet, SharedAir, SimRadio,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "airlink")]
#[command(version, about = "Polled link-layer protocol demo", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a two-node acknowledged exchange over a simulated channel
    Simulate {
        /// Number of messages to deliver
        #[arg(short, long, default_value = "10")]
        count: u32,

        /// Tick interval in milliseconds
        #[arg(long, default_value = "5")]
        tick_ms: u64,

        /// Print final statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Demonstrate the acknowledgment-timeout path on a lossy channel
    TimeoutDemo {
        /// Tick interval in milliseconds
        #[arg(long, default_value = "5")]
        tick_ms: u64,

        /// Print final statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Simulate {
            count,
            tick_ms,
            json,
        } => cmd_simulate(count, tick_ms, json),

        Commands::TimeoutDemo { tick_ms, json } => cmd_timeout_demo(tick_ms, json),
    }
}

/// Tick loop driving one node until the stop flag is raised
fn spawn_driver(
    mut node: LinkNode<SimRadio>,
    stop: Arc<AtomicBool>,
    tick_ms: u64,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            node.tick_receive();
            node.tick_transmit();
            thread::sleep(Duration::from_millis(tick_ms));
        }
        node.power_down();
    })
}

fn print_stats(a: &LinkHandle, b: &LinkHandle, json: bool) -> Result<()> {
    if json {
        let report = serde_json::json!({
            "node_a": a.stats(),
            "node_b": b.stats(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let stats_a = a.stats();
        let stats_b = b.stats();
        info!(
            "node A: {} data tx, {} acks matched, {} deferred, {} timeouts",
            stats_a.data_tx, stats_a.acks_matched, stats_a.tx_deferred, stats_a.ack_timeouts
        );
        info!(
            "node B: {} frames rx, {} acks staged, {} delivered",
            stats_b.frames_rx, stats_b.acks_staged, stats_b.data_delivered
        );
    }
    Ok(())
}

fn cmd_simulate(count: u32, tick_ms: u64, json: bool) -> Result<()> {
    let air = SharedAir::new();
    let node_a = LinkNode::new(air.attach(), LinkConfig::new(NodeAddress::from_u16(1)));
    let node_b = LinkNode::new(air.attach(), LinkConfig::new(NodeAddress::from_u16(2)));
    let a = node_a.handle();
    let b = node_b.handle();

    let stop = Arc::new(AtomicBool::new(false));
    let drivers = vec![
        spawn_driver(node_a, Arc::clone(&stop), tick_ms),
        spawn_driver(node_b, Arc::clone(&stop), tick_ms),
    ];

    info!("sending {count} messages from node 0001 to node 0002");
    let mut delivered = 0u32;
    for i in 0..count {
        let message = format!("message {i}");
        match a.send(Packet::data(NodeAddress::from_u16(2), message.as_bytes())) {
            Ok(()) => {
                delivered += 1;
                if let Some(packet) = b.recv() {
                    let text = String::from_utf8_lossy(&packet.payload);
                    info!(
                        "delivered #{} (counter {}): {}",
                        i,
                        packet.counter,
                        text.trim_end_matches('\0')
                    );
                }
            }
            Err(err) => warn!("message #{i} failed: {err}"),
        }
    }

    info!("{delivered}/{count} messages acknowledged");
    print_stats(&a, &b, json)?;

    stop.store(true, Ordering::Relaxed);
    for driver in drivers {
        let _ = driver.join();
    }
    Ok(())
}

fn cmd_timeout_demo(tick_ms: u64, json: bool) -> Result<()> {
    let air = SharedAir::new();
    let node_a = LinkNode::new(air.attach(), LinkConfig::new(NodeAddress::from_u16(1)));
    let node_b = LinkNode::new(air.attach(), LinkConfig::new(NodeAddress::from_u16(2)));
    let a = node_a.handle();
    let b = node_b.handle();

    let stop = Arc::new(AtomicBool::new(false));
    let drivers = vec![
        spawn_driver(node_a, Arc::clone(&stop), tick_ms),
        spawn_driver(node_b, Arc::clone(&stop), tick_ms),
    ];

    info!("air is lossy: expecting an acknowledgment timeout");
    air.set_loss(true);
    match a.send(Packet::data(NodeAddress::from_u16(2), b"into the void")) {
        Err(LinkError::AckTimeout) => info!("send timed out as expected"),
        Err(err) => warn!("unexpected error: {err}"),
        Ok(()) => warn!("unexpected delivery on a lossy channel"),
    }

    info!("air recovered: retrying");
    air.set_loss(false);
    match a.send(Packet::data(NodeAddress::from_u16(2), b"hello again")) {
        Ok(()) => {
            let packet = b.recv();
            info!(
                "retry acknowledged, receiver holds frame: {}",
                packet.is_some()
            );
        }
        Err(err) => warn!("retry failed: {err}"),
    }

    print_stats(&a, &b, json)?;

    stop.store(true, Ordering::Relaxed);
    for driver in drivers {
        let _ = driver.join();
    }
    Ok(())
}
