use std::env;
use std::net::SocketAddr;

use contracts::{EventType, RunConfig};
use office_api::{serve, EngineApi};
use office_core::world::default_office;

fn print_usage() {
    println!("office-cli <command>");
    println!("commands:");
    println!("  status");
    println!("  run [ticks] [seed]");
    println!("    headless deterministic simulation of the default office");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn parse_u64(value: Option<&String>, label: &str, fallback: u64) -> Result<u64, String> {
    match value {
        None => Ok(fallback),
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| format!("invalid {}: {}", label, raw)),
    }
}

fn print_status() {
    let config = RunConfig::default();
    let bundle = default_office();
    println!(
        "default run_id={} seed={} tick_interval={} max_ticks={}",
        config.run_id, config.seed, config.tick_interval, config.max_ticks
    );
    println!(
        "default office room_id={} grid={}x{} agents={}",
        bundle.room_id,
        bundle.width,
        bundle.height,
        bundle.agents.len()
    );
    for agent in &bundle.agents {
        println!("  {}: {} ({})", agent.agent_id, agent.name, agent.role);
    }
}

fn run_simulation(args: &[String]) -> Result<(), String> {
    let target_tick = parse_u64(args.get(2), "ticks", 3600)?;
    let seed = parse_u64(args.get(3), "seed", 1337)?;

    let mut config = RunConfig::default();
    config.seed = seed;
    config.max_ticks = target_tick.max(1);

    let mut api = EngineApi::from_config(config).map_err(|err| err.to_string())?;
    let _ = api.start();
    let (status, committed) = api.run_to_tick(target_tick);
    let _ = api.pause();

    let count = |event_type: EventType| {
        api.events()
            .iter()
            .filter(|event| event.event_type == event_type)
            .count()
    };
    println!(
        "simulated run_id={} seed={} committed={} tick={}/{}",
        api.run_id(),
        seed,
        committed,
        status.current_tick,
        status.max_ticks
    );
    println!(
        "events: wanders={} conversations={} bubbles={}",
        count(EventType::WanderStarted),
        count(EventType::ConversationEnded),
        count(EventType::SpeechBubbleShown),
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = env::args().collect::<Vec<_>>();
    let command = args.get(1).map(String::as_str);

    let outcome = match command {
        Some("status") => {
            print_status();
            Ok(())
        }
        Some("run") => run_simulation(&args),
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                println!("serving office api on {addr}");
                serve(addr).await.map_err(|err| err.to_string())
            }
            Err(message) => Err(message),
        },
        _ => {
            print_usage();
            Ok(())
        }
    };

    if let Err(message) = outcome {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
