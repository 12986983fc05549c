use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use stagehand_core::test_harness::{certify, settle};
use stagehand_core::{AgentRole, ChatMessage, Orchestrator, OrchestratorConfig};
use stagehand_kernel::{drive, ManualClock, TokioClock};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Navigation presses allowed in one `play --auto` session
const MAX_AUTO_PRESSES: usize = 64;

fn cli() -> Command {
    Command::new("stagehand")
        .version(stagehand_core::VERSION)
        .about("Scripted migration walkthrough orchestrator")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to a TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("play")
                .about("Play the walkthrough in real time")
                .arg(
                    Arg::new("speed")
                        .long("speed")
                        .default_value("1.0")
                        .value_parser(value_parser!(f64))
                        .help("Playback speed multiplier"),
                )
                .arg(
                    Arg::new("auto")
                        .long("auto")
                        .action(ArgAction::SetTrue)
                        .help("Press the first navigation button whenever the scene comes to rest"),
                ),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Enter a scene, let it come to rest and print the state")
                .arg(Arg::new("scene").long("scene").required(true).help("Scene id"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("scenes").about("List scenes and transitions"))
        .subcommand(
            Command::new("certify")
                .about("Explore the scene graph and run seeded simulations")
                .arg(
                    Arg::new("seeds")
                        .long("seeds")
                        .default_value("10")
                        .value_parser(value_parser!(u64))
                        .help("Number of seeds to simulate"),
                )
                .arg(
                    Arg::new("steps")
                        .long("steps")
                        .default_value("500")
                        .value_parser(value_parser!(usize))
                        .help("Operations per simulation"),
                ),
        )
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,stagehand_core=info,stagehand_kernel=info"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<OrchestratorConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => OrchestratorConfig::load(path).with_context(|| format!("loading {path}")),
        None => Ok(OrchestratorConfig::default()),
    }
}

fn print_message(message: &ChatMessage) {
    let who = match message.role {
        AgentRole::User => "You",
        _ => message.agent_name.as_deref().unwrap_or("Agent"),
    };
    println!("[{:>7}ms] {who}: {}", message.timestamp, message.content);
    for button in &message.actions {
        println!("            [{}] ({})", button.label, button.action_id);
    }
}

async fn play(config: OrchestratorConfig, speed: f64, auto: bool) -> Result<()> {
    if speed <= 0.0 {
        bail!("--speed must be positive");
    }
    let clock = TokioClock::with_speed(speed);
    let mut orchestrator = Orchestrator::with_script(config, Arc::new(clock))?;
    let mut printed = 0;

    for _ in 0..MAX_AUTO_PRESSES {
        drive(&mut orchestrator, &clock, None, |o| {
            for message in &o.store().messages()[printed..] {
                print_message(message);
            }
            printed = o.store().messages().len();
        })
        .await;

        if !auto {
            break;
        }
        let next = orchestrator
            .store()
            .messages()
            .iter()
            .rev()
            .find(|message| !message.actions.is_empty())
            .and_then(|message| message.actions.iter().find(|b| b.next_state.is_some()))
            .map(|button| (button.label.clone(), button.action_id.clone()));
        let Some((label, action_id)) = next else {
            break;
        };
        println!("> {label}");
        orchestrator.dispatch_action(&action_id, None);
    }

    let snapshot = orchestrator.snapshot();
    println!(
        "\nRested in {} at {}% ({})",
        snapshot.scene_id.as_ref().map_or("-", |id| id.as_str()),
        snapshot.mission.progress,
        snapshot.mission.phase
    );
    Ok(())
}

fn snapshot(config: OrchestratorConfig, scene: &str, json: bool) -> Result<()> {
    let clock = ManualClock::new();
    let mut orchestrator = Orchestrator::with_script(config, Arc::new(clock.clone()))?;
    settle(&mut orchestrator, &clock);
    orchestrator.advance_to_scene(scene)?;
    settle(&mut orchestrator, &clock);

    let snapshot = orchestrator.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Scene: {}", snapshot.scene_id.as_ref().map_or("-", |id| id.as_str()));
    println!(
        "Mission: {} | {}% | parity {} | confirmations {} | jobs {}",
        snapshot.mission.phase,
        snapshot.mission.progress,
        snapshot.mission.parity,
        snapshot.mission.needs_confirmation,
        snapshot.mission.jobs_running
    );
    if let Some(canvas) = &snapshot.canvas {
        println!("Canvas: {} ({})", canvas.title, canvas.type_tag());
    }
    if let Some(task) = &snapshot.task {
        println!("Task: {} [{}]", task.title, task.status);
        for step in &task.steps {
            println!("  {:?} {}", step.status, step.text);
        }
    }
    println!();
    for message in &snapshot.messages {
        print_message(message);
    }
    Ok(())
}

fn scenes(config: &OrchestratorConfig) -> Result<()> {
    let registry = stagehand_core::canonical_registry()?;
    let edges = registry.edges();
    for id in registry.ids() {
        let marker = if *id == config.start_scene { "*" } else { " " };
        println!("{marker} {id}");
        for edge in edges.iter().filter(|edge| edge.from == *id) {
            match &edge.via {
                Some(action) => println!("    --{action}--> {}", edge.to),
                None => println!("    --auto--> {}", edge.to),
            }
        }
    }
    for (action, scene) in &config.action_routes {
        println!("  route {action} -> {scene}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("play", args)) => {
            let speed = args.get_one::<f64>("speed").copied().unwrap_or(1.0);
            play(config, speed, args.get_flag("auto")).await
        }
        Some(("snapshot", args)) => {
            let Some(scene) = args.get_one::<String>("scene") else {
                bail!("--scene is required");
            };
            snapshot(config, scene, args.get_flag("json"))
        }
        Some(("scenes", _)) => scenes(&config),
        Some(("certify", args)) => {
            let seeds = args.get_one::<u64>("seeds").copied().unwrap_or(10);
            let steps = args.get_one::<usize>("steps").copied().unwrap_or(500);

            println!("Certifying walkthrough...");
            println!("Seeds: {seeds}");
            println!("Steps: {steps}");
            println!();

            let report = certify(0..seeds, steps);
            println!("{}", report.generate_text());
            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        _ => Ok(()),
    }
}
