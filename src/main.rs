use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;

use roguelike_sim::content::demo::seed_demo;
use roguelike_sim::content::SqliteResourceRepository;
use roguelike_sim::transport::{Dispatcher, ToUiKind};
use roguelike_sim::{pair, SimConfig, Simulation, ToSim, ToUi};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    println!("Initializing roguelike simulation...");
    let (content_path, config_path) = parse_paths(env::args().collect());

    let config = match config_path {
        Some(path) => match SimConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    if let Some(parent) = content_path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            eprintln!("Failed to create {}: {}", parent.display(), err);
        }
    }
    let mut repo = match SqliteResourceRepository::open(&content_path) {
        Ok(repo) => repo,
        Err(err) => {
            eprintln!(
                "Failed to open content DB at {}: {}",
                content_path.display(),
                err
            );
            std::process::exit(1);
        }
    };
    match repo.count() {
        Ok(0) => match seed_demo(&mut repo) {
            Ok(count) => println!("Empty content DB, seeded {} demo resources.", count),
            Err(err) => eprintln!("Failed to seed demo content: {}", err),
        },
        Ok(count) => println!("Content DB holds {} resources.", count),
        Err(err) => eprintln!("Content stats unavailable: {}", err),
    }

    let mut sim = match Simulation::new(config, Box::new(repo)) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("Failed to build simulation: {}", err);
            std::process::exit(1);
        }
    };
    if let Err(err) = sim.start() {
        eprintln!("Failed to start simulation: {}", err);
        std::process::exit(1);
    }

    let (sim_side, ui_side) = pair();
    let sim_thread = thread::spawn(move || sim.run(sim_side));
    let (outbox, inbox) = ui_side.into_parts();

    let printer = thread::spawn(move || {
        let mut dispatcher = presentation();
        while let Ok(event) = inbox.recv() {
            dispatcher.dispatch(&event);
        }
    });

    print_help();
    let stdin = io::stdin();
    print!("> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_lowercase();
        let event = match cmd.as_str() {
            "" => None,
            "w" | "up" => Some(ToSim::MovePlayer { dx: 0, dy: -1 }),
            "s" | "down" => Some(ToSim::MovePlayer { dx: 0, dy: 1 }),
            "a" | "left" => Some(ToSim::MovePlayer { dx: -1, dy: 0 }),
            "d" | "right" => Some(ToSim::MovePlayer { dx: 1, dy: 0 }),
            "." | "wait" => Some(ToSim::Wait),
            "t" | "turn" => Some(ToSim::AdvanceTurn),
            "p" | "pause" => Some(ToSim::TogglePause),
            "save" | "load" => match parts.next() {
                Some(name) if cmd == "save" => Some(ToSim::Save {
                    name: name.to_string(),
                }),
                Some(name) => Some(ToSim::Load {
                    name: name.to_string(),
                }),
                None => {
                    println!("Usage: {} <name>", cmd);
                    None
                }
            },
            "q" | "quit" | "exit" => break,
            "help" => {
                print_help();
                None
            }
            other => {
                println!("Unknown command: {}", other);
                None
            }
        };
        if let Some(event) = event {
            outbox.send(event);
        }
        print!("> ");
        let _ = io::stdout().flush();
    }

    outbox.send(ToSim::Quit);
    if sim_thread.join().is_err() {
        eprintln!("Simulation thread panicked");
    }
    drop(outbox);
    let _ = printer.join();
    println!("Bye.");
}

/// The presentation side: print what the simulation reports.
fn presentation() -> Dispatcher<ToUi> {
    let mut dispatcher = Dispatcher::new();
    dispatcher.on(ToUiKind::EntityMoved, |event| {
        if let ToUi::EntityMoved { uid, from, to, .. } = event {
            println!("  {} moved {:?} -> {:?}", uid, from, to);
        }
    });
    dispatcher.on(ToUiKind::Collision, |event| {
        if let ToUi::Collision { mover, obstacle } = event {
            println!("  {} bumps into {}", mover, obstacle);
        }
    });
    dispatcher.on(ToUiKind::Damaged, |event| {
        if let ToUi::Damaged {
            uid,
            amount,
            remaining,
        } = event
        {
            println!("  {} takes {} damage ({} left)", uid, amount, remaining);
        }
    });
    dispatcher.on(ToUiKind::Died, |event| {
        if let ToUi::Died { uid } = event {
            println!("  {} dies", uid);
        }
    });
    dispatcher.on(ToUiKind::TickCompleted, |event| {
        if let ToUi::TickCompleted { tick, turn, .. } = event {
            println!("  [turn {} / tick {}]", turn, tick);
        }
    });
    dispatcher.on(ToUiKind::ModeChanged, |event| {
        if let ToUi::ModeChanged { mode } = event {
            println!("  mode: {:?}", mode);
        }
    });
    dispatcher.on(ToUiKind::Saved, |event| {
        if let ToUi::Saved { name } = event {
            println!("  saved {}", name);
        }
    });
    dispatcher.on(ToUiKind::Message, |event| {
        if let ToUi::Message { text } = event {
            println!("  ! {}", text);
        }
    });
    dispatcher
}

fn print_help() {
    println!("Commands: w/a/s/d (move) | . (wait) | t (advance turn) | p (pause/real-time) | save <name> | load <name> | help | quit");
}

fn parse_paths(args: Vec<String>) -> (PathBuf, Option<PathBuf>) {
    let mut iter = args.iter();
    let mut content_path = PathBuf::from("./assets/db/content.db");
    let mut config_path = None;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--db" | "--content" => {
                if let Some(value) = iter.next() {
                    content_path = PathBuf::from(value);
                }
            }
            "--config" => {
                if let Some(value) = iter.next() {
                    config_path = Some(PathBuf::from(value));
                }
            }
            _ => {}
        }
    }
    (content_path, config_path)
}
