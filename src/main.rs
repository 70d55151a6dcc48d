use clap::{Arg, Command};
use log::LevelFilter;
use phishguard::{build_router, AnalysisEngine, AppState, ReferenceLists};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let matches = Command::new("phishguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Phishing risk-scoring engine with an HTTP analysis API")
        .arg(
            Arg::new("listen")
                .short('l')
                .long("listen")
                .value_name("ADDR")
                .help("Address to serve the analysis API on")
                .default_value("127.0.0.1:8094"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Reference-list configuration file (YAML)"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write the built-in reference lists as YAML and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-email")
                .long("test-email")
                .value_name("FILE")
                .help("Analyze an email file, print the result as JSON, and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("share-body")
                .long("share-body")
                .help("Include body-derived evidence in --test-email output")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(path) = matches.get_one::<String>("generate-config") {
        let lists = ReferenceLists::default();
        match lists.to_file(path) {
            Ok(()) => {
                println!("Reference lists written to: {path}");
                return;
            }
            Err(e) => {
                eprintln!("Error writing reference lists: {e}");
                process::exit(1);
            }
        }
    }

    let lists = match matches.get_one::<String>("config") {
        Some(path) => match ReferenceLists::from_file(path) {
            Ok(lists) => {
                log::info!("Loaded reference lists from {path}");
                lists
            }
            Err(e) => {
                eprintln!("Error loading reference lists from {path}: {e}");
                process::exit(1);
            }
        },
        None => ReferenceLists::default(),
    };

    let engine = Arc::new(AnalysisEngine::new(Arc::new(lists)));

    if let Some(email_file) = matches.get_one::<String>("test-email") {
        let share_body = matches.get_flag("share-body");
        test_email_file(&engine, email_file, share_body).await;
        return;
    }

    let listen = matches.get_one::<String>("listen").unwrap();
    let app = build_router(AppState::new(engine));

    let listener = match tokio::net::TcpListener::bind(listen).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {listen}: {e}");
            process::exit(1);
        }
    };
    log::info!("phishguard v{} listening on http://{listen}", env!("CARGO_PKG_VERSION"));
    log::info!("Analysis endpoint: POST http://{listen}/analyze");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {e}");
        process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
    }
    log::info!("Shutting down");
}

async fn test_email_file(engine: &AnalysisEngine, path: &str, share_body: bool) {
    let email_text = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading email file {path}: {e}");
            process::exit(1);
        }
    };

    match engine.analyze(&email_text, share_body).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result).unwrap());
        }
        Err(e) => {
            eprintln!("Analysis failed: {e}");
            process::exit(1);
        }
    }
}
