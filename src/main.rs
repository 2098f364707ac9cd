//! CityGrid twin entry point: CLI wiring, scenario loading and reporting.

use std::io;
use std::path::Path;
use std::process;

use chrono::Utc;
use citygrid_twin::city::Toggle;
use citygrid_twin::config::ScenarioConfig;
use citygrid_twin::io::export::{export_city_csv, export_districts_csv};
use citygrid_twin::live::{load_bundle, load_seed, seed_inputs, to_live_inputs};
use citygrid_twin::recommend::compare_line;
use citygrid_twin::session::Session;
use citygrid_twin::sim::HORIZON_HOURS;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    pin: Option<String>,
    hour: Option<usize>,
    live_path: Option<String>,
    seed_path: Option<String>,
    toggles: Vec<Toggle>,
    telemetry_out: Option<String>,
    districts_out: Option<String>,
    brief: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("citygrid-twin — City-scale power grid digital twin");
    eprintln!();
    eprintln!("Usage: citygrid-twin [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario B from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset for B ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --pin <name>             Pin a preset as comparison scenario A (default: baseline)");
    eprintln!("  --hour <0-72>            Hour for the risk feed and recommendations");
    eprintln!("  --toggle <flag>          Flip a scenario B flag (microgrid, dr, heatwave, storm,");
    eprintln!("                           event, critical_priority); repeatable");
    eprintln!("  --live <path>            Substitute live curves from a JSON feed bundle");
    eprintln!("  --live-seed <path>       Substitute curves seeded from one JSON snapshot row");
    eprintln!("  --telemetry-out <path>   Export the city series to CSV");
    eprintln!("  --districts-out <path>   Export per-district series to CSV");
    eprintln!("  --brief                  Print the ops brief");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after simulation");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=debug) for more detailed logs.");
}

/// Returns the value following a flag, exiting if it is missing.
fn flag_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    match args.get(i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {flag} requires a {what} argument");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        pin: None,
        hour: None,
        live_path: None,
        seed_path: None,
        toggles: Vec::new(),
        telemetry_out: None,
        districts_out: None,
        brief: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(flag_value(&args, i, "--scenario", "path"));
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(flag_value(&args, i, "--preset", "name"));
            }
            "--pin" => {
                i += 1;
                cli.pin = Some(flag_value(&args, i, "--pin", "name"));
            }
            "--hour" => {
                i += 1;
                let v = flag_value(&args, i, "--hour", "number");
                match v.parse::<usize>() {
                    Ok(h) if h <= HORIZON_HOURS => cli.hour = Some(h),
                    _ => {
                        eprintln!("error: --hour value \"{v}\" must be an integer in 0..={HORIZON_HOURS}");
                        process::exit(1);
                    }
                }
            }
            "--toggle" => {
                i += 1;
                let v = flag_value(&args, i, "--toggle", "flag");
                match v.parse::<Toggle>() {
                    Ok(t) => cli.toggles.push(t),
                    Err(e) => {
                        eprintln!("error: {e}");
                        process::exit(1);
                    }
                }
            }
            "--live" => {
                i += 1;
                cli.live_path = Some(flag_value(&args, i, "--live", "path"));
            }
            "--live-seed" => {
                i += 1;
                cli.seed_path = Some(flag_value(&args, i, "--live-seed", "path"));
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out = Some(flag_value(&args, i, "--telemetry-out", "path"));
            }
            "--districts-out" => {
                i += 1;
                cli.districts_out = Some(flag_value(&args, i, "--districts-out", "path"));
            }
            "--brief" => {
                cli.brief = true;
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let v = flag_value(&args, i, "--port", "u16");
                if let Ok(p) = v.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{v}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then baseline default
    let scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let mut session = Session::new();
    if let Some(ref name) = cli.pin {
        if let Err(e) = session.apply_preset(name) {
            eprintln!("{e}");
            process::exit(1);
        }
        session.pin_current();
    }
    if cli.scenario_path.is_some() {
        session.load_config(&scenario);
    } else {
        // presets go through the session so labels carry the preset title
        let name = cli.preset.as_deref().unwrap_or("baseline");
        if let Err(e) = session.apply_preset(name) {
            eprintln!("{e}");
            process::exit(1);
        }
    }
    for toggle in &cli.toggles {
        if !session.toggle(*toggle) {
            eprintln!(
                "warning: {toggle} not switched: {}",
                session.budget_warning().unwrap_or("rejected")
            );
        }
    }
    if let Some(hour) = cli.hour {
        session.set_hour(hour);
    }

    if let Some(ref path) = cli.live_path {
        let bundle = match load_bundle(Path::new(path), Utc::now()) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        };
        let synthetic = session.result_b();
        match to_live_inputs(&bundle, &synthetic) {
            Some(inputs) => {
                info!(label = %inputs.label, "live curves applied to scenario B");
                session.set_live(Some(inputs));
            }
            None => eprintln!("warning: live bundle has no forecast, staying synthetic"),
        }
    } else if let Some(ref path) = cli.seed_path {
        match load_seed(Path::new(path), Utc::now()) {
            Ok(Some(seed)) => {
                let synthetic = session.result_b();
                let inputs = seed_inputs(&seed, &synthetic);
                info!(label = %inputs.label, "seeded live curves applied to scenario B");
                session.set_live(Some(inputs));
            }
            Ok(None) => eprintln!("warning: seed snapshot has no usable demand, staying synthetic"),
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    }

    let result_b = session.result_b();
    println!("{result_b}");

    let recs = session.recommendations();
    println!("--- Risk Feed (T+{}h) ---", session.selected_hour());
    for item in &recs.risk_feed {
        println!("{item}");
    }
    println!();
    println!("--- Recommended Actions ---");
    for (rank, action) in recs.actions.iter().enumerate() {
        println!("{}. {action}", rank + 1);
    }
    println!();
    println!("--- Compare vs {} ---", session.pinned().label);
    println!("{}", compare_line(&recs.compare));
    println!(
        "Budget used:           {:.2}M / {:.1}M ({} interventions)",
        session.budget_used(),
        session.params().budget_m,
        session.intervention_count()
    );
    println!("ROI score:             {:.1}", session.roi_score());

    if cli.brief {
        println!();
        println!("{}", session.ops_brief());
    }

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_city_csv(&result_b, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("City series written to {path}");
    }
    if let Some(ref path) = cli.districts_out {
        if let Err(e) = export_districts_csv(&result_b, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("District series written to {path}");
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(citygrid_twin::api::AppState::from_session(&mut session));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(citygrid_twin::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
