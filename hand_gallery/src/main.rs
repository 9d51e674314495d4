//! hand_gallery — interactive entry point.

use hand_gallery::app::{run, AppConfig};

fn main() {
    env_logger::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Hand Gallery — gesture-driven orbital gallery         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "tracker")]
    println!("  Mode: MediaPipe tracker sidecar");
    #[cfg(not(feature = "tracker"))]
    println!("  Mode: Keyboard simulation  (use --features tracker for a camera)");
    println!();

    let cfg = parse_args();
    if let Some(path) = &cfg.manifest_path {
        println!("  Manifest: {}", path.display());
    } else {
        println!("  Demo gallery: {} items (pass --manifest <path> to persist)", cfg.demo_items);
    }
    println!();
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_args() -> AppConfig {
    let mut cfg = AppConfig::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--manifest" => cfg.manifest_path = args.next().map(Into::into),
            "--demo" => {
                cfg.demo_items = args
                    .next()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(cfg.demo_items);
            }
            other => eprintln!("  (ignoring unknown argument {:?})", other),
        }
    }
    cfg
}
