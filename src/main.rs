use clap::Parser;
use cuesyncrs::{
    create_controller, logging, resolve_config, ui, Args, ConsoleSink, PlayOptions,
};
use simplelog::LevelFilter;
use std::sync::Arc;
use std::{thread, time::Duration};

fn main() {
    let args = parse_command_line_arguments();
    initialize_logging(args.verbose);

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => exit_with_error(&format!("Error loading configuration: {}", e)),
    };

    let controller = create_controller(config, Arc::new(ConsoleSink::new()));

    if let Err(e) = controller.load_file(&args.file) {
        exit_with_error(&format!("Error loading {}: {}", args.file.display(), e));
    }

    if args.dump {
        if let Some(timeline) = controller.timeline() {
            print!("{}", ui::timeline_report(&timeline));
        }
        return;
    }

    if let Some(seconds) = args.seek {
        if let Err(e) = controller.seek(seconds) {
            exit_with_error(&format!("Error seeking to {}s: {}", seconds, e));
        }
    }

    let options = PlayOptions {
        looping: args.looping,
    };
    if let Err(e) = controller.play(options) {
        exit_with_error(&format!("Error starting playback: {}", e));
    }

    if args.no_progress {
        wait_for_playback(|| controller.is_playing() || controller.is_looping());
    } else {
        ui::run_position_display(&controller);
    }

    controller.stop();
    log::info!("Application exiting");
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn initialize_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = logging::init_logger(level) {
        eprintln!("Logger initialization failed: {}", e);
    }
    log::info!("Application starting");
}

fn wait_for_playback(active: impl Fn() -> bool) {
    log::info!("Playing. Press Ctrl+C to exit...");
    while active() {
        thread::sleep(Duration::from_millis(100));
    }
}

fn exit_with_error(error_msg: &str) -> ! {
    log::error!("{}", error_msg);
    eprintln!("{}", error_msg);
    std::process::exit(1);
}
