use clap::{Arg, ArgAction, Command as ClapCommand};
use log::{error, LevelFilter};
use std::process;

use wsi_redactor::commands::{CommandFactory, RasterkitCommandFactory};
use wsi_redactor::utils::logger::Logger;

fn main() {
    let matches = ClapCommand::new("wsi-redact")
        .version("1.0")
        .author("Maurice Schilpp")
        .about("Redact annotated regions out of a pyramidal whole-slide TIFF/BigTIFF")
        .arg(
            Arg::new("source")
                .help("Source TIFF/BigTIFF file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .help("Output path for the redacted BigTIFF (default: <source>_redacted.tiff)")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("annotation")
                .short('a')
                .long("annotation")
                .help("Girder-style annotation JSON describing polygons to redact")
                .value_name("FILE")
                .required(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let log_file = "rasterkit.log";
    let logger = match Logger::new(log_file) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error initializing logger: {}", e);
            process::exit(1);
        }
    };

    let level = if matches.get_flag("verbose") { LevelFilter::Debug } else { LevelFilter::Info };
    if let Err(e) = Logger::init_global_logger("rasterkit-global.log", level) {
        eprintln!("Error setting up global logger: {}", e);
        process::exit(1);
    }

    let factory = RasterkitCommandFactory::new();

    let command_result = factory.create_command(&matches, &logger);
    match command_result {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
