use clap::Parser;

use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use suite2coco::{convert, read_export, write_coco, Args};

fn run(args: &Args) -> suite2coco::Result<()> {
    let export_dir = PathBuf::from(&args.export_dir);
    let export = read_export(&export_dir)?;
    let dataset = convert(&export.project, &export.source, &args.to_convert_config())?;
    write_coco(&args.output_path(), &dataset, args.pretty)
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let dirname = PathBuf::from(&args.export_dir);
    if !dirname.exists() {
        error!("The specified export_dir does not exist: {}", args.export_dir);
        return ExitCode::FAILURE;
    }

    info!("Starting Suite to COCO conversion process...");

    match run(&args) {
        Ok(()) => {
            info!("COCO conversion process completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to convert export: {}", e);
            ExitCode::FAILURE
        }
    }
}
