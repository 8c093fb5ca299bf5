use imgstitch::{StitchDirection, StitchSettings, Stitcher};
use log::*;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Clone)]
#[structopt(name = "imgstitch", about = "Stitches overlapping images into one")]
struct Opt {
    /// Where the cropped result is written.
    ///
    /// The format is chosen from the extension.
    #[structopt(short, long, default_value = "stitchedOutputProcessed.png")]
    output: PathBuf,
    /// Where the uncropped canvas of the last pair is written.
    #[structopt(short, long, default_value = "stcOutput.png")]
    canvas: PathBuf,
    /// The file where settings are specified.
    ///
    /// This is in the format of `imgstitch::StitchSettings`. Missing fields take their defaults.
    #[structopt(short, long, default_value = "imgstitch-settings.json")]
    settings: PathBuf,
    /// Where each image sits relative to the previous ones: horizontal or vertical
    #[structopt(short, long)]
    direction: Option<StitchDirection>,
    /// The RANSAC seed
    #[structopt(long)]
    seed: Option<u64>,
    /// List of image files, in stitching order
    #[structopt(parse(from_os_str))]
    images: Vec<PathBuf>,
}

fn load_settings(opt: &Opt) -> StitchSettings {
    let settings = std::fs::File::open(&opt.settings)
        .ok()
        .and_then(|file| serde_json::from_reader(file).ok());
    if settings.is_some() {
        info!("loaded settings from {}", opt.settings.display());
    } else {
        info!("used default settings");
    }
    let mut settings: StitchSettings = settings.unwrap_or_default();
    if let Some(direction) = opt.direction {
        settings.direction = direction;
    }
    if let Some(seed) = opt.seed {
        settings.seed = seed;
    }
    debug!("settings: {:?}", settings);
    settings
}

fn run(opt: &Opt) -> imgstitch::Result<()> {
    let stitcher = Stitcher::new(load_settings(opt));
    let panorama = stitcher.stitch_files(&opt.images)?;

    info!("saving the canvas to {}", opt.canvas.display());
    panorama.canvas.save(&opt.canvas)?;
    info!("saving the stitched image to {}", opt.output.display());
    panorama.stitched.save(&opt.output)?;
    Ok(())
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();

    if let Err(e) = run(&opt) {
        error!("stitching failed: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
