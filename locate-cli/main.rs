use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use locate_cli::{
    init_thread_pool, load_rgb, ImageFilePresenter, LocateError, LocateOutcome, Locator, LocatorConfig, Presentation,
    Presenter, Stage,
};

/// Exit status for usage and input failures (-1 as a process byte)
const FAILURE: u8 = 255;

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Find an object image inside a scene image and outline it")]
#[command(version)]
struct Cli {
    /// Scene image to search in
    scene: PathBuf,

    /// Object image to look for
    object: PathBuf,

    /// Where to write the side-by-side result
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Wait for Enter before exiting
    #[arg(long)]
    wait: bool,

    /// TOML or JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// FAST intensity threshold
    #[arg(long)]
    threshold: Option<u8>,

    /// Sort matches by distance before the match cap
    #[arg(long)]
    rank_matches: bool,

    /// Continue with a singular or ill-conditioned homography
    #[arg(long)]
    allow_degenerate: bool,

    /// Worker threads (defaults to the CPU count)
    #[arg(long)]
    threads: Option<usize>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn to_config(&self) -> Result<LocatorConfig, LocateError> {
        let mut cfg = match &self.config {
            Some(path) => LocatorConfig::from_file(path)?,
            None => LocatorConfig::default(),
        };
        if let Some(threshold) = self.threshold {
            cfg.detector.threshold = threshold;
        }
        if self.rank_matches {
            cfg.matching.rank_before_cap = true;
        }
        if self.allow_degenerate {
            cfg.geometry.reject_degenerate = false;
        }
        if let Some(output) = &self.output {
            cfg.presentation.output = output.clone();
        }
        if self.wait {
            cfg.presentation.wait = true;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).try_init();
}

fn status(tag: &str, message: &str) {
    println!("[{}] \t {}", tag, message);
}

fn run(cli: &Cli) -> Result<(), LocateError> {
    let config = cli.to_config()?;
    log::debug!("{}", config.detector.summary());
    init_thread_pool(cli.threads.unwrap_or_else(locate_cli::locate_core::default_threads))?;

    let (mut scene, mut object) = match (load_rgb(&cli.scene), load_rgb(&cli.object)) {
        (Ok(scene), Ok(object)) => (scene, object),
        (Err(e), _) | (_, Err(e)) => {
            status("ERROR", "one or more provided images are broken");
            return Err(e);
        }
    };
    status("OK", "load images");

    let locator = Locator::from_config(config)?;
    let outcome = locator.locate_with_progress(&mut object, &mut scene, |stage| match stage {
        Stage::MatchesFound(n) => status("OK", &format!("matches found <{}>", n)),
        Stage::HomographyFound => status("OK", "homography found"),
        Stage::PerspectiveTransformed => status("OK", "perspective transformation"),
    })?;

    let located = match outcome {
        LocateOutcome::NotEnoughMatches { .. } => {
            status("WARN", "not enough matches found. exit here!");
            return Ok(());
        }
        LocateOutcome::Located { result, .. } => result,
    };
    if located.localization.degenerate {
        status("WARN", "homography is degenerate, outline may be meaningless");
    }

    let mut presenter = ImageFilePresenter::new(locator.config().presentation.clone());
    presenter
        .present(&Presentation {
            object: &object,
            scene: &scene,
            object_keypoints: &located.object_keypoints,
            scene_keypoints: &located.scene_keypoints,
            good_matches: &located.good_matches,
            scene_corners: &located.localization.scene_corners,
        })
        .map_err(LocateError::Present)?;
    status("OK", "show results");
    presenter.wait().map_err(LocateError::Present)?;
    status("OK", "terminate");
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { FAILURE } else { 0 };
            let _ = e.print();
            if code != 0 {
                println!("usage: locate <SCENE> <OBJECT>");
            }
            return ExitCode::from(code);
        }
    };
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{:?}", e);
            status("ERROR", &e.to_string());
            ExitCode::from(FAILURE)
        }
    }
}
