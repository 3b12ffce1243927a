use std::{env, error::Error, path::Path, process};

use burn::{backend::{ndarray::NdArrayDevice, NdArray}, config::Config};
use digit_canvas::{data::CanvasImage, inference::WeightsSource, panel::Panel, session::{Session, SessionConfig}};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

type MyBackend = NdArray<f32>;

const CONFIG_FILE: &str = "digit_canvas.json";
const USAGE: &str = "usage:
    digit_canvas predict <weights.safetensors> <canvas.png>...
    digit_canvas demo <weights.safetensors>";

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args: Vec<String> = env::args().collect();
    let config = load_config();
    let device = NdArrayDevice::Cpu;

    let result = match args.get(1).map(String::as_str) {
        Some("predict") if args.len() >= 4 => predict(&config, device, &args[2], &args[3..]),
        Some("demo") if args.len() == 3 => demo(&config, device, &args[2]),
        _ => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    if let Err(err) = result {
        error!("{err}");
        process::exit(1);
    }
}

fn load_config() -> SessionConfig {
    if !Path::new(CONFIG_FILE).exists() {
        return SessionConfig::new();
    }

    match SessionConfig::load(CONFIG_FILE) {
        Ok(config) => {
            info!("using settings from {CONFIG_FILE}");
            config
        }
        Err(err) => {
            error!("ignoring {CONFIG_FILE}: {err:?}");
            SessionConfig::new()
        }
    }
}

fn render(session: &Session<MyBackend>) -> Result<(), Box<dyn Error>> {
    let view = session.view()?;
    println!("{}", Panel::new(session.status(), &view));
    Ok(())
}

/// Uploads the weights, then shows the panel for each canvas image in turn.
fn predict(config: &SessionConfig, device: NdArrayDevice, weights: &str, canvases: &[String]) -> Result<(), Box<dyn Error>> {
    let mut session = Session::<MyBackend>::new(config, device);
    if let Err(err) = session.upload(WeightsSource::from(Path::new(weights))) {
        render(&session)?;
        return Err(err.into());
    }

    for path in canvases {
        session.replace_canvas(CanvasImage::open(path)?);
        println!("== {path}");
        render(&session)?;
    }

    Ok(())
}

/// Draws a "7" stroke by stroke, then clears the canvas again.
fn demo(config: &SessionConfig, device: NdArrayDevice, weights: &str) -> Result<(), Box<dyn Error>> {
    let mut session = Session::<MyBackend>::new(config, device);
    session.upload(WeightsSource::from(Path::new(weights)))?;
    render(&session)?;

    session.draw(&[(60.0, 55.0), (215.0, 55.0)]);
    session.draw(&[(215.0, 55.0), (170.0, 145.0), (125.0, 235.0)]);
    render(&session)?;

    session.clear();
    render(&session)
}
