use anyhow::{Context, Result};
use dynwm::bar::XftDrw;
use dynwm::window_manager::{WM_NAME, WindowManager};
use dynwm::xconnection::X11rbConnection;
use log::{error, info, warn};
use simplelog::{LevelFilter, WriteLogger};
use std::os::unix::process::CommandExt;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => {}
        Some("-v") if args.len() == 2 => {
            println!("{WM_NAME}-{}", dynwm::VERSION);
            return Ok(());
        }
        Some(_) => {
            eprintln!("usage: {WM_NAME} [-v]");
            std::process::exit(1);
        }
    }

    init_logging()?;

    if unsafe { x11::xlib::XSupportsLocale() } == 0 {
        warn!("no locale support");
    }
    dynwm::spawn::ignore_children().context("failed to set up SIGCHLD handling")?;

    let config = dynwm::config::load().context("failed to load configuration")?;
    let conn = X11rbConnection::connect().context("cannot open display")?;
    let draw = XftDrw::new(&config.font, &config.scheme_normal, &config.scheme_selected)
        .context("cannot set up bar drawing")?;

    let mut wm = WindowManager::new(conn, Box::new(draw), config)
        .context("failed to start the window manager")?;
    let outcome = wm.run();
    if let Err(e) = wm.cleanup() {
        warn!("cleanup failed: {e}");
    }
    drop(wm);

    let restart = match outcome {
        Ok(restart) => restart,
        Err(e) => {
            error!("{e}");
            return Err(e).context("window manager terminated");
        }
    };

    if restart {
        info!("restarting");
        let err = std::process::Command::new(&args[0]).args(&args[1..]).exec();
        return Err(err).context("failed to restart");
    }
    Ok(())
}

/// Logs go to stderr, at the level named by `DYNWM_LOG`.
fn init_logging() -> Result<()> {
    let level = std::env::var("DYNWM_LOG")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    WriteLogger::init(level, simplelog::Config::default(), std::io::stderr())
        .context("failed to initialise logging")
}
