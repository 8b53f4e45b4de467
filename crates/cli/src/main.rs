mod settings;

use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossbeam_channel::{select, Receiver};

use faceguard_kiosk_core::capture::infrastructure::image_file_frame_source::ImageFileFrameSource;
use faceguard_kiosk_core::capture::infrastructure::shared_frame_source::SharedFrameSource;
use faceguard_kiosk_core::pipeline::poll_logger::{NullPollLogger, PollLogger, StatsPollLogger};
use faceguard_kiosk_core::presentation::kiosk::Kiosk;
use faceguard_kiosk_core::presentation::kiosk_state::{Overlay, OverlayTone, Tab};
use faceguard_kiosk_core::recognition::infrastructure::http_recognition_client::HttpRecognitionClient;

use settings::Settings;

/// How often the terminal view re-reads the kiosk state.
const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Face enrollment and live recognition against a recognition backend.
#[derive(Parser)]
#[command(name = "faceguard-kiosk")]
struct Cli {
    /// Base URL of the recognition backend.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Store --server and --timeout-secs in the settings file.
    #[arg(long, global = true)]
    save_settings: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture one frame and enroll it under an identity.
    Enroll {
        /// Identity to enroll the face under.
        #[arg(long)]
        id: String,

        /// Image file or directory of images acting as the camera.
        #[arg(long)]
        source: PathBuf,
    },
    /// Identify faces continuously and print the overlay whenever it changes.
    Recognize {
        /// Image file or directory of images acting as the camera.
        #[arg(long)]
        source: PathBuf,

        /// Milliseconds between recognition ticks.
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Stop after this many seconds (default: run until Enter is pressed).
        #[arg(long)]
        duration_secs: Option<u64>,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = Settings::load();
    if let Some(server) = cli.server {
        settings.server_url = server;
    }
    if let Some(timeout) = cli.timeout_secs {
        settings.timeout_secs = timeout;
    }
    if cli.save_settings {
        let path = settings.save()?;
        log::info!("Settings written to {}", path.display());
    }

    match cli.command {
        Command::Enroll { id, source } => run_enroll(&settings, id, source),
        Command::Recognize {
            source,
            interval_ms,
            duration_secs,
        } => {
            if let Some(interval) = interval_ms {
                settings.poll_interval_ms = interval;
            }
            run_recognize(&settings, source, duration_secs.map(Duration::from_secs))
        }
    }
}

fn build_kiosk(
    settings: &Settings,
    source: PathBuf,
    logger: Arc<dyn PollLogger>,
) -> Result<Kiosk, Box<dyn std::error::Error>> {
    if !source.exists() {
        return Err(format!("camera source not found: {}", source.display()).into());
    }
    let client = HttpRecognitionClient::new(&settings.client_config())?;
    log::info!(
        "Enrolling via {} and identifying via {}",
        client.enroll_url(),
        client.identify_url()
    );
    Ok(Kiosk::new(
        SharedFrameSource::new(Box::new(ImageFileFrameSource::new(source))),
        Arc::new(client),
        logger,
        settings.kiosk_config(),
    ))
}

fn run_enroll(
    settings: &Settings,
    id: String,
    source: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kiosk = build_kiosk(settings, source, Arc::new(NullPollLogger))?;
    kiosk.select_tab(Tab::Enroll);
    kiosk.set_identity_input(id);

    kiosk.begin_enrollment();
    while !kiosk.wait_for_enrollment(Duration::from_secs(settings.timeout_secs.max(1))) {
        log::debug!("Still waiting for the enrollment response");
    }

    let state = kiosk.state();
    if let Some(error) = &state.enrollment_error {
        return Err(error.clone().into());
    }
    if let Some(message) = &state.enrollment_message {
        println!("{message}");
    }
    Ok(())
}

fn run_recognize(
    settings: &Settings,
    source: PathBuf,
    duration: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kiosk = build_kiosk(settings, source, Arc::new(StatsPollLogger::new()))?;
    kiosk.select_tab(Tab::Recognize);

    // The sender stays alive here so a closed stdin never reads as Enter.
    let (_enter_tx, enter_rx) = enter_signal();
    let deadline = match duration {
        Some(d) => crossbeam_channel::after(d),
        None => crossbeam_channel::never(),
    };
    let refresh = crossbeam_channel::tick(REFRESH_INTERVAL);

    eprintln!(
        "{}: every {} ms, press Enter to stop.",
        kiosk.state().active_tab.label(),
        settings.poll_interval_ms
    );
    kiosk.toggle_recognition();

    let mut shown: Option<Overlay> = None;
    loop {
        select! {
            recv(enter_rx) -> _ => break,
            recv(deadline) -> _ => break,
            recv(refresh) -> _ => {
                kiosk.refresh();
                let overlay = kiosk.overlay();
                if overlay != shown {
                    if let Some(overlay) = &overlay {
                        println!("{}", render_overlay(overlay));
                    }
                    shown = overlay;
                }
            }
        }
    }

    kiosk.toggle_recognition();
    Ok(())
}

/// Fires once when a line is read from stdin.
fn enter_signal() -> (crossbeam_channel::Sender<()>, Receiver<()>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let reader_tx = tx.clone();
    thread::spawn(move || {
        let mut line = String::new();
        if matches!(io::stdin().read_line(&mut line), Ok(n) if n > 0) {
            let _ = reader_tx.send(());
        }
    });
    (tx, rx)
}

fn render_overlay(overlay: &Overlay) -> String {
    let marker = match overlay.tone {
        OverlayTone::Positive => '+',
        OverlayTone::Negative => '-',
    };
    format!("[{marker}] {}", overlay.message)
}
