mod app;
mod assistant;
mod dispatch;
mod event;
mod logging;
mod search;
mod settings;
mod theme;
mod ticker;
mod ui;

use app::VurtixApp;
use assistant::AssistantClient;
use dispatch::TemplateDispatcher;
use eframe::egui;
use settings::Settings;
use std::sync::{mpsc, Arc};
use ticker::ProgressTicker;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = settings::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // Held for the whole run so buffered log lines are flushed on exit.
    let _log_guard = match logging::init(&data_dir) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("file logging disabled: {err}");
            None
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "Vurtix starting");

    let settings = Settings::load(&data_dir);
    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("vurtix-runtime")
        .build()?;

    let dispatcher = Arc::new(TemplateDispatcher::new(settings.deep_think_delay()));
    info!(
        categories = dispatcher.categories().len(),
        think_delay_ms = dispatcher.think_delay().as_millis() as u64,
        "template dispatcher ready"
    );
    let assistant = AssistantClient::new(runtime.handle().clone(), tx, dispatcher);

    let ticker = ProgressTicker::new(runtime.handle().clone(), settings.learning_interval());
    if settings.auto_learn {
        ticker.start();
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Vurtix AI Assistant")
            .with_inner_size([settings.window_w, settings.window_h])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    let app = VurtixApp::new(rx, assistant, ticker, settings, data_dir);
    let _runtime = runtime;

    eframe::run_native(
        "Vurtix",
        native_options,
        Box::new(move |creation_context| {
            app.theme().apply_visuals(&creation_context.egui_ctx);
            Ok(Box::new(app))
        }),
    )?;

    info!("Vurtix stopped");
    Ok(())
}
