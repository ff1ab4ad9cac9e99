use anyhow::Context;
use gui::{App, Flags};
use iced::{Application, Settings};
use llm_interface::BlogSynthesizer;
use reddit_client::RedditClient;
use redscribe_core::AppConfig;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "redscribe=debug,gui=debug,reddit_client=info,llm_interface=info";

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    tracing::info!("Starting Redscribe - Reddit Blog Post Generator");

    let config = AppConfig::load().context("Failed to load configuration")?;
    tracing::info!(
        "Using {} model {}",
        config.llm.provider,
        config.llm.model_name()
    );

    let flags = Flags {
        fetcher: Arc::new(RedditClient::new(&config.reddit)),
        synthesizer: Arc::new(BlogSynthesizer::new(&config.llm)),
        ui: config.ui.clone(),
        provider: config.llm.provider.to_string(),
    };

    let settings = Settings {
        window: iced::window::Settings {
            size: iced::Size::new(1000.0, 900.0),
            min_size: Some(iced::Size::new(700.0, 600.0)),
            ..Default::default()
        },
        ..Settings::with_flags(flags)
    };

    RedscribeApp::run(settings).map_err(|e| {
        tracing::error!("Application error: {}", e);
        anyhow::anyhow!("GUI error: {e}")
    })
}

struct RedscribeApp {
    app: App,
}

impl Application for RedscribeApp {
    type Message = gui::Message;
    type Theme = iced::Theme;
    type Executor = iced::executor::Default;
    type Flags = Flags;

    fn new(flags: Self::Flags) -> (Self, iced::Command<Self::Message>) {
        tracing::info!("Initializing application");
        (
            Self {
                app: App::new(flags),
            },
            iced::Command::none(),
        )
    }

    fn title(&self) -> String {
        "Redscribe - Reddit Blog Post Generator".to_string()
    }

    fn update(&mut self, message: Self::Message) -> iced::Command<Self::Message> {
        self.app.update(message)
    }

    fn view(&self) -> iced::Element<Self::Message> {
        self.app.view()
    }
}
