pub mod markdown;
pub mod shell;

use iced::widget::{button, column, container, row, scrollable, slider, text, text_input};
use iced::{Color, Command, Element, Length, Theme};
use redscribe_core::{
    ContentFetcher, FetchedContent, GeneratedPost, PostSynthesizer, UiSettings,
};
use std::sync::Arc;
use tracing::debug;

pub use markdown::Block;
pub use shell::{RunFailure, RunStatus, Shell, Stage, VALIDATION_MESSAGE};

const ERROR_COLOR: Color = Color {
    r: 0.8,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};
const REDDIT_CONTENT_HEIGHT: f32 = 200.0;

/// Everything the window needs from `main`.
pub struct Flags {
    pub fetcher: Arc<dyn ContentFetcher>,
    pub synthesizer: Arc<dyn PostSynthesizer>,
    pub ui: UiSettings,
    /// Shown in the API key label, e.g. "OpenAI".
    pub provider: String,
}

#[derive(Debug, Clone)]
pub enum Message {
    ApiKeyChanged(String),
    KeywordChanged(String),
    ChannelChanged(String),
    LimitChanged(u8),
    GeneratePressed,
    Fetched(Result<FetchedContent, RunFailure>),
    Generated(Result<GeneratedPost, RunFailure>),
}

pub struct App {
    shell: Shell,
    fetcher: Arc<dyn ContentFetcher>,
    synthesizer: Arc<dyn PostSynthesizer>,
    provider: String,
    post_blocks: Vec<Block>,
}

impl App {
    pub fn new(flags: Flags) -> Self {
        Self {
            shell: Shell::new(&flags.ui),
            fetcher: flags.fetcher,
            synthesizer: flags.synthesizer,
            provider: flags.provider,
            post_blocks: Vec::new(),
        }
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn post_blocks(&self) -> &[Block] {
        &self.post_blocks
    }

    pub fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::ApiKeyChanged(value) => {
                self.shell.api_key = value;
                Command::none()
            }
            Message::KeywordChanged(value) => {
                self.shell.keyword = value;
                Command::none()
            }
            Message::ChannelChanged(value) => {
                self.shell.channel = value;
                Command::none()
            }
            Message::LimitChanged(value) => {
                self.shell.set_limit(u32::from(value));
                Command::none()
            }
            Message::GeneratePressed => match self.shell.trigger() {
                Some(query) => {
                    self.post_blocks.clear();
                    Command::perform(
                        shell::fetch_stage(self.fetcher.clone(), query),
                        Message::Fetched,
                    )
                }
                None => Command::none(),
            },
            Message::Fetched(result) => match self.shell.on_fetched(result) {
                Some(request) => Command::perform(
                    shell::generate_stage(self.synthesizer.clone(), request),
                    Message::Generated,
                ),
                None => Command::none(),
            },
            Message::Generated(result) => {
                self.shell.on_generated(result);
                if let Some(post) = self.shell.generated_post() {
                    self.post_blocks = markdown::parse_blocks(post.as_str());
                    debug!("Rendered post into {} blocks", self.post_blocks.len());
                }
                Command::none()
            }
        }
    }

    pub fn view(&self) -> Element<Message, Theme> {
        let title = text("Reddit-based Blog Post Generator").size(28);

        let api_key = column![
            text(format!("Enter your {} API key:", self.provider)).size(14),
            text_input("API key", &self.shell.api_key)
                .on_input(Message::ApiKeyChanged)
                .secure(true)
                .padding(8),
        ]
        .spacing(5);

        let keyword = column![
            text("Enter a keyword to search on Reddit:").size(14),
            text_input("e.g. sourdough", &self.shell.keyword)
                .on_input(Message::KeywordChanged)
                .padding(8),
        ]
        .spacing(5);

        let channel = column![
            text("Enter a subreddit to search in (leave empty for all of Reddit):").size(14),
            text_input("e.g. Baking", &self.shell.channel)
                .on_input(Message::ChannelChanged)
                .padding(8),
        ]
        .spacing(5);

        let max_limit = u8::try_from(self.shell.max_limit()).unwrap_or(u8::MAX);
        let current_limit = u8::try_from(self.shell.limit()).unwrap_or(max_limit);
        let limit = column![
            text(format!(
                "Number of Reddit posts to fetch: {}",
                self.shell.limit()
            ))
            .size(14),
            slider(1..=max_limit, current_limit, Message::LimitChanged),
        ]
        .spacing(5);

        let mut generate = button(text("Generate Blog Post")).padding(10);
        if !self.shell.is_busy() {
            generate = generate.on_press(Message::GeneratePressed);
        }

        let mut status = column![].spacing(5);
        if let Some(line) = self.shell.status_line() {
            status = status.push(text(line).size(14));
        }
        if let Some(message) = self.shell.validation_error() {
            status = status.push(text(message).size(14).style(ERROR_COLOR));
        }
        if let Some(failure) = self.shell.failure() {
            status = status.push(text(failure.to_string()).size(14).style(ERROR_COLOR));
        }

        let mut outputs = column![].spacing(15);
        if let Some(combined) = self.shell.combined_text() {
            outputs = outputs.push(
                column![
                    text("Most Relevant Text from Reddit:").size(20),
                    container(scrollable(text(combined).size(14)))
                        .height(Length::Fixed(REDDIT_CONTENT_HEIGHT))
                        .width(Length::Fill)
                        .padding(8),
                ]
                .spacing(8),
            );
        }
        if self.shell.generated_post().is_some() {
            outputs = outputs.push(
                column![
                    text("Generated Blog Post:").size(20),
                    markdown::view(&self.post_blocks),
                ]
                .spacing(8),
            );
        }

        let form = column![
            title,
            api_key,
            keyword,
            channel,
            limit,
            row![generate],
            status,
            outputs
        ]
        .spacing(20)
        .max_width(900);

        container(scrollable(container(form).padding(20).width(Length::Fill)))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}
