mod logging;
mod terminal;

use std::fmt;
use std::sync::Arc;

use quiz_core::model::Topic;
use services::{Clock, GeneratorConfig, QuizSessionService, ReplyOutcome, SessionPhase};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use ui::{QuizEvent, UiApp, context::build_app_context, vm::resolve_topic};

use crate::terminal::{Command, parse_command, render_help, render_screen};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTopic { raw: String },
    InvalidServiceUrl { raw: String },
    NoGenerator,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTopic { raw } => write!(f, "invalid --topic value: {raw:?}"),
            ArgsError::InvalidServiceUrl { raw } => {
                write!(f, "invalid --service-url value: {raw:?}")
            }
            ArgsError::NoGenerator => write!(
                f,
                "no quiz generator configured: set QUIZ_SERVICE_URL or QUIZ_AI_API_KEY"
            ),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct TerminalApp {
    initial_topic: Option<Topic>,
    quiz_service: Arc<QuizSessionService>,
}

impl UiApp for TerminalApp {
    fn initial_topic(&self) -> Option<Topic> {
        self.initial_topic.clone()
    }

    fn quiz_service(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.quiz_service)
    }
}

struct Args {
    topic: Option<Topic>,
    service_url: Option<String>,
    log_filter: String,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--topic <topic>] [--service-url <url>] [--log <filter>]");
    eprintln!();
    eprintln!("Generator (one is required):");
    eprintln!("  QUIZ_SERVICE_URL                  quiz service exposing /quiz and /feedback");
    eprintln!("  QUIZ_AI_API_KEY                   OpenAI-compatible chat completions");
    eprintln!("  QUIZ_AI_BASE_URL, QUIZ_AI_MODEL");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_MAX_RETRIES, QUIZ_TIMEOUT_MS, QUIZ_TOTAL_TIMEOUT_MS");
    eprintln!("  QUIZ_LOG (default {}), QUIZ_LOG_DIR", logging::DEFAULT_LOG_FILTER);
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut topic = None;
        let mut service_url = None;
        let mut log_filter = std::env::var("QUIZ_LOG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| logging::DEFAULT_LOG_FILTER.into());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--topic" => {
                    let value = require_value(args, "--topic")?;
                    let parsed = resolve_topic(&value)
                        .map_err(|_| ArgsError::InvalidTopic { raw: value.clone() })?;
                    topic = Some(parsed);
                }
                "--service-url" => {
                    let value = require_value(args, "--service-url")?;
                    if !value.starts_with("http://") && !value.starts_with("https://") {
                        return Err(ArgsError::InvalidServiceUrl { raw: value });
                    }
                    service_url = Some(value);
                }
                "--log" => {
                    log_filter = require_value(args, "--log")?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            topic,
            service_url,
            log_filter,
        })
    }

    /// `--service-url` wins over `QUIZ_SERVICE_URL`; everything else comes from the
    /// environment.
    fn generator_config(&self) -> Option<GeneratorConfig> {
        GeneratorConfig::from_lookup(|key| {
            if key == "QUIZ_SERVICE_URL" {
                if let Some(url) = &self.service_url {
                    return Some(url.clone());
                }
            }
            std::env::var(key).ok()
        })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        print_usage();
        e
    })?;

    let _log_guard = logging::init_tracing(&args.log_filter);

    let Some(config) = args.generator_config() else {
        print_usage();
        return Err(ArgsError::NoGenerator.into());
    };
    let generator = config.build(Clock::default())?;
    let quiz_service =
        Arc::new(QuizSessionService::new(generator).with_total_timeout(config.total_timeout));
    info!(backend = ?config.backend, "quiz generator ready");

    let app: Arc<dyn UiApp> = Arc::new(TerminalApp {
        initial_topic: args.topic,
        quiz_service,
    });
    let context = build_app_context(&app);
    let mut controller = context.controller();

    match context.take_initial_topic() {
        Some(topic) => controller.handle(QuizEvent::SelectTopic(topic)),
        None => println!("{}", render_help()),
    }
    println!("{}", render_screen(controller.session()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let option_count = controller
                    .session()
                    .current_question()
                    .map_or(0, |question| question.options().len());
                match parse_command(&line, option_count) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => println!("{}", render_help()),
                    Ok(Command::Topics) => println!("{}", terminal::render_topics()),
                    Ok(Command::Show) => println!("{}", render_screen(controller.session())),
                    Ok(Command::Start(topic)) => {
                        if controller.session().phase() != SessionPhase::Idle {
                            controller.handle(QuizEvent::StartOver);
                        }
                        controller.handle(QuizEvent::SelectTopic(topic));
                        println!("{}", render_screen(controller.session()));
                    }
                    Ok(Command::Event(event)) => {
                        controller.handle(event);
                        println!("{}", render_screen(controller.session()));
                    }
                    Err(err) => println!("{err}"),
                }
            }
            Some(reply) = controller.next_reply(), if controller.in_flight() > 0 => {
                if controller.apply(reply) == ReplyOutcome::Applied {
                    println!("{}", render_screen(controller.session()));
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
