use std::fmt;
use std::fmt::Write as _;

use quiz_core::model::Topic;
use quiz_core::scoring::OptionMark;
use services::QuizSession;
use ui::QuizEvent;
use ui::vm::{
    FeedbackVm, QuestionCardVm, QuestionDotVm, ResultsVm, StatusVm, map_question_card,
    map_results, map_status, parse_option_letter, resolve_topic, topic_catalog,
};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Help,
    Topics,
    /// Change topic: resets whatever is running, then selects.
    Start(Topic),
    Event(QuizEvent),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    MissingTopic,
    InvalidQuestionNumber { raw: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(input) => {
                write!(f, "unknown command: {input} (type `help` for commands)")
            }
            CommandError::MissingTopic => write!(f, "start requires a topic name or number"),
            CommandError::InvalidQuestionNumber { raw } => {
                write!(f, "invalid question number: {raw}")
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Parse one input line. A single letter within `option_count` always answers the
/// current question, so options such as N, P or Q win over the one-letter aliases.
pub fn parse_command(line: &str, option_count: usize) -> Result<Command, CommandError> {
    let line = line.trim();
    if let Some(option) = parse_option_letter(line).filter(|option| *option < option_count) {
        return Ok(Command::Event(QuizEvent::AnswerCurrent(option)));
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));

    let command = match word.to_ascii_lowercase().as_str() {
        "" => Command::Show,
        "help" | "?" => Command::Help,
        "topics" => Command::Topics,
        "quit" | "exit" | "q" => Command::Quit,
        "start" => {
            let topic = resolve_topic(rest).map_err(|_| CommandError::MissingTopic)?;
            Command::Start(topic)
        }
        "n" | "next" => Command::Event(QuizEvent::Next),
        "p" | "prev" => Command::Event(QuizEvent::Prev),
        "go" => {
            let index = rest
                .parse::<usize>()
                .ok()
                .and_then(|number| number.checked_sub(1))
                .ok_or_else(|| CommandError::InvalidQuestionNumber {
                    raw: rest.to_string(),
                })?;
            Command::Event(QuizEvent::JumpTo(index))
        }
        "new" => Command::Event(QuizEvent::NewQuestions),
        "reset" => Command::Event(QuizEvent::StartOver),
        "feedback" => Command::Event(QuizEvent::GetFeedback),
        _ => match parse_option_letter(line) {
            Some(option) => Command::Event(QuizEvent::AnswerCurrent(option)),
            None => return Err(CommandError::Unknown(line.to_string())),
        },
    };
    Ok(command)
}

#[must_use]
pub fn render_topics() -> String {
    let mut out = String::from("Choose a topic (`start <name or number>`, any topic works):\n");
    for card in topic_catalog() {
        let _ = writeln!(out, "  {}. {:<14} {}", card.number, card.name, card.description);
    }
    out
}

#[must_use]
pub fn render_help() -> String {
    [
        "Commands:",
        "  topics              list preset topics",
        "  start <topic|#>     start a quiz (changes topic if one is running)",
        "  a, b, c, ...        answer the current question (letters win over n/p/q)",
        "  n / p               next / previous question",
        "  go <#>              jump to a question (see the numbered row)",
        "  new                 new questions on the same topic",
        "  reset               start over",
        "  feedback            AI feedback once the quiz is finished",
        "  <enter>             redraw",
        "  quit                exit",
    ]
    .join("\n")
}

#[must_use]
pub fn render_screen(session: &QuizSession) -> String {
    match map_status(session) {
        StatusVm::ChooseTopic => render_topics(),
        StatusVm::Loading { message } => message,
        StatusVm::Failed { message } => {
            format!("{message}\nType `new` to try again or `reset` to pick another topic.")
        }
        StatusVm::Quiz => map_question_card(session)
            .map(|card| render_card(&card))
            .unwrap_or_default(),
        StatusVm::Results => {
            let mut out = map_question_card(session)
                .map(|card| render_card(&card))
                .unwrap_or_default();
            if let Some(results) = map_results(session) {
                out.push('\n');
                out.push_str(&render_results(&results));
            }
            out
        }
    }
}

fn render_card(card: &QuestionCardVm) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} | {} ({}%) | {}",
        card.topic, card.position_label, card.progress_percent, card.answered_label
    );
    let _ = writeln!(out, "\n{}\n", card.prompt);
    for option in &card.options {
        let marker = match option.mark {
            OptionMark::Unselected | OptionMark::Neutral => "  ",
            OptionMark::Selected => "> ",
            OptionMark::Correct => "+ ",
            OptionMark::Wrong => "x ",
        };
        let _ = writeln!(out, "  {marker}{}) {}", option.letter, option.text);
    }
    if let Some(hint) = card.hint {
        let _ = writeln!(out, "\n{hint}");
    }
    if !card.dots.is_empty() {
        let _ = writeln!(out, "\n{}", render_dots(&card.dots));
    }
    out
}

/// `1* [2] 3`: answered questions carry `*`, the current one is bracketed.
fn render_dots(dots: &[QuestionDotVm]) -> String {
    dots.iter()
        .map(|dot| {
            let label = if dot.answered {
                format!("{}*", dot.number)
            } else {
                dot.number.to_string()
            };
            if dot.current {
                format!("[{label}]")
            } else {
                label
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_results(results: &ResultsVm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  Score: {}", results.title, results.score_label);
    let _ = writeln!(out, "{}", results.message);
    match &results.feedback {
        FeedbackVm::Available => {
            let _ = writeln!(out, "Type `feedback` for AI feedback, `new` or `reset` to play again.");
        }
        FeedbackVm::Loading => {
            let _ = writeln!(out, "Fetching feedback...");
        }
        FeedbackVm::Shown { text, .. } => {
            let _ = writeln!(out, "Feedback: {text}");
        }
    }
    out
}
