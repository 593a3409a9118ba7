use std::{env, path::PathBuf, time::Instant};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use quizify::{
    app_state::AppState,
    config::Config,
    errors::{AppError, AppResult},
    models::{
        domain::{profile::XP_PER_LEVEL, ReviewStatus},
        dto::request::{FeedbackRequest, GenerateQuizRequest, QuizSource},
    },
    services::{
        feedback_service::FeedbackRelay,
        quiz_orchestrator::{recommendation_source, GenerationOutcome, QuizOrchestrator},
        quiz_session::{SessionCommand, SessionEvent},
    },
};

const USAGE: &str = "Usage:
  quizify (--text TEXT | --file PATH | --url URL | --image PATH | --topic N)
          [--count N] [--language LANG] [--api-key KEY]
  quizify profile [list | new | switch N | delete-topic TOPIC | reset]
  quizify feedback EMAIL MESSAGE [--form-id ID]";

const RESET_PROMPTS: [&str; 2] = [
    "Erase ALL profiles, XP and saved topics? Type 'yes' to continue:",
    "This cannot be undone. Type 'yes' again to confirm:",
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_env();

    if let Err(err) = run(config, args).await {
        eprintln!("{}", err.user_message());
        std::process::exit(1);
    }
}

async fn run(config: Config, args: Vec<String>) -> AppResult<()> {
    let mut state = AppState::new(config)?;

    match args.first().map(String::as_str) {
        Some("profile") => profile_command(&mut state.orchestrator, &args[1..]).await,
        Some("feedback") => feedback_command(&state, &args[1..]).await,
        Some(_) => {
            let request = parse_quiz_args(&state, &args)?;
            play(&mut state.orchestrator, request).await
        }
        None => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

fn usage_error(message: &str) -> AppError {
    AppError::ValidationError(format!("{}\n\n{}", message, USAGE))
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> AppResult<&'a str> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| usage_error(&format!("{} needs a value", flag)))
}

fn parse_quiz_args(state: &AppState, args: &[String]) -> AppResult<GenerateQuizRequest> {
    let mut source = None;
    let mut count = state.config.question_count;
    let mut language = state.config.language.clone();
    let mut api_key = None;

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = flag_value(args, i, flag)?;
        match flag {
            "--text" => source = Some(QuizSource::Text(value.to_string())),
            "--file" => source = Some(QuizSource::File(PathBuf::from(value))),
            "--url" => source = Some(QuizSource::Url(value.to_string())),
            "--image" if value.starts_with("data:") => {
                source = Some(QuizSource::ImageDataUrl(value.to_string()))
            }
            "--image" => source = Some(QuizSource::ImageFile(PathBuf::from(value))),
            "--topic" => {
                let index: usize = value
                    .parse()
                    .map_err(|_| usage_error("--topic expects a number"))?;
                let profile = state.orchestrator.active_profile()?;
                let topic = index
                    .checked_sub(1)
                    .and_then(|i| profile.topics.get(i))
                    .ok_or_else(|| usage_error("no saved topic with that number"))?;
                source = Some(recommendation_source(topic));
            }
            "--count" => {
                count = value
                    .parse()
                    .map_err(|_| usage_error("--count expects a number"))?
            }
            "--language" => language = value.to_string(),
            "--api-key" => api_key = Some(value.to_string()),
            other => return Err(usage_error(&format!("unknown option {}", other))),
        }
        i += 2;
    }

    let source = source.ok_or_else(|| usage_error("choose a source for the quiz"))?;
    let mut request = GenerateQuizRequest::new(source, count, language);
    if let Some(key) = api_key {
        request = request.with_api_key(key);
    }
    Ok(request)
}

fn print_profile(orchestrator: &QuizOrchestrator) -> AppResult<()> {
    let profile = orchestrator.active_profile()?;
    println!(
        "{}  |  Level {}  |  {}/{} XP  |  {} day streak",
        profile.username,
        profile.level,
        profile.xp_into_level(),
        XP_PER_LEVEL,
        profile.streak
    );
    if !profile.topics.is_empty() {
        println!("Recommended topics:");
        for (i, topic) in profile.topics.iter().enumerate() {
            println!("  {}. {}", i + 1, topic);
        }
    }
    Ok(())
}

async fn profile_command(orchestrator: &mut QuizOrchestrator, args: &[String]) -> AppResult<()> {
    match args.first().map(String::as_str) {
        None | Some("list") => {
            let collection = orchestrator.profiles().collection();
            for (i, profile) in collection.profiles.iter().enumerate() {
                let marker = if i == collection.active_index { "*" } else { " " };
                println!("{} {}. {} (level {})", marker, i + 1, profile.username, profile.level);
            }
            println!();
            print_profile(orchestrator)
        }
        Some("new") => {
            orchestrator.profiles_mut().create_profile()?;
            print_profile(orchestrator)
        }
        Some("switch") => {
            let number: usize = flag_value(args, 0, "switch")?
                .parse()
                .map_err(|_| usage_error("switch expects a profile number"))?;
            let index = number
                .checked_sub(1)
                .ok_or_else(|| usage_error("profiles are numbered from 1"))?;
            orchestrator.profiles_mut().switch_profile(index)?;
            print_profile(orchestrator)
        }
        Some("delete-topic") => {
            let topic = flag_value(args, 0, "delete-topic")?;
            if !orchestrator.profiles_mut().delete_topic(topic)? {
                println!("No saved topic named '{}'", topic);
            }
            print_profile(orchestrator)
        }
        Some("reset") => {
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            if !confirm(&mut input, &RESET_PROMPTS).await? {
                println!("Reset cancelled.");
                return Ok(());
            }
            let today = chrono::Local::now().date_naive();
            orchestrator.profiles_mut().reset_all(today)?;
            println!("All progress erased.");
            print_profile(orchestrator)
        }
        Some(other) => Err(usage_error(&format!("unknown profile command {}", other))),
    }
}

async fn feedback_command(state: &AppState, args: &[String]) -> AppResult<()> {
    let (Some(email), Some(message)) = (args.first(), args.get(1)) else {
        return Err(usage_error("feedback needs an email and a message"));
    };
    let form_id = match args.get(2).map(String::as_str) {
        Some("--form-id") => Some(flag_value(args, 2, "--form-id")?),
        _ => None,
    };

    let relay = state.feedback_relay(form_id)?;
    relay
        .send(&FeedbackRequest {
            email: email.clone(),
            message: message.clone(),
        })
        .await?;
    println!("Thanks for the feedback!");
    Ok(())
}

async fn read_line<R>(input: &mut Lines<R>) -> AppResult<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    input
        .next_line()
        .await
        .map(|line| line.map(|l| l.trim().to_string()))
        .map_err(|e| AppError::InvalidCommand(format!("could not read input: {}", e)))
}

/// Asks each prompt in turn. Anything but `yes` cancels.
async fn confirm<R>(input: &mut Lines<R>, prompts: &[&str]) -> AppResult<bool>
where
    R: AsyncBufRead + Unpin,
{
    for prompt in prompts {
        println!("{}", prompt);
        match read_line(input).await? {
            Some(answer) if answer.eq_ignore_ascii_case("yes") => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}

async fn play(orchestrator: &mut QuizOrchestrator, request: GenerateQuizRequest) -> AppResult<()> {
    print_profile(orchestrator)?;
    println!("\nGenerating quiz...");

    match orchestrator.generate(request).await? {
        GenerationOutcome::Applied {
            title,
            question_count,
        } => println!("\n{} ({} questions)", title, question_count),
        GenerationOutcome::Stale => return Ok(()),
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let started = Instant::now();
    let mut ticked = 0;

    loop {
        let Some(state) = orchestrator.session().state() else {
            break;
        };
        let Some(question) = state.current_question() else {
            break;
        };
        println!(
            "\n[{}] Question {}/{}  ({}%)",
            orchestrator.session().elapsed_label(),
            state.current_index() + 1,
            state.quiz().len(),
            orchestrator.session().progress_percent()
        );
        println!("{}", question.question());
        for (i, option) in question.options().iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        println!("Answer with a number, 's' to skip, 'q' to quit.");

        let command = loop {
            let Some(line) = read_line(&mut input).await? else {
                orchestrator.reset();
                return Ok(());
            };
            match line.as_str() {
                "q" => {
                    orchestrator.reset();
                    return Ok(());
                }
                "s" => break SessionCommand::Skip,
                "" if orchestrator
                    .session()
                    .state()
                    .and_then(|s| s.current_answer())
                    .map(|a| a.is_recorded())
                    .unwrap_or(false) =>
                {
                    break SessionCommand::Advance
                }
                other => match other.parse::<usize>() {
                    Ok(n) if n >= 1 => break SessionCommand::SelectAnswer(n - 1),
                    _ => println!("Please pick an option number."),
                },
            }
        };

        let due = started.elapsed().as_secs();
        while ticked < due {
            orchestrator.tick();
            ticked += 1;
        }

        match orchestrator.dispatch(command) {
            Ok(SessionEvent::AnswerRecorded {
                correct,
                correct_option,
                ..
            }) => {
                if correct {
                    println!("Correct!");
                } else {
                    println!("Wrong. The answer is {}.", correct_option + 1);
                }
                if let Some(explanation) = orchestrator
                    .session()
                    .state()
                    .and_then(|s| s.current_question())
                    .and_then(|q| q.explanation())
                {
                    println!("{}", explanation);
                }
                println!("Press Enter to continue, or pick another option.");
            }
            Ok(SessionEvent::Moved { .. }) => {}
            Ok(SessionEvent::Completed(_)) => break,
            Err(err) => println!("{}", err.user_message()),
        }
    }

    print_results(orchestrator)
}

fn print_results(orchestrator: &QuizOrchestrator) -> AppResult<()> {
    let session = orchestrator.session();
    let Some(summary) = session.summary() else {
        return Ok(());
    };

    println!("\n=== {}% ===", summary.percent);
    println!("{}", summary.message());
    println!(
        "Correct: {}  Wrong: {}  Skipped: {}  Time: {}",
        summary.correct_count,
        summary.incorrect_count,
        summary.skipped_count,
        session.elapsed_label()
    );
    println!("+{} XP", summary.xp_awarded);

    for entry in session.review().unwrap_or_default() {
        let status = match entry.status {
            ReviewStatus::Right => "right",
            ReviewStatus::Wrong => "wrong",
            ReviewStatus::Skipped => "skipped",
        };
        println!("\n{}. [{}] {}", entry.number, status, entry.question);
        if let Some(chosen) = &entry.chosen_answer {
            println!("   Your answer: {}", chosen);
        }
        println!("   Correct answer: {}", entry.correct_answer);
        if let Some(explanation) = &entry.explanation {
            println!("   {}", explanation);
        }
    }

    println!();
    print_profile(orchestrator)
}
