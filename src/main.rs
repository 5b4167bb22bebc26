use std::sync::Arc;
use std::time::Duration;
use anyhow::{anyhow, Result};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use mockmate_interview::completion::CompletionClient;
use mockmate_interview::config::Settings;
use mockmate_interview::database::{MemoryStore, PostgresStore, SessionStore};
use mockmate_interview::gateway::CompletionGateway;
use mockmate_interview::interview::{CompletionScorer, ControllerOptions, FeedbackScorer, TranscriptScorer, TurnController};
use mockmate_interview::session::{Difficulty, Feedback, InterviewSetup, Personality, Sender};
use mockmate_interview::voice::console::{ConsoleRecognizer, ConsoleSynthesizer};
use mockmate_interview::voice::{SpeechParams, SpeechRecognizer, SpeechSynthesizer, VoiceIo};

const USAGE: &str = "usage: mockmate-interview <industry> [easy|medium|hard] [intimidator|friendly|robotic|curveball] [role] [company]";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("Error running interview: {:#}", e);
        std::process::exit(1);
    }
}

fn setup_from_args() -> Result<InterviewSetup> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let industry = args.first().ok_or_else(|| anyhow!(USAGE))?;

    let difficulty = match args.get(1) {
        Some(value) => value.parse::<Difficulty>().map_err(|e| anyhow!(e))?,
        None => Difficulty::Medium,
    };
    let personality = match args.get(2) {
        Some(value) => value.parse::<Personality>().map_err(|e| anyhow!(e))?,
        None => Personality::Friendly,
    };

    let mut setup = InterviewSetup::new(industry.as_str(), difficulty, personality);
    if let Some(role) = args.get(3) {
        setup = setup.with_role(role.as_str());
    }
    if let Some(company) = args.get(4) {
        setup = setup.with_company(company.as_str());
    }
    Ok(setup)
}

async fn open_store(settings: &Settings) -> Arc<dyn SessionStore> {
    match &settings.database.url {
        Some(url) => match PostgresStore::connect(url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!("Database unavailable, keeping sessions in memory: {}", e);
                Arc::new(MemoryStore::new())
            }
        },
        None => Arc::new(MemoryStore::new()),
    }
}

async fn run() -> Result<()> {
    let setup = setup_from_args()?;
    let settings = Settings::load()?;

    let client = CompletionClient::new(&settings.completion);
    let scorer: Arc<dyn FeedbackScorer> = if settings.feedback.use_completion && client.is_configured() {
        Arc::new(CompletionScorer::new(Arc::new(client.clone())))
    } else {
        Arc::new(TranscriptScorer::new())
    };
    let gateway = Arc::new(CompletionGateway::new(client));
    let store = open_store(&settings).await;

    let recognizer = Arc::new(ConsoleRecognizer::new());
    let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(ConsoleSynthesizer::new());
    let voice = VoiceIo::new(Some(recognizer.clone() as Arc<dyn SpeechRecognizer>), Some(synthesizer))
        .with_silence_window(Duration::from_secs(settings.voice.capture_timeout_secs.max(1)));

    let options = ControllerOptions {
        voice_enabled: settings.voice.enabled,
        speech: SpeechParams::new(settings.voice.rate, settings.voice.pitch, settings.voice.volume),
        feedback_timeout: Duration::from_secs(settings.feedback.timeout_secs.max(1)),
    };
    let controller = TurnController::new(Arc::new(voice), gateway, scorer, store, options);

    if !controller.is_gateway_configured() {
        println!("🎭 Demo mode: no completion API key, the interviewer uses scripted lines.");
    }
    println!("Commands: /voice on | /voice off | /listen | /stop | /end\n");

    let printer = tokio::spawn(print_updates(controller.clone()));

    controller.start(setup).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            "/end" => break,
            "/voice on" => controller.toggle_voice(true),
            "/voice off" => controller.toggle_voice(false),
            "/stop" => controller.stop_capture(),
            "/listen" => {
                if let Err(e) = controller.start_capture() {
                    println!("⚠️  {}", e);
                }
            }
            text => {
                // With the microphone open, a typed line stands in for speech.
                if controller.phase().is_listening() && recognizer.feed(text) {
                    continue;
                }
                if let Err(e) = controller.submit_user_text(text).await {
                    println!("⚠️  {}", e);
                }
            }
        }
    }

    let feedback = controller.end().await?;
    printer.abort();
    print_feedback(&feedback);

    info!("Interview finished");
    Ok(())
}

/// Prints interviewer lines, listening prompts and notices as they appear.
async fn print_updates(controller: TurnController) {
    let mut updates = controller.subscribe();
    let mut printed = 0;
    let mut was_listening = false;

    while updates.changed().await.is_ok() {
        let view = updates.borrow_and_update().clone();

        if view.message_count > printed {
            if let Some(session) = controller.session() {
                for message in &session.messages()[printed.min(session.messages().len())..] {
                    // Spoken replies are echoed by the console synthesizer.
                    if message.sender == Sender::Ai && !view.status.is_speaking {
                        println!("\n🤖 {}\n", message.content);
                    }
                }
                printed = session.messages().len();
            }
        }

        if view.status.is_listening && !was_listening {
            println!("🎤 Listening... (type your answer)");
        }
        was_listening = view.status.is_listening;

        if let Some(notice) = view.notice {
            println!("⚠️  {}", notice);
            controller.dismiss_notice();
        }
    }
}

fn print_feedback(feedback: &Feedback) {
    let detail = &feedback.detailed_feedback;
    println!("\n=== Interview Feedback ===");
    println!("Overall rating: {}/5", feedback.overall_rating);
    println!("Confidence: {}/100", feedback.confidence_score);
    println!(
        "Communication {} | Technical {} | Problem solving {} | Culture fit {}",
        detail.communication, detail.technical_knowledge, detail.problem_solving, detail.cultural_fit
    );

    println!("\nStrengths:");
    for strength in &feedback.strengths {
        println!("  ✅ {}", strength);
    }
    println!("\nTo improve:");
    for improvement in &feedback.improvements {
        println!("  📈 {}", improvement);
    }
}
