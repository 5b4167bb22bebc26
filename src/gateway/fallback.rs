use rand::seq::SliceRandom;

use crate::session::Personality;

const INTIMIDATOR_LINES: &[&str] = &[
    "Let's not waste time. Walk me through the hardest technical decision you've made and defend it.",
    "That's a textbook answer. Give me a concrete example with real numbers.",
    "Why should we hire you over the ten other candidates I spoke to this week?",
    "You've told me what you did. Now tell me what went wrong and whose fault it was.",
    "Convince me you actually understand the fundamentals of this field.",
];

const FRIENDLY_LINES: &[&str] = &[
    "It's great to chat with you! Could you tell me a bit about your background and what drew you to this field?",
    "Thanks for sharing! What's a project you've worked on recently that you're really proud of?",
    "I'd love to hear how you like to collaborate with a team. Can you give me an example?",
    "That sounds interesting! How do you usually approach learning something new for your work?",
    "What kind of work environment helps you do your best?",
];

const ROBOTIC_LINES: &[&str] = &[
    "Input received. Please state your relevant professional experience.",
    "Query: describe a problem you solved. Include context, action, and outcome.",
    "Processing. Next question: list your three strongest technical competencies.",
    "Acknowledged. Describe a situation in which you failed and the corrective action taken.",
    "Please specify your expected contribution within the first ninety days.",
];

const CURVEBALL_LINES: &[&str] = &[
    "If you could automate one part of your current job completely, what would it be and why?",
    "How many meetings do you think happen in this city every hour? Talk me through your estimate.",
    "Tell me about a time you changed your mind about something important at work.",
    "If your last manager described you in three words, which would surprise me?",
    "Imagine the project you're proudest of failed tomorrow. What's the most likely reason?",
];

/// The canned lines used for `personality` when the completion service
/// cannot answer.
pub fn fallback_lines(personality: Personality) -> &'static [&'static str] {
    match personality {
        Personality::Intimidator => INTIMIDATOR_LINES,
        Personality::Friendly => FRIENDLY_LINES,
        Personality::Robotic => ROBOTIC_LINES,
        Personality::Curveball => CURVEBALL_LINES,
    }
}

/// Uniformly random pick; consecutive repeats are allowed.
pub fn fallback_utterance(personality: Personality) -> &'static str {
    let lines = fallback_lines(personality);
    lines
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Tell me a little about yourself.")
}
