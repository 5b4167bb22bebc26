use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interviewer persona. Drives both the instruction prefix sent to the
/// completion service and the scripted fallback list.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Intimidator,
    Friendly,
    Robotic,
    Curveball,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Intimidator,
        Personality::Friendly,
        Personality::Robotic,
        Personality::Curveball,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Intimidator => "intimidator",
            Personality::Friendly => "friendly",
            Personality::Robotic => "robotic",
            Personality::Curveball => "curveball",
        }
    }
}

impl FromStr for Personality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "intimidator" => Ok(Personality::Intimidator),
            "friendly" => Ok(Personality::Friendly),
            "robotic" => Ok(Personality::Robotic),
            "curveball" => Ok(Personality::Curveball),
            other => Err(format!("Unknown personality: {}", other)),
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the candidate picked before starting. Never changes once a session
/// has been created from it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSetup {
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub industry: String,
    pub difficulty: Difficulty,
    pub personality: Personality,
    #[validate(length(max = 100))]
    pub role: Option<String>,
    #[validate(length(max = 100))]
    pub company: Option<String>,
}

impl InterviewSetup {
    pub fn new(industry: impl Into<String>, difficulty: Difficulty, personality: Personality) -> Self {
        Self {
            industry: industry.into(),
            difficulty,
            personality,
            role: None,
            company: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Role with blank values treated as absent.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
