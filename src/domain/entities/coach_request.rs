use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of help requested from the AI focus coach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoachRequestType {
    TaskBreakdown,
    DopamineDetox,
    MotivationalInsight,
    SessionSummary,
}

impl CoachRequestType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "task-breakdown" => Some(CoachRequestType::TaskBreakdown),
            "dopamine-detox" => Some(CoachRequestType::DopamineDetox),
            "motivational-insight" => Some(CoachRequestType::MotivationalInsight),
            "session-summary" => Some(CoachRequestType::SessionSummary),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoachRequestType::TaskBreakdown => "task-breakdown",
            CoachRequestType::DopamineDetox => "dopamine-detox",
            CoachRequestType::MotivationalInsight => "motivational-insight",
            CoachRequestType::SessionSummary => "session-summary",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoachTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Reflection captured at the end of a focus session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReflection {
    pub focus_quality: Option<u8>,
    pub focus_depth: Option<String>,
    pub what_distracted: Option<String>,
    pub whats_next: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CoachRequest {
    pub request_type: CoachRequestType,
    pub task: Option<CoachTask>,
    pub history: serde_json::Value,
    pub reflection: SessionReflection,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoachRequestError {
    #[error("A task is required for {0} requests")]
    MissingTask(&'static str),
}

/// System and user messages sent to the language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachPrompt {
    pub system: String,
    pub user: String,
}

impl CoachRequest {
    pub fn prompt(&self) -> Result<CoachPrompt, CoachRequestError> {
        let prompt = match self.request_type {
            CoachRequestType::TaskBreakdown => {
                let task = self.require_task()?;
                CoachPrompt {
                    system: "You are an AI Focus Coach specialized in helping users break down tasks into flow-optimized chunks. Use the \"1-90-0\" deep work method: 1 minute to prepare, 90 minutes of deep focus, 0 distractions.".into(),
                    user: format!(
                        "Task: {}\nDescription: {}\n\nBreak this task into actionable steps optimized for deep focus sessions. Keep it concise and practical.",
                        task.title,
                        task.description.as_deref().unwrap_or("")
                    ),
                }
            }
            CoachRequestType::DopamineDetox => {
                let task = self.require_task()?;
                CoachPrompt {
                    system: "You are an AI Focus Coach helping users prepare for distraction-free deep work. Suggest practical dopamine detox actions.".into(),
                    user: format!(
                        "I'm about to start a focus session for: \"{}\"\n\nGive me 3-5 quick dopamine detox reminders to prepare my environment and mind for deep work.",
                        task.title
                    ),
                }
            }
            CoachRequestType::MotivationalInsight => CoachPrompt {
                system: "You are an AI Focus Coach providing motivational insights based on user's focus history. Be encouraging and specific.".into(),
                user: format!(
                    "User's recent sessions: {}\n\nProvide a motivational insight about their progress and encourage their next session. Keep it under 50 words.",
                    self.history
                ),
            },
            CoachRequestType::SessionSummary => {
                let task = self.require_task()?;
                let r = &self.reflection;
                CoachPrompt {
                    system: "You are an AI Focus Coach creating concise session summaries. Focus on accomplishments and next steps.".into(),
                    user: format!(
                        "Session reflection:\nTask: {}\nFocus Quality: {}/10\nAccomplished: {}\nDistractions: {}\nNext Steps: {}\n\nCreate a 3-line summary highlighting: 1) What was achieved, 2) Key insight, 3) Momentum builder for next session.",
                        task.title,
                        r.focus_quality.map(|q| q.to_string()).unwrap_or_else(|| "?".into()),
                        r.focus_depth.as_deref().unwrap_or(""),
                        r.what_distracted.as_deref().unwrap_or(""),
                        r.whats_next.as_deref().unwrap_or(""),
                    ),
                }
            }
        };
        Ok(prompt)
    }

    fn require_task(&self) -> Result<&CoachTask, CoachRequestError> {
        self.task
            .as_ref()
            .filter(|t| !t.title.trim().is_empty())
            .ok_or(CoachRequestError::MissingTask(self.request_type.as_str()))
    }
}
