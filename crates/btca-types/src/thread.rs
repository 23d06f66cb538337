use serde::{Deserialize, Serialize};

/// Named external corpus a question can be answered from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    #[default]
    Pending,
    Answered,
    Canceled,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Answered => "answered",
            Self::Canceled => "canceled",
        }
    }
}

/// One turn of a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadQuestion {
    pub id: String,
    pub resources: Vec<String>,
    pub prompt: String,
    pub answer: String,
    pub status: QuestionStatus,
}

/// A question before an id has been assigned
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewQuestion {
    pub resources: Vec<String>,
    pub prompt: String,
    pub answer: String,
    pub status: QuestionStatus,
}

impl NewQuestion {
    pub fn pending(prompt: impl Into<String>, resources: Vec<String>) -> Self {
        Self {
            resources,
            prompt: prompt.into(),
            answer: String::new(),
            status: QuestionStatus::Pending,
        }
    }

    pub fn with_id(self, id: impl Into<String>) -> ThreadQuestion {
        ThreadQuestion {
            id: id.into(),
            resources: self.resources,
            prompt: self.prompt,
            answer: self.answer,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadState {
    pub id: String,
    pub resources: Vec<String>,
    pub questions: Vec<ThreadQuestion>,
}

impl ThreadState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resources: Vec::new(),
            questions: Vec::new(),
        }
    }

    /// Merge resource names, keeping the list deduplicated and sorted
    pub fn merge_resources<I, S>(&mut self, resources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self.resources.sort();
        self.resources.dedup();
    }

    pub fn last_question(&self) -> Option<&ThreadQuestion> {
        self.questions.last()
    }

    pub fn last_question_mut(&mut self) -> Option<&mut ThreadQuestion> {
        self.questions.last_mut()
    }
}

/// Signal for the in-flight turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelState {
    #[default]
    None,
    Requested,
    Canceled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_resources_sorts_and_dedupes() {
        let mut thread = ThreadState::new("t1");
        thread.merge_resources(["svelte", "effect"]);
        thread.merge_resources(vec!["effect".to_string(), "astro".to_string()]);

        assert_eq!(thread.resources, vec!["astro", "effect", "svelte"]);
    }

    #[test]
    fn test_new_question_with_id() {
        let question = NewQuestion::pending("how?", vec!["svelte".to_string()]).with_id("q1");

        assert_eq!(question.id, "q1");
        assert_eq!(question.status, QuestionStatus::Pending);
        assert!(question.answer.is_empty());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&QuestionStatus::Canceled).unwrap(), "\"canceled\"");
        assert_eq!(serde_json::to_string(&CancelState::None).unwrap(), "\"none\"");
    }
}
