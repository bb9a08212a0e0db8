use serde::Serialize;

/// Column headers of the backing sheet, in positional order (A..M).
pub const COLUMNS: [&str; 13] = [
    "id",
    "subject",
    "topic",
    "subtopic",
    "type",
    "question",
    "optionA",
    "optionB",
    "optionC",
    "optionD",
    "correctOption",
    "explanation",
    "difficulty",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectOption {
    A,
    B,
    C,
    D,
}

impl CorrectOption {
    pub const ALL: [CorrectOption; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Medium,
    Hard,
    Challenge,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Self::VeryEasy,
        Self::Easy,
        Self::Medium,
        Self::Hard,
        Self::Challenge,
    ];

    /// The label stored in the sheet and exchanged over the API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryEasy => "Very Easy",
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Challenge => "Challenge",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == value)
    }
}

/// A validated, trimmed MCQ body. Never carries an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McqPayload {
    pub subject: String,
    pub topic: String,
    pub subtopic: String,
    pub kind: String,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: CorrectOption,
    pub explanation: String,
    pub difficulty: Difficulty,
}

impl McqPayload {
    pub fn into_record(self, id: String) -> McqRecord {
        McqRecord {
            id,
            subject: self.subject,
            topic: self.topic,
            subtopic: self.subtopic,
            kind: self.kind,
            question: self.question,
            option_a: self.option_a,
            option_b: self.option_b,
            option_c: self.option_c,
            option_d: self.option_d,
            correct_option: self.correct_option.as_str().to_string(),
            explanation: self.explanation,
            difficulty: self.difficulty.as_str().to_string(),
        }
    }
}

/// One stored row. Every cell is kept as text so hand-edited rows still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McqRecord {
    pub id: String,
    pub subject: String,
    pub topic: String,
    pub subtopic: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: String,
    pub explanation: String,
    pub difficulty: String,
}

impl McqRecord {
    /// Maps a sheet row onto the fixed column order. Missing trailing cells
    /// read as empty strings and extra cells past column M are ignored.
    pub fn from_row(row: &[String]) -> Self {
        let cell = |idx: usize| row.get(idx).cloned().unwrap_or_default();
        Self {
            id: cell(0),
            subject: cell(1),
            topic: cell(2),
            subtopic: cell(3),
            kind: cell(4),
            question: cell(5),
            option_a: cell(6),
            option_b: cell(7),
            option_c: cell(8),
            option_d: cell(9),
            correct_option: cell(10),
            explanation: cell(11),
            difficulty: cell(12),
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.subject.clone(),
            self.topic.clone(),
            self.subtopic.clone(),
            self.kind.clone(),
            self.question.clone(),
            self.option_a.clone(),
            self.option_b.clone(),
            self.option_c.clone(),
            self.option_d.clone(),
            self.correct_option.clone(),
            self.explanation.clone(),
            self.difficulty.clone(),
        ]
    }

    /// Case-insensitive substring match used by the record list filter.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.id, &self.subject, &self.topic, &self.question]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Mints a new record id.
pub fn new_record_id() -> String {
    ulid::Ulid::new().to_string()
}
