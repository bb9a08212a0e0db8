use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::models::{CorrectOption, Difficulty, McqPayload};

/// Per-field failure messages, keyed by the JSON field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

const CORRECT_OPTION_MESSAGE: &str = "Invalid enum value. Expected 'A' | 'B' | 'C' | 'D'";
const DIFFICULTY_MESSAGE: &str =
    "Invalid enum value. Expected 'Very Easy' | 'Easy' | 'Medium' | 'Hard' | 'Challenge'";

struct Fields<'a> {
    body: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> Fields<'a> {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Trimmed text of `field`, `None` when absent or null.
    fn text(&mut self, field: &str) -> Option<String> {
        match self.body.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(_) => {
                self.fail(field, "Expected string");
                None
            }
        }
    }

    fn required(&mut self, field: &str, label: &str) -> String {
        let present = self.body.get(field).is_some_and(|v| !v.is_null());
        match self.text(field) {
            Some(s) if !s.is_empty() => s,
            Some(_) => {
                self.fail(field, format!("{label} is required"));
                String::new()
            }
            None if !present => {
                self.fail(field, format!("{label} is required"));
                String::new()
            }
            None => String::new(),
        }
    }

    fn optional(&mut self, field: &str) -> String {
        self.text(field).unwrap_or_default()
    }

    fn one_of<T>(&mut self, field: &str, message: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
        let parsed = match self.body.get(field) {
            Some(Value::String(s)) => parse(s.trim()),
            _ => None,
        };
        if parsed.is_none() {
            self.fail(field, message);
        }
        parsed
    }
}

/// Validates an untrusted request body into a normalized payload.
///
/// Every field is checked so the caller gets the complete list of problems.
/// A body that is not a JSON object is treated as an empty object.
pub fn validate_payload(input: &Value) -> Result<McqPayload, FieldErrors> {
    let empty = Map::new();
    let body = input.as_object().unwrap_or(&empty);
    let mut f = Fields {
        body,
        errors: FieldErrors::new(),
    };

    let subject = f.required("subject", "Subject");
    let topic = f.required("topic", "Topic");
    let subtopic = f.optional("subtopic");
    let kind = f.required("type", "Type");
    let question = f.required("question", "Question");
    let option_a = f.required("optionA", "Option A");
    let option_b = f.required("optionB", "Option B");
    let option_c = f.required("optionC", "Option C");
    let option_d = f.required("optionD", "Option D");
    let correct_option = f.one_of("correctOption", CORRECT_OPTION_MESSAGE, CorrectOption::parse);
    let explanation = f.optional("explanation");
    let difficulty = f.one_of("difficulty", DIFFICULTY_MESSAGE, Difficulty::parse);

    match (correct_option, difficulty) {
        (Some(correct_option), Some(difficulty)) if f.errors.is_empty() => Ok(McqPayload {
            subject,
            topic,
            subtopic,
            kind,
            question,
            option_a,
            option_b,
            option_c,
            option_d,
            correct_option,
            explanation,
            difficulty,
        }),
        _ => Err(f.errors),
    }
}
