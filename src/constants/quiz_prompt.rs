use crate::models::dto::quiz_dto::quiz_payload_schema;

pub const QUIZ_GENERATOR_ROLE: &str =
    "You are a Quiz Generator specialized in study materials.";

pub const QUIZ_OUTPUT_RULES: &str = "Include a \"reference\" or \"explanation\" for each question to legitimize the answer.
IMPORTANT: Return ONLY raw JSON. No conversational text.
Properly escape all strings. Do NOT use unescaped newlines within JSON values.
\"correct\" is the zero-based index of the right entry in \"options\".";

pub const QUIZ_JSON_EXAMPLE: &str = r#"{
  "quiz_title": "Concise title",
  "questions": [
    {
      "question": "text",
      "options": ["A", "B", "C", "D"],
      "correct": 0,
      "explanation": "reference"
    }
  ]
}"#;

pub const RECOMMENDATION_PREFIX: &str = "Discuss the key concepts of: ";

/// What the model is asked to read.
#[derive(Clone, Copy, Debug)]
pub enum PromptInput<'a> {
    Text(&'a str),
    Image,
}

pub fn build_quiz_prompt(question_count: u8, language: &str, input: PromptInput<'_>) -> String {
    let focus = match input {
        PromptInput::Text(_) => "Analyze the input text below.",
        PromptInput::Image => "Analyze the attached image.",
    };
    let tail = match input {
        PromptInput::Text(text) => format!("Input text:\n{}", text),
        PromptInput::Image => "Base your questions on the provided image.".to_string(),
    };

    format!(
        "{role}\n{focus}\nGenerate a quiz with exactly {count} multiple-choice questions.\n\
The language of the quiz (questions, options, explanations and title) MUST be {language}.\n\
{rules}\n\nJSON Structure:\n{example}\n\nJSON Schema:\n{schema}\n\n{tail}\n",
        role = QUIZ_GENERATOR_ROLE,
        focus = focus,
        count = question_count,
        language = language,
        rules = QUIZ_OUTPUT_RULES,
        example = QUIZ_JSON_EXAMPLE,
        schema = quiz_payload_schema(),
        tail = tail,
    )
}

/// Study text pre-filled when a saved topic is picked as a recommendation.
pub fn recommendation_text(topic: &str) -> String {
    format!("{}{}", RECOMMENDATION_PREFIX, topic)
}
