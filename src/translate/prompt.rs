//! Prompt format for TranslateGemma-style chat models.
//!
//! The prompt is a completed user turn followed by an open model turn that
//! already repeats the task header, so generation continues straight into
//! the translated text.

pub const START_OF_TURN: &str = "<start_of_turn>";
pub const END_OF_TURN: &str = "<end_of_turn>";
pub const END_OF_SEQUENCE: &str = "<eos>";

/// Sequences that terminate generation
pub const STOP_SEQUENCES: [&str; 2] = [END_OF_TURN, END_OF_SEQUENCE];

/// Render the translation prompt.
///
/// Fields are labeled and comma separated; commas or colons inside `text`
/// are not escaped. The output depends only on the arguments.
pub fn build_prompt(source_lang: &str, target_lang: &str, text: &str) -> String {
    let header = task_header(source_lang, target_lang);
    format!(
        "{START_OF_TURN}user\n{header}{text}{END_OF_TURN}\n{START_OF_TURN}model\n{header}"
    )
}

fn task_header(source_lang: &str, target_lang: &str) -> String {
    format!("type:text,source_lang_code:{source_lang},target_lang_code:{target_lang},text:")
}
