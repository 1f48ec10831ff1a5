/// Assemble the tutoring prompt from its form sections.
///
/// Pure formatting; the caller is responsible for guarding the user input.
pub fn build_prompt(metadata: &str, chat_log: &str, rag_criteria: &str, user_input: &str) -> String {
    format!(
        "\n[Problem Context]\n{metadata}\n\n[Chat Log]\n{chat_log}\n\n[Evaluation Criteria]\n{rag_criteria}\n\n[User Input]\n{user_input}\n\n"
    )
}
