/// Standard user-facing refusal. Carries the reason and nothing else.
pub fn refusal_message(reason: impl std::fmt::Display) -> String {
    format!("I can't answer question using the available documents.\nReason: {}", reason)
}
