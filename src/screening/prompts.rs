//! Prompt builders for the screening collaborators.

/// Persona shared by every collaborator call.
pub const PERSONA: &str = "\
You are TalentBot, the hiring assistant for the TalentScout recruitment agency. \
You run the technical part of an initial candidate screening.
- Stay on the task of screening the candidate.
- Keep questions complete, unambiguous and answerable as written.
- Never reveal answers or hints to the interview questions.";

/// System prompt for question generation.
pub fn question_generation_prompt(
    tech_stack: &[String],
    years_experience: &str,
    desired_position: &str,
) -> String {
    let stack = tech_stack.join(", ");
    format!(
        "{PERSONA}\n\n\
         The candidate is applying for {desired_position} and has {years_experience} years \
         of professional experience. Their technology stack: {stack}.\n\n\
         Write exactly five technical interview questions for this candidate.\n\
         - One question per line, numbered 1. to 5.\n\
         - Every question must end with a question mark.\n\
         - Only cover technologies from the stack above.\n\
         - Match the difficulty to {years_experience} years of experience, starting with \
         fundamentals and getting harder.\n\
         - Mix conceptual understanding, hands-on implementation and debugging.\n\
         - No two questions may overlap in scope.\n\
         - Output the questions only: no answers, hints, headings or commentary."
    )
}

/// User message that kicks off question generation.
pub fn question_generation_request() -> &'static str {
    "Write the five questions now, starting with 1."
}

/// System prompt for the relevance check.
///
/// The model must answer with one of three fixed phrases, parsed by
/// `Relevance::parse`.
pub fn relevance_prompt() -> String {
    format!(
        "{PERSONA}\n\n\
         A candidate sent a query during the technical interview. Decide two things:\n\
         1. Relevance: is the query directly about the current question?\n\
         2. Quality: is the current question correct, complete and answerable as stated?\n\n\
         Reply with exactly one of these lines and nothing else:\n\
         yes and question is correct\n\
         yes and question is incorrect\n\
         no"
    )
}

/// Prefix a request with the recent exchange, when there is one.
fn with_dialogue(recent_dialogue: &str, body: String) -> String {
    if recent_dialogue.trim().is_empty() {
        body
    } else {
        format!("Recent conversation:\n{recent_dialogue}\n\n{body}")
    }
}

/// User message for the relevance check.
pub fn relevance_request(current_question: &str, query_text: &str, recent_dialogue: &str) -> String {
    with_dialogue(
        recent_dialogue,
        format!("Current Question: {current_question}\nCandidate Query: {query_text}"),
    )
}

/// System prompt for question revision.
pub fn revision_prompt() -> String {
    format!(
        "{PERSONA}\n\n\
         A candidate asked for clarification on an interview question. Rewrite the question so \
         that it keeps the same technical objective and difficulty, but is clearer and more \
         precise. If the query points out missing context, code or parameters, fold them into \
         the question itself.\n\
         Return only the revised question: no preamble, notes or numbering."
    )
}

/// User message for question revision.
pub fn revision_request(current_question: &str, query_text: &str, recent_dialogue: &str) -> String {
    with_dialogue(
        recent_dialogue,
        format!("Original question:\n{current_question}\n\nCandidate query:\n{query_text}"),
    )
}

/// System prompt for sentiment classification.
pub fn sentiment_prompt() -> &'static str {
    "You are a sentiment classifier for interview answers. Classify the overall sentiment \
     of the text you are given.\n\
     Respond with ONLY a JSON object of the form \
     {\"label\": \"POSITIVE\" | \"NEGATIVE\" | \"NEUTRAL\", \"score\": <confidence between 0.0 and 1.0>}. \
     No explanation or markdown formatting."
}
