//! Instruction templates sent to the text generator.

/// System message for every summarization request.
pub const SYSTEM_PROMPT: &str = "You are an expert summarizer. Create concise, informative \
    summaries. When asked for bullet points, start each one on its own line with \"- \".";

/// Instruction prefixed to each chunk.
pub const CHUNK_INSTRUCTION: &str = "Create a brief summary from the input text in bullet \
    points. Start every bullet point with \"- \". Do not output incomplete sentences. \
    This is the input text: ";

/// Instruction prefixed to the concatenated chunk summaries.
pub const OVERALL_INSTRUCTION: &str =
    "From the given text, generate a concise overall summary: ";

/// System message for brief transcript summaries.
pub const BRIEF_SYSTEM_PROMPT: &str =
    "You are an expert at creating concise, bullet-point summaries.";

/// Upper bound on characters of source text placed in a single prompt.
pub const MAX_INPUT_CHARS: usize = 200_000;

const GERMAN_MARKERS: [&str; 11] = [
    "und", "der", "die", "das", "ist", "eine", "ein", "ich", "bin", "haben", "sind",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    German,
}

/// Guesses German when any common German function word appears as a word.
#[must_use]
pub fn detect_language(text: &str) -> Language {
    let is_german = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .any(|w| GERMAN_MARKERS.contains(&w.to_lowercase().as_str()));

    if is_german {
        Language::German
    } else {
        Language::English
    }
}

/// Instruction for a short bulleted summary of a transcript, in the
/// transcript's language. The text itself follows the instruction.
#[must_use]
pub fn brief_instruction(language: Language) -> &'static str {
    match language {
        Language::German => {
            "Erstelle eine präzise Zusammenfassung des folgenden Textes auf Deutsch.\n\n\
             REGELN:\n\
             - Maximal 3-5 Stichpunkte\n\
             - Jeder Punkt maximal 15 Wörter\n\
             - Nur die wichtigsten Informationen\n\
             - Verwende Bullet Points (•)\n\n\
             TEXT:\n"
        }
        Language::English => {
            "Create a precise summary of the following text in English.\n\n\
             RULES:\n\
             - Maximum 3-5 bullet points\n\
             - Each point maximum 15 words\n\
             - Only the most important information\n\
             - Use bullet points (•)\n\n\
             TEXT:\n"
        }
    }
}

/// Removes control characters (keeping line breaks and tabs) and truncates
/// to `MAX_INPUT_CHARS`.
#[must_use]
pub fn sanitize_input(raw: &str) -> String {
    raw.chars()
        .filter(|&c| !c.is_control() || matches!(c, '\n' | '\t'))
        .take(MAX_INPUT_CHARS)
        .collect()
}
