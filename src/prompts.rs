//! Prompt templates for outline generation, question generation and vision OCR.
//!
//! Every prompt lives here so that unit tests can inspect them directly and a
//! wording change touches exactly one place. Templates embed the document
//! text verbatim; callers decide beforehand whether the text is truncated.

/// Outline prompt, split around the embedded document text.
const OUTLINE_PROMPT_HEAD: &str = r#"Create a hierarchical markdown mindmap from the following text.
Use proper markdown heading syntax (# for main topics, ## for subtopics, ### for details).
Focus on the main concepts and their relationships.
Include relevant details and connections between ideas.
Keep the structure clean and organized.

Format the output exactly like this example:
# Main Topic
## Subtopic 1
### Detail 1
- Key point 1
- Key point 2
### Detail 2
## Subtopic 2
### Detail 3
### Detail 4

Text to analyze: "#;

const OUTLINE_PROMPT_TAIL: &str = r#"

Respond only with the markdown mindmap, no additional text."#;

const QUESTIONS_PROMPT_HEAD: &str = r#"Based on the following text, generate a list of questions that test comprehension and understanding of the content.
Provide the questions in a numbered list format.

Text:
"#;

const QUESTIONS_PROMPT_TAIL: &str = r#"

Respond only with the list of questions."#;

/// System prompt used by [`crate::pipeline::ocr::VisionOcr`].
pub const VISION_OCR_PROMPT: &str = r#"You are an OCR engine. Transcribe all text visible in the page image exactly as written, in natural reading order.
Do not summarise, translate, correct or describe the page.
Do not wrap the output in code fences.
If the page contains no readable text, respond with an empty message."#;

/// Build the outline prompt with `text` embedded verbatim.
pub fn outline_prompt(text: &str) -> String {
    let mut prompt =
        String::with_capacity(OUTLINE_PROMPT_HEAD.len() + text.len() + OUTLINE_PROMPT_TAIL.len());
    prompt.push_str(OUTLINE_PROMPT_HEAD);
    prompt.push_str(text);
    prompt.push_str(OUTLINE_PROMPT_TAIL);
    prompt
}

/// Build the comprehension-question prompt with `text` embedded verbatim.
pub fn questions_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(
        QUESTIONS_PROMPT_HEAD.len() + text.len() + QUESTIONS_PROMPT_TAIL.len(),
    );
    prompt.push_str(QUESTIONS_PROMPT_HEAD);
    prompt.push_str(text);
    prompt.push_str(QUESTIONS_PROMPT_TAIL);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_prompt_embeds_text_verbatim() {
        let text = "Braces {like} these and ${vars} stay as-is";
        let prompt = outline_prompt(text);
        assert!(prompt.contains(text));
        assert!(prompt.contains("# for main topics"));
        assert!(prompt.ends_with("no additional text."));
    }

    #[test]
    fn questions_prompt_asks_for_numbered_list() {
        let prompt = questions_prompt("Photosynthesis converts light.");
        assert!(prompt.contains("numbered list"));
        assert!(prompt.contains("Text:\nPhotosynthesis converts light."));
    }

    #[test]
    fn prompts_differ() {
        assert_ne!(outline_prompt("x"), questions_prompt("x"));
    }
}
