use crate::completion::PromptStyle;

/// How the upstream text is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// One item per line
    Lines,
    /// The whole text as a single string
    Text,
}

/// A prompt route: the instruction prepended to the caller's text and the limits of the answer.
#[derive(Debug)]
pub struct PromptEndpoint {
    pub path: &'static str,
    pub template: &'static str,
    pub max_tokens: u32,
    pub shape: OutputShape,
    pub style: PromptStyle,
}

const fn lines(path: &'static str, template: &'static str, max_tokens: u32) -> PromptEndpoint {
    PromptEndpoint {
        path,
        template,
        max_tokens,
        shape: OutputShape::Lines,
        style: PromptStyle::Completion,
    }
}

const fn chat_lines(path: &'static str, template: &'static str, max_tokens: u32) -> PromptEndpoint {
    PromptEndpoint {
        path,
        template,
        max_tokens,
        shape: OutputShape::Lines,
        style: PromptStyle::Chat,
    }
}

const fn chat_text(path: &'static str, template: &'static str, max_tokens: u32) -> PromptEndpoint {
    PromptEndpoint {
        path,
        template,
        max_tokens,
        shape: OutputShape::Text,
        style: PromptStyle::Chat,
    }
}

pub static PROMPT_ENDPOINTS: [PromptEndpoint; 18] = [
    lines(
        "/openai-predict",
        "Write three short problem statements, one per line, for a product team working on the following idea:",
        200,
    ),
    lines(
        "/openai-solution",
        "Propose three possible solutions, one per line, to the following problem statement:",
        300,
    ),
    lines(
        "/tasks",
        "Break the following user story into development tasks, one task per line:",
        400,
    ),
    lines(
        "/targetCustomer",
        "Describe the target customer segments, one per line, for the following product:",
        200,
    ),
    lines(
        "/marketSize",
        "Estimate the total addressable, serviceable and obtainable market, one per line, for the following product:",
        200,
    ),
    lines(
        "/dataElements",
        "List the data elements, one per line, that a system implementing the following feature needs to store:",
        300,
    ),
    lines(
        "/hypothesis",
        "Write testable product hypotheses in the form 'We believe that ... will result in ...', one per line, for the following feature:",
        200,
    ),
    lines(
        "/marketing-material",
        "Write marketing taglines and short value propositions, one per line, for the following product:",
        400,
    ),
    lines(
        "/feature-name",
        "Suggest five catchy names, one per line, for the following feature:",
        60,
    ),
    lines(
        "/whats-next",
        "Suggest the next features to build, one per line, for a product that already offers the following:",
        300,
    ),
    lines(
        "/feature-assess",
        "Write a SWOT assessment with one line each for strengths, weaknesses, opportunities and threats of the following feature:",
        500,
    ),
    lines(
        "/task-list",
        "Write a prioritized checklist, one item per line, for delivering the following:",
        400,
    ),
    lines(
        "/acceptance-criteria",
        "Write acceptance criteria in Given/When/Then form, one criterion per line, for the following user story:",
        300,
    ),
    chat_lines(
        "/social-post",
        "Write three short social media posts, one per line, announcing the following feature:",
        150,
    ),
    chat_lines(
        "/blog-post",
        "Write a blog post announcing the following feature to customers:",
        1000,
    ),
    chat_lines(
        "/email-post",
        "Write a product update email announcing the following feature to customers:",
        500,
    ),
    chat_text(
        "/frontend-code",
        "Write the frontend code, as a single React component, implementing the following feature:",
        1000,
    ),
    chat_text(
        "/backend-code",
        "Write the backend code, as HTTP route handlers, implementing the following feature:",
        1000,
    ),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn paths_are_unique() {
        let paths: HashSet<_> = PROMPT_ENDPOINTS.iter().map(|e| e.path).collect();
        assert_eq!(paths.len(), PROMPT_ENDPOINTS.len());
    }

    #[test]
    fn token_bounds_stay_in_range() {
        for endpoint in &PROMPT_ENDPOINTS {
            assert!(
                (60..=1000).contains(&endpoint.max_tokens),
                "{} has bound {}",
                endpoint.path,
                endpoint.max_tokens
            );
            assert!(!endpoint.template.trim().is_empty());
        }
    }

    #[test]
    fn only_code_endpoints_return_text() {
        let text: Vec<_> = PROMPT_ENDPOINTS
            .iter()
            .filter(|e| e.shape == OutputShape::Text)
            .map(|e| e.path)
            .collect();
        assert_eq!(text, vec!["/frontend-code", "/backend-code"]);
    }
}
