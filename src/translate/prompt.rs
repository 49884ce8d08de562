use serde::{Deserialize, Serialize};

const PROMPT_TEMPLATE: &str = include_str!("../../static/prompt.md");

const NO_CONTEXT: &str = "None.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Fill the prompt template and split it into chat messages.
///
/// Sections start with a `## system`, `## user` or `## assistant` heading;
/// text before the first heading is ignored.
pub fn build_messages(schema: &str, context: Option<&str>, prompt: &str) -> Vec<ChatMessage> {
    build_messages_from(PROMPT_TEMPLATE, schema, context, prompt)
}

fn build_messages_from(
    template: &str,
    schema: &str,
    context: Option<&str>,
    prompt: &str,
) -> Vec<ChatMessage> {
    let context = context
        .map(str::trim)
        .filter(|context| !context.is_empty())
        .unwrap_or(NO_CONTEXT);

    let mut messages: Vec<ChatMessage> = Vec::new();
    let mut current: Option<(ChatRole, Vec<&str>)> = None;

    for line in template.lines() {
        if let Some(role) = parse_heading(line) {
            if let Some((role, lines)) = current.take() {
                messages.push(finish(role, &lines, schema, context, prompt));
            }
            current = Some((role, Vec::new()));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some((role, lines)) = current {
        messages.push(finish(role, &lines, schema, context, prompt));
    }

    messages
}

fn parse_heading(line: &str) -> Option<ChatRole> {
    match line.trim().strip_prefix("## ")?.trim().to_ascii_lowercase().as_str() {
        "system" => Some(ChatRole::System),
        "user" => Some(ChatRole::User),
        "assistant" => Some(ChatRole::Assistant),
        _ => None,
    }
}

fn finish(role: ChatRole, lines: &[&str], schema: &str, context: &str, prompt: &str) -> ChatMessage {
    let content = lines
        .iter()
        .map(|line| substitute(line, schema, context, prompt))
        .collect::<Vec<_>>()
        .join("\n");

    ChatMessage {
        role,
        content: content.trim().to_string(),
    }
}

/// Single pass over the line: substituted text is never scanned again.
fn substitute(line: &str, schema: &str, context: &str, prompt: &str) -> String {
    let placeholders = [
        ("{{schema}}", schema),
        ("{{table_context}}", context),
        ("{{user_request}}", prompt),
    ];

    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match placeholders.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Strip Markdown code fences and surrounding whitespace from a completion
pub fn extract_sql(completion: &str) -> String {
    let trimmed = completion.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    let body = strip_language_tag(rest).trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);

    body.trim().to_string()
}

/// Info strings a model puts after the opening fence
const LANGUAGE_TAGS: [&str; 5] = ["sql", "postgresql", "postgres", "pgsql", "psql"];

/// Drop a leading language tag, whether the query follows on the same line or the next
fn strip_language_tag(text: &str) -> &str {
    let (word, rest) = match text.find(char::is_whitespace) {
        Some(end) => text.split_at(end),
        None => (text, ""),
    };

    if LANGUAGE_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(word)) {
        rest
    } else {
        text
    }
}
