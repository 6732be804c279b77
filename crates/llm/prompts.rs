use crate::domain::value_objects::generation::ChatPrompt;

const CLIP_IDEAS_SYSTEM: &str = "You are a short-form video strategist. \
You turn a creator's topic into punchy clip ideas for TikTok, Reels and Shorts. \
Answer with one idea per line and nothing else.";

const CAPTIONS_SYSTEM: &str = "You write captions for short-form videos. \
Keep each caption under 150 characters and end with two relevant hashtags.";

pub fn clip_ideas(topic: &str, count: usize) -> ChatPrompt {
    ChatPrompt {
        system: CLIP_IDEAS_SYSTEM.to_string(),
        user: format!(
            "Topic: {}\n\nWrite {} distinct clip ideas. Each idea is a single line \
with a hook and what the clip shows.",
            topic.trim(),
            count
        ),
    }
}

pub fn captions(prompt: &str, input_path: Option<&str>) -> ChatPrompt {
    let source = match input_path {
        Some(path) => format!("Source file: {path}\n"),
        None => String::new(),
    };

    ChatPrompt {
        system: CAPTIONS_SYSTEM.to_string(),
        user: format!(
            "{source}Brief: {}\n\nWrite three caption options, one per line.",
            prompt.trim()
        ),
    }
}

/// Splits a completion into ideas: one per non-empty line, with list markers
/// (`-`, `*`, `•`, `1.`, `2)`) removed, capped at `max`.
pub fn parse_ideas(completion: &str, max: usize) -> Vec<String> {
    completion
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line
        .strip_prefix(['-', '*', '•'])
        .map(str::trim_start)
        .unwrap_or(line);

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(['.', ')', ':']) {
            return rest.trim_start();
        }
    }
    line
}
