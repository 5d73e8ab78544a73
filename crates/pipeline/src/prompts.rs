//! Prompt templates for the four stages.
//!
//! The output formats requested here are the grammars the stage parsers
//! accept; change them together.

/// Memory block used when no stored fact matches the topic.
pub const NO_MEMORY: &str = "No memory found for this topic.";

/// Reply the research model gives when it cannot cite anything.
pub const INSUFFICIENT_INFORMATION: &str = "Insufficient reliable information available.";

pub fn research(topic: &str, search_results: &str) -> String {
    format!(
        r#"You are a senior research assistant with strict standards for factual accuracy.
Collect ONLY objective, verifiable information about the topic below, using the web search results provided.

TOPIC: {topic}

Constraints:
- Use ONLY facts that appear in the search results. If a fact is not there, leave it out.
- End EVERY bullet with a markdown link to its exact source: [Source](URL)
- Do not include any fact, figure or name that is not directly supported by a cited source.
- No speculation, no opinions, no summaries of opinions.
- Group facts under clearly labelled markdown headings (##).

FORMAT:
- Clean markdown: headings and bullet points, one fact per bullet.
- Every bullet ends with [Source](URL).
- Paraphrase concisely; do not copy search snippets verbatim.
- If the topic is too new or obscure to find real facts, reply exactly: "{INSUFFICIENT_INFORMATION}"

Use only the context below:

{search_results}
"#
    )
}

pub fn validation(memory: &str, encyclopedia: &str, draft: &str) -> String {
    format!(
        r#"You are a senior fact-checker known for precision and honesty.

Verify the factual accuracy of the draft below using:
- Memory facts from previous research
- Encyclopedia excerpts
- General knowledge

Be strict:
- Fully supported by memory or the encyclopedia: mark it True
- Memory facts tagged "(previously: False)" were rejected on an earlier check and support nothing
- Contradicts verified information: mark it False and give a correction
- Unclear: mark it Uncertain and briefly say why
- Do not guess or invent facts

Answer with one line per statement, in exactly this format:
- "Original statement" — True/False/Uncertain — short reason — Correction: "corrected statement" (only if False)

Example:
- "The Eiffel Tower is in Berlin." — False — The encyclopedia places it in Paris — Correction: "The Eiffel Tower is in Paris."

FACTUAL MEMORY:
{memory}

ENCYCLOPEDIA RESULTS:
{encyclopedia}

DRAFT TEXT:
{draft}
"#
    )
}

pub fn article(topic: &str, validated_facts: &str) -> String {
    format!(
        r#"You are a professional blog writer composing a comprehensive, factual and engaging article.
Use ONLY the validated facts below.

Facts:
{validated_facts}

Topic: {topic}

Guidelines:
- Structure the article with markdown headings (##, ###)
- Use bullet points or tables where they help readability
- Do not include any information that is not in the facts
- Every major claim MUST carry a [Source](URL) citation right after it
- No speculation, opinion or invented detail
- End with a '## References' section listing every unique URL used

Return ONLY the article as clean, ready-to-publish markdown.
"#
    )
}

pub fn citation(urls: &[&str]) -> String {
    let list = urls.join("\n");
    format!(
        r#"Rewrite each citation URL below into a short, professional source description.

Rules:
- One line per URL, in the same order as the input. No extra lines.
- At most 10 words per description.
- If the source looks low quality (personal blogs such as blogspot or medium), write "Unreliable source" instead.

Example input:
https://www.nytimes.com/2023/01/01/ai-google-news.html

Example output:
Google AI announcement (The New York Times)

URLs:
{list}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_prompt_embeds_inputs() {
        let p = research("solar eclipses", "NASA\nhttps://nasa.gov\nEclipses...");
        assert!(p.contains("TOPIC: solar eclipses"));
        assert!(p.contains("https://nasa.gov"));
        assert!(p.contains("[Source](URL)"));
        assert!(p.contains(INSUFFICIENT_INFORMATION));
    }

    #[test]
    fn validation_prompt_sections_in_order() {
        let p = validation(NO_MEMORY, "Page: Eclipse", "- claim [Source](https://a.org)");
        let m = p.find("FACTUAL MEMORY:").unwrap();
        let e = p.find("ENCYCLOPEDIA RESULTS:").unwrap();
        let d = p.find("DRAFT TEXT:").unwrap();
        assert!(m < e && e < d);
        assert!(p.contains(NO_MEMORY));
    }

    #[test]
    fn citation_prompt_lists_urls_one_per_line() {
        let p = citation(&["https://a.org", "https://b.org"]);
        assert!(p.contains("https://a.org\nhttps://b.org"));
    }
}
