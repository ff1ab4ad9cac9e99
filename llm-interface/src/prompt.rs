//! The blog post prompt.
//!
//! The wording is part of the output contract: the nine numbered directives
//! and the closing "References" instruction are what make providers produce
//! a structured post that cites its sources.

use redscribe_core::GenerationRequest;

pub const BLOG_POST_TEMPLATE: &str = r#"Create a comprehensive and engaging blog post based on the following combined text from Reddit search results about {keyword}:

{reddit_content}

Follow these instructions to create the blog post:

1. Title: Generate an attention-grabbing title that accurately reflects the main topic.

2. Introduction (1-2 paragraphs):
   - Begin with a hook to capture the reader's interest.
   - Provide context about the topic ({keyword}).
   - Briefly outline what the blog post will cover.

3. Main Body (3-5 sections):
   - Organize the information from Reddit into coherent themes or subtopics.
   - For each section:
     * Use a clear subheading.
     * Present the main ideas and insights from the Reddit posts.
     * Include relevant examples or anecdotes from the Reddit content.
     * Ensure smooth transitions between sections.

4. Expert Insights or Analysis (1-2 paragraphs):
   - Offer a deeper analysis of the topic based on the Reddit discussions.
   - Identify trends, patterns, or conflicting viewpoints if present.

5. Practical Applications or Takeaways (1 paragraph):
   - Provide actionable advice or insights readers can apply.

6. Conclusion (1 paragraph):
   - Summarize the key points discussed in the blog post.
   - End with a thought-provoking statement or call-to-action.

7. Writing Style:
   - Use a conversational yet informative tone.
   - Ensure the content is well-structured and easy to read.
   - Include transitional phrases to improve flow between paragraphs and sections.

8. Final Check:
   - Ensure the blog post is coherent, engaging, and provides value to the reader.
   - Make sure it accurately represents the main ideas from the Reddit content without directly quoting or naming specific users.

9. References:
   - At the end of the blog post, include a "References" section.
   - List the references in the following format:
{references}

Generate the complete blog post following these instructions, including the references section at the end.
"#;

pub fn render_blog_prompt(request: &GenerationRequest) -> String {
    render_template(
        BLOG_POST_TEMPLATE,
        &[
            ("reddit_content", request.combined_text.as_str()),
            ("keyword", request.keyword.as_str()),
            ("references", request.formatted_references.as_str()),
        ],
    )
}

/// Substitutes `{name}` placeholders in one pass, so braces inside the
/// substituted values are never expanded.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(
        template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let substitution = after_open.find('}').and_then(|close| {
            let name = &after_open[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match substitution {
            Some((value, close)) => {
                rendered.push_str(value);
                rest = &after_open[close + 1..];
            }
            None => {
                rendered.push('{');
                rest = after_open;
            }
        }
    }

    rendered.push_str(rest);
    rendered
}
