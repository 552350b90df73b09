//! Prompt templates for each generation stage.

/// Only this much of the source text reaches the researcher.
pub const RESEARCH_EXCERPT_CHARS: usize = 4000;

pub fn researcher(transcript: &str) -> String {
    let excerpt = crate::utils::truncate_chars(transcript, RESEARCH_EXCERPT_CHARS);
    format!(
        "You are a content researcher. Analyze this content and extract the 5 most important key points or tips.

Content:
{excerpt}

Provide ONLY the 5 key points in a clear, numbered list. Be concise."
    )
}

pub fn writer(key_points: &str) -> String {
    format!(
        "You are a social media expert. Create an engaging LinkedIn post based on these key points:

{key_points}

Requirements:
- Start with a hook that grabs attention
- Use emojis strategically (2-3 max)
- Keep it under 200 words
- End with a call-to-action or question
- Professional but conversational tone

Write the LinkedIn post now:"
    )
}

pub fn thread_writer(key_points: &str) -> String {
    format!(
        "You are a viral Twitter/X content creator. Create an engaging thread based on these key points:

{key_points}

Requirements:
- First tweet: Hook that stops the scroll (under 280 characters)
- Then 4-6 tweets, each under 280 characters
- Use emojis strategically
- Make it conversational and engaging
- End with a call-to-action
- Number each tweet (1/6, 2/6, etc.)

Format each tweet on a new line starting with the number.

Write the thread now:"
    )
}

pub fn artist(linkedin_post: &str) -> String {
    format!(
        "You are a creative visual designer. Based on this LinkedIn post, describe an image that would perfectly complement it.

LinkedIn Post:
{linkedin_post}

Create a detailed image description (1-2 sentences) that:
- Captures the main theme
- Would work well on social media
- Is professional and eye-catching

Image description:"
    )
}
