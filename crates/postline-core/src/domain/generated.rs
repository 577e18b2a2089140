//! Parsing of text returned by the content generator.
//!
//! Two shapes are understood:
//! - a batch of posts separated by `---`;
//! - a blog bundle with a title, a content block and one or more post blocks,
//!   each delimited by paired markers.
//!
//! In both shapes a post's hashtags are the last line that starts with `#`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::{DraftPost, NewBlogPost};

/// Separator between posts in a batch.
pub const POST_SEPARATOR: &str = "---";

pub const BLOG_TITLE_START: &str = "<BLOG_TITLE_START>";
pub const BLOG_TITLE_END: &str = "<BLOG_TITLE_END>";
pub const BLOG_CONTENT_START: &str = "<BLOG_CONTENT_START>";
pub const BLOG_CONTENT_END: &str = "<BLOG_CONTENT_END>";
pub const POST_START: &str = "<POST_START>";
pub const POST_END: &str = "<POST_END>";

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| block_regex(BLOG_TITLE_START, BLOG_TITLE_END));
static CONTENT_RE: LazyLock<Regex> =
    LazyLock::new(|| block_regex(BLOG_CONTENT_START, BLOG_CONTENT_END));
static POST_RE: LazyLock<Regex> = LazyLock::new(|| block_regex(POST_START, POST_END));

fn block_regex(start: &str, end: &str) -> Regex {
    // Markers are plain literals, so the pattern is always valid.
    Regex::new(&format!(
        "(?s){}(.*?){}",
        regex::escape(start),
        regex::escape(end)
    ))
    .expect("marker pattern is a valid regex")
}

/// Reasons generated text could not be turned into records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("generated text contained no posts")]
    NoPosts,

    #[error("generated text is missing the {0} block")]
    MissingBlock(&'static str),
}

/// A blog article and the posts derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogBundle {
    pub blog: NewBlogPost,
    pub posts: Vec<DraftPost>,
}

/// Split a post body from its trailing hashtag line.
///
/// The hashtag line is the last line beginning with `#`. Without one the whole
/// segment is body and the hashtags are empty. Returns `None` when no body is
/// left, since a post must have text.
pub fn split_post(segment: &str) -> Option<DraftPost> {
    let lines: Vec<&str> = segment.trim().lines().collect();
    let hashtag_line = lines
        .iter()
        .rposition(|line| line.trim_start().starts_with('#'));

    let draft = match hashtag_line {
        Some(idx) => {
            let body = lines
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, line)| *line)
                .collect::<Vec<_>>()
                .join("\n");
            DraftPost::new(body.trim(), lines[idx].trim())
        }
        None => DraftPost::new(lines.join("\n").trim(), ""),
    };

    (!draft.text.is_empty()).then_some(draft)
}

/// Parse a `---` separated batch of posts. Segments without body text are skipped.
pub fn parse_post_batch(raw: &str) -> Vec<DraftPost> {
    raw.split(POST_SEPARATOR).filter_map(split_post).collect()
}

/// Parse a blog bundle. Title, content and at least one post are all required;
/// if any is missing nothing is returned.
pub fn parse_blog_bundle(raw: &str) -> Result<BlogBundle, ParseError> {
    let title = capture(&TITLE_RE, raw).ok_or(ParseError::MissingBlock("title"))?;
    let content = capture(&CONTENT_RE, raw).ok_or(ParseError::MissingBlock("content"))?;

    let posts: Vec<DraftPost> = POST_RE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| split_post(m.as_str()))
        .collect();

    if posts.is_empty() {
        return Err(ParseError::NoPosts);
    }

    Ok(BlogBundle {
        blog: NewBlogPost {
            title: title.trim().to_string(),
            content: content.trim().to_string(),
        },
        posts,
    })
}

fn capture<'a>(re: &Regex, raw: &'a str) -> Option<&'a str> {
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_splits_body_and_hashtags() {
        let posts = parse_post_batch("Body one\n#tag1 #tag2---Body two\n#tag3");

        assert_eq!(
            posts,
            vec![
                DraftPost::new("Body one", "#tag1 #tag2"),
                DraftPost::new("Body two", "#tag3"),
            ]
        );
    }

    #[test]
    fn test_batch_skips_blank_segments() {
        let posts = parse_post_batch("\n---\nOnly one\n#solo\n---   \n");
        assert_eq!(posts, vec![DraftPost::new("Only one", "#solo")]);
    }

    #[test]
    fn test_segment_without_hashtags_is_all_body() {
        let post = split_post("Line one\nLine two\n").unwrap();
        assert_eq!(post, DraftPost::new("Line one\nLine two", ""));
    }

    #[test]
    fn test_last_hashtag_line_wins() {
        let post = split_post("#1 tip for today\nStay curious.\n#growth #learning\n").unwrap();
        assert_eq!(post.hashtags, "#growth #learning");
        assert_eq!(post.text, "#1 tip for today\nStay curious.");
    }

    #[test]
    fn test_trailing_text_after_hashtags_stays_in_body() {
        let post = split_post("Intro\n#rust\nSee you tomorrow").unwrap();
        assert_eq!(post.hashtags, "#rust");
        assert_eq!(post.text, "Intro\nSee you tomorrow");
    }

    #[test]
    fn test_hashtag_only_segment_is_skipped() {
        assert_eq!(split_post("  #tag #other  "), None);

        let posts = parse_post_batch("#lonely---Real body\n#tag");
        assert_eq!(posts, vec![DraftPost::new("Real body", "#tag")]);
    }

    #[test]
    fn test_empty_batch_yields_nothing() {
        assert!(parse_post_batch("   ").is_empty());
    }

    fn bundle_text() -> String {
        format!(
            "Sure! Here it is.\n{BLOG_TITLE_START} Ten Years of Rust {BLOG_TITLE_END}\n\
             {BLOG_CONTENT_START}\nParagraph one.\n\nParagraph two.\n{BLOG_CONTENT_END}\n\
             {POST_START}\nRead the new article!\n#rust #blog\n{POST_END}\n\
             {POST_START}\n   \n{POST_END}\n\
             {POST_START}\nA second teaser\n#ten\n{POST_END}\n"
        )
    }

    #[test]
    fn test_blog_bundle_extracts_all_blocks() {
        let bundle = parse_blog_bundle(&bundle_text()).unwrap();

        assert_eq!(bundle.blog.title, "Ten Years of Rust");
        assert_eq!(bundle.blog.content, "Paragraph one.\n\nParagraph two.");
        assert_eq!(
            bundle.posts,
            vec![
                DraftPost::new("Read the new article!", "#rust #blog"),
                DraftPost::new("A second teaser", "#ten"),
            ]
        );
    }

    #[test]
    fn test_blog_bundle_without_title_is_rejected() {
        let raw = bundle_text().replace(BLOG_TITLE_START, "");
        assert_eq!(
            parse_blog_bundle(&raw),
            Err(ParseError::MissingBlock("title"))
        );
    }

    #[test]
    fn test_blog_bundle_without_content_is_rejected() {
        let raw = bundle_text().replace(BLOG_CONTENT_END, "");
        assert_eq!(
            parse_blog_bundle(&raw),
            Err(ParseError::MissingBlock("content"))
        );
    }

    #[test]
    fn test_blog_bundle_without_posts_is_rejected() {
        let raw = format!(
            "{BLOG_TITLE_START}T{BLOG_TITLE_END}{BLOG_CONTENT_START}C{BLOG_CONTENT_END}\
             {POST_START}  {POST_END}"
        );
        assert_eq!(parse_blog_bundle(&raw), Err(ParseError::NoPosts));
    }
}
