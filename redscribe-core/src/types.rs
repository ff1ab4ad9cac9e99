use crate::CoreError;
use std::fmt;

/// A keyword search scoped to one subreddit, or to all of Reddit when
/// `channel` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub channel: String,
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(
        keyword: impl Into<String>,
        channel: impl Into<String>,
        limit: u32,
        max_limit: u32,
    ) -> Result<Self, CoreError> {
        let keyword = keyword.into().trim().to_string();
        if keyword.is_empty() {
            return Err(CoreError::invalid_input("Search keyword must not be empty"));
        }
        if limit == 0 || limit > max_limit {
            return Err(CoreError::invalid_input(format!(
                "Fetch limit must be between 1 and {max_limit}, got {limit}"
            )));
        }

        let channel = channel.into();
        let channel = channel.trim();
        let channel = channel
            .strip_prefix("/r/")
            .or_else(|| channel.strip_prefix("r/"))
            .unwrap_or(channel)
            .to_string();

        Ok(Self {
            keyword,
            channel,
            limit,
        })
    }

    pub fn is_unscoped(&self) -> bool {
        self.channel.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

/// Output of one fetch: the combined text and its citations, both in fetch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedContent {
    pub combined_text: String,
    pub references: Vec<Reference>,
}

impl FetchedContent {
    pub fn push(&mut self, document: &Document, reference: Reference) {
        self.combined_text.push_str("Title: ");
        self.combined_text.push_str(&document.title);
        self.combined_text.push_str("\nText: ");
        self.combined_text.push_str(&document.body);
        self.combined_text.push_str("\n\n");
        self.references.push(reference);
    }

    pub fn document_count(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Renders references as a 1-indexed Markdown link list, one per line.
pub fn format_references(references: &[Reference]) -> String {
    references
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. [{}]({})", i + 1, r.title, r.url))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Clone)]
pub struct GenerationRequest {
    pub api_key: String,
    pub combined_text: String,
    pub keyword: String,
    pub formatted_references: String,
}

impl GenerationRequest {
    pub fn new(api_key: impl Into<String>, keyword: impl Into<String>, content: &FetchedContent) -> Self {
        Self {
            api_key: api_key.into(),
            combined_text: content.combined_text.clone(),
            keyword: keyword.into(),
            formatted_references: format_references(&content.references),
        }
    }
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("api_key", &"<redacted>")
            .field("combined_text_len", &self.combined_text.len())
            .field("keyword", &self.keyword)
            .field("formatted_references", &self.formatted_references)
            .finish()
    }
}

/// The provider's completion, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost {
    pub content: String,
}

impl GeneratedPost {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}
