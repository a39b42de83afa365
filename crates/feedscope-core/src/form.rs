//! Product creation form state.

use feedscope_api_models::{ProductCreate, ScraperConfigInput};
use thiserror::Error;

/// Editable form fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    /// Product display name (required).
    Name,
    /// Web search query (optional).
    SearchQuery,
    /// Comma-separated YouTube keywords (required).
    YoutubeKeywords,
    /// Comma-separated subreddit names (required).
    RedditSubreddits,
}

impl FormField {
    /// Fields in display order.
    pub const ALL: [Self; 4] = [
        Self::Name,
        Self::SearchQuery,
        Self::YoutubeKeywords,
        Self::RedditSubreddits,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Product Name",
            Self::SearchQuery => "Search Query",
            Self::YoutubeKeywords => "YouTube Keywords",
            Self::RedditSubreddits => "Reddit Subreddits",
        }
    }

    /// Whether a blank value blocks submission.
    #[must_use]
    pub const fn required(self) -> bool {
        !matches!(self, Self::SearchQuery)
    }
}

/// Local rejections raised before any network call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FormError {
    /// A required field is blank.
    #[error("{} is required", .0.label())]
    MissingField(FormField),
    /// A submission is already in flight.
    #[error("a submission is already in progress")]
    InFlight,
}

/// Local state of the creation form. Nothing persists until submit succeeds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductForm {
    name: String,
    search_query: String,
    youtube_keywords: String,
    reddit_subreddits: String,
    submitting: bool,
    error: Option<String>,
}

impl ProductForm {
    /// Empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a field's raw text.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Name => self.name = value,
            FormField::SearchQuery => self.search_query = value,
            FormField::YoutubeKeywords => self.youtube_keywords = value,
            FormField::RedditSubreddits => self.reddit_subreddits = value,
        }
    }

    /// Raw text of a field.
    #[must_use]
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::SearchQuery => &self.search_query,
            FormField::YoutubeKeywords => &self.youtube_keywords,
            FormField::RedditSubreddits => &self.reddit_subreddits,
        }
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Inline error from the last failed submission.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Check required-field presence only.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingField`] for the first blank required field.
    pub fn validate(&self) -> Result<(), FormError> {
        FormField::ALL
            .into_iter()
            .filter(|field| field.required())
            .find(|field| self.get(*field).trim().is_empty())
            .map_or(Ok(()), |field| Err(FormError::MissingField(field)))
    }

    /// Build the request body from the current fields.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingField`] when a required field is blank.
    pub fn payload(&self) -> Result<ProductCreate, FormError> {
        self.validate()?;
        Ok(ProductCreate {
            name: self.name.clone(),
            config: ScraperConfigInput {
                search_query: optional_text(&self.search_query),
                youtube_keywords: split_list(&self.youtube_keywords),
                reddit_subreddits: split_list(&self.reddit_subreddits),
            },
        })
    }

    /// Enter the submitting state and return the payload to send.
    ///
    /// # Errors
    ///
    /// Refuses while a submission is in flight or when a required field is blank.
    pub fn begin_submit(&mut self) -> Result<ProductCreate, FormError> {
        if self.submitting {
            return Err(FormError::InFlight);
        }
        let payload = self.payload()?;
        self.submitting = true;
        self.error = None;
        Ok(payload)
    }

    /// Successful submission: every field is cleared.
    pub fn finish_success(&mut self) {
        *self = Self::default();
    }

    /// Failed submission: fields are kept for correction and the error is shown inline.
    pub fn finish_failure(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.error = Some(message.into());
    }

    /// Submission abandoned before it settled: fields and inline error stay as they are.
    pub fn abandon_submit(&mut self) {
        self.submitting = false;
    }
}

/// Notification shown while a creation request is in flight.
pub const CREATE_LOADING_MESSAGE: &str = "Adding product...";

/// Notification shown after a product was created.
pub const CREATE_SUCCESS_MESSAGE: &str = "Product added successfully!";

/// Notification shown when creation failed.
#[must_use]
pub fn create_failure_message(error: &str) -> String {
    format!("Error: {error}")
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
