// Content classifier - turns one message into a single verdict.
//
// Checks run in a fixed order and the first hit wins:
// banned word, link in text, mention, link entity, file type, story.
//
// Classification is pure and in-memory. It never fails; missing text is
// simply treated as "".

use super::moderation_models::{LinkEntity, ModerationConfig, ModerationEvent, Verdict};
use super::word_matcher::WordMatcher;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use url::Url;

// Scheme-qualified or www-qualified URLs
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(?:https?://|www\.)[^\s<>"']+"#).expect("valid URL regex"));

// `@name` at the start of a token; the leading group keeps e-mail addresses out
static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w@])@(\w+)").expect("valid mention regex"));

pub struct ContentClassifier {
    matcher: Arc<WordMatcher>,
    allowed_hosts: Vec<String>,
    blocked_extensions: Vec<String>,
    min_mention_length: usize,
}

impl ContentClassifier {
    pub fn new(matcher: Arc<WordMatcher>, config: &ModerationConfig) -> Self {
        Self {
            matcher,
            allowed_hosts: config
                .allowed_link_hosts
                .iter()
                .map(|h| h.trim().trim_end_matches('.').to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            blocked_extensions: config
                .blocked_file_extensions
                .iter()
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            min_mention_length: config.min_mention_length,
        }
    }

    /// Classify a whole event, including the story check.
    pub fn classify_event(&self, event: &ModerationEvent) -> Verdict {
        let verdict = self.classify(
            event.content_text(),
            &event.links,
            event.file_name.as_deref(),
        );

        if verdict.is_violation() {
            return verdict;
        }

        if event.is_story {
            return Verdict::StoryContent;
        }

        Verdict::None
    }

    /// Classify text, attached link entities and an optional file name.
    pub fn classify(&self, text: &str, links: &[LinkEntity], file_name: Option<&str>) -> Verdict {
        let text = text.to_lowercase();

        if self.matcher.contains_match(&text) {
            return Verdict::OffensiveWord;
        }

        if URL_RE
            .find_iter(&text)
            .any(|m| !self.is_allowed_link(m.as_str()))
        {
            return Verdict::DisallowedLink;
        }

        // Allowed links may carry `@` in their path (youtube.com/@channel).
        // Telegram also links bare `host/path` text, which only shows up as an entity.
        let mut without_links = URL_RE.replace_all(&text, " ").into_owned();
        for link in links {
            if let LinkEntity::Url(url) = link {
                let url = url.to_lowercase();
                if !url.is_empty() {
                    without_links = without_links.replace(&url, " ");
                }
            }
        }
        if self.contains_mention(&without_links) {
            return Verdict::DisallowedMention;
        }

        // Masked hyperlinks never show up in the text, so check entities too
        if links.iter().any(|link| !self.is_allowed_link(link.target())) {
            return Verdict::DisallowedLink;
        }

        if let Some(name) = file_name {
            if self.is_blocked_file(name) {
                return Verdict::DisallowedFile;
            }
        }

        Verdict::None
    }

    fn contains_mention(&self, text: &str) -> bool {
        MENTION_RE.captures_iter(text).any(|caps| {
            caps.get(1)
                .is_some_and(|name| name.as_str().chars().count() >= self.min_mention_length)
        })
    }

    /// Parse `raw` as a URL and check its host against the allow-list.
    ///
    /// Anything that can't be parsed or has no host is not allowed.
    pub fn is_allowed_link(&self, raw: &str) -> bool {
        let raw = raw.trim();
        let parsed = if raw.contains("://") {
            Url::parse(raw)
        } else {
            Url::parse(&format!("http://{}", raw))
        };

        match parsed {
            Ok(url) => url.host_str().is_some_and(|host| self.is_allowed_host(host)),
            Err(_) => false,
        }
    }

    /// Exact domain or any subdomain of it; never a plain substring test.
    fn is_allowed_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_lowercase();
        self.allowed_hosts.iter().any(|allowed| {
            host == *allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    fn is_blocked_file(&self, file_name: &str) -> bool {
        let name = file_name.trim().to_lowercase();
        self.blocked_extensions.iter().any(|ext| name.ends_with(ext))
    }
}
