// Moderation domain models - data structures for the content filter.
//
// These are pure domain types with no Telegram dependencies.
// The Telegram layer converts incoming messages into these and
// turns the resulting verdicts into delete calls.

use serde::Deserialize;
use std::time::Duration;

/// Why a message has to go. `None` means the message is fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing matched
    None,
    /// Text or caption contains a banned word
    OffensiveWord,
    /// Link to a host that is not on the allow-list
    DisallowedLink,
    /// `@username` style mention
    DisallowedMention,
    /// Attached file with a blocked extension
    DisallowedFile,
    /// Story posts are never allowed
    StoryContent,
}

impl Verdict {
    pub fn is_violation(&self) -> bool {
        !matches!(self, Verdict::None)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::None => write!(f, "None"),
            Verdict::OffensiveWord => write!(f, "Offensive Word"),
            Verdict::DisallowedLink => write!(f, "Disallowed Link"),
            Verdict::DisallowedMention => write!(f, "Disallowed Mention"),
            Verdict::DisallowedFile => write!(f, "Disallowed File"),
            Verdict::StoryContent => write!(f, "Story Content"),
        }
    }
}

/// Where a message was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    /// One-on-one chat with the bot
    Private,
    /// Group, supergroup or channel
    MultiParty,
}

/// A structured link attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEntity {
    /// A URL written out in the message text
    Url(String),
    /// A hyperlink hidden behind other text; holds the target URL
    TextLink(String),
}

impl LinkEntity {
    pub fn target(&self) -> &str {
        match self {
            LinkEntity::Url(url) | LinkEntity::TextLink(url) => url,
        }
    }
}

/// One inbound message, already stripped of platform types.
#[derive(Debug, Clone)]
pub struct ModerationEvent {
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub message_id: i32,
    /// `None` for channel posts. Anonymous admins show up as Telegram's
    /// placeholder bot user, see `anonymous_admin`.
    pub sender_id: Option<u64>,
    /// Posted on behalf of the chat itself, which only its admins can do
    pub anonymous_admin: bool,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub links: Vec<LinkEntity>,
    pub file_name: Option<String>,
    /// Shared by every part of an album
    pub media_group_id: Option<String>,
    pub is_story: bool,
}

impl ModerationEvent {
    /// Message body, falling back to the caption, falling back to "".
    pub fn content_text(&self) -> &str {
        self.text
            .as_deref()
            .or(self.caption.as_deref())
            .unwrap_or("")
    }

    pub fn group_key(&self) -> Option<GroupKey> {
        self.media_group_id.as_ref().map(|group_id| GroupKey {
            chat_id: self.chat_id,
            group_id: group_id.clone(),
        })
    }
}

/// Identifies one grouped submission. Group ids are only unique per chat.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct GroupKey {
    pub chat_id: i64,
    pub group_id: String,
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.group_id)
    }
}

/// What the orchestrator did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// Sender is the owner, an admin (anonymous or not), or has left the chat
    Exempt,
    /// Nothing to do
    Clean,
    /// Message was deleted (or was already gone)
    Deleted(Verdict),
    /// Deletion was refused by the platform
    DeleteFailed(Verdict),
    /// Part of a group; the decision happens when the quiet window closes
    Deferred(Verdict),
}

/// Configuration for the content filter.
///
/// Missing fields fall back to the defaults, so a partial override is enough.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Hosts (and their subdomains) that may be linked
    pub allowed_link_hosts: Vec<String>,
    /// File name suffixes that get deleted, e.g. ".apk"
    pub blocked_file_extensions: Vec<String>,
    /// Minimum number of word characters after `@` to count as a mention
    pub min_mention_length: usize,
    /// How long to wait for the rest of an album before deciding
    pub group_quiet_period_ms: u64,
    /// Page size for the banned word listing
    pub words_per_page: usize,
}

impl ModerationConfig {
    pub fn group_quiet_period(&self) -> Duration {
        Duration::from_millis(self.group_quiet_period_ms)
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            allowed_link_hosts: vec!["youtube.com".to_string(), "youtu.be".to_string()],
            blocked_file_extensions: vec![".apk".to_string()],
            min_mention_length: 5,
            group_quiet_period_ms: 3_000, // 3 seconds
            words_per_page: 50,
        }
    }
}

/// One page of the banned word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPage {
    /// Zero-based
    pub page: usize,
    pub total_pages: usize,
    pub total_words: usize,
    pub words: Vec<String>,
}

impl WordPage {
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}
