// Banned word commands: /addword, /removeword, /showwords and the page buttons.

use super::is_owner;
use crate::core::moderation::{AddOutcome, RemoveOutcome, WordError, WordPage};
use crate::telegram::{Data, HandlerResult};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

const PAGE_CALLBACK_PREFIX: &str = "words:";

pub async fn add_word(bot: &Bot, msg: &Message, data: &Data, raw: &str) -> HandlerResult {
    let reply = match data.words.add_word(raw).await {
        Ok(AddOutcome::Added) => {
            tracing::info!(word = raw.trim(), "Word added");
            format!(
                "✅ '{}' was added to the banned words.{}",
                raw.trim().to_lowercase(),
                total_suffix(data).await
            )
        }
        Ok(AddOutcome::AlreadyExists) => {
            format!("ℹ️ '{}' is already banned.", raw.trim().to_lowercase())
        }
        Err(WordError::EmptyWord) => "Please give a word. Example: /addword idiot".to_string(),
        Err(e) => {
            tracing::error!("Failed to add word: {}", e);
            format!("❌ Could not add '{}'.", raw.trim())
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn remove_word(bot: &Bot, msg: &Message, data: &Data, raw: &str) -> HandlerResult {
    let reply = match data.words.remove_word(raw).await {
        Ok(RemoveOutcome::Removed) => {
            tracing::info!(word = raw.trim(), "Word removed");
            format!(
                "✅ '{}' was removed from the banned words.{}",
                raw.trim().to_lowercase(),
                total_suffix(data).await
            )
        }
        Ok(RemoveOutcome::NotFound) => {
            format!("ℹ️ '{}' is not in the list.", raw.trim().to_lowercase())
        }
        Err(WordError::EmptyWord) => {
            "Please give the word to remove. Example: /removeword idiot".to_string()
        }
        Err(e) => {
            tracing::error!("Failed to remove word: {}", e);
            format!("❌ Could not remove '{}'.", raw.trim())
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// " (N in total)" after a change, or nothing if the count can't be read.
async fn total_suffix(data: &Data) -> String {
    match data.words.word_count().await {
        Ok(total) => format!(" ({} in total)", total),
        Err(e) => {
            tracing::warn!("Failed to count words: {}", e);
            String::new()
        }
    }
}

pub async fn show_words(bot: &Bot, msg: &Message, data: &Data) -> HandlerResult {
    match data.words.page(None).await {
        Ok(Some(page)) => {
            let (text, keyboard) = render_page(&page);
            let request = bot.send_message(msg.chat.id, text);
            match keyboard {
                Some(keyboard) => request.reply_markup(keyboard).await?,
                None => request.await?,
            };
        }
        Ok(None) => {
            bot.send_message(msg.chat.id, "The banned word list is empty.")
                .await?;
        }
        Err(e) => {
            tracing::error!("Failed to load word list: {}", e);
            bot.send_message(msg.chat.id, "❌ Could not load the word list.")
                .await?;
        }
    }
    Ok(())
}

/// Previous/next button presses: redraw the list message in place.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, data: Data) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    if !is_owner(&data, Some(q.from.id.0)) {
        return Ok(());
    }

    let Some(requested) = q.data.as_deref().and_then(parse_page_callback) else {
        return Ok(());
    };
    let Some(message) = q.regular_message() else {
        return Ok(());
    };

    let page = match data.words.page(Some(requested)).await {
        Ok(Some(page)) => page,
        Ok(None) => {
            bot.edit_message_text(message.chat.id, message.id, "The banned word list is empty.")
                .await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Failed to load word list page {}: {}", requested, e);
            return Ok(());
        }
    };

    let (text, keyboard) = render_page(&page);
    let request = bot.edit_message_text(message.chat.id, message.id, text);
    match keyboard {
        Some(keyboard) => request.reply_markup(keyboard).await?,
        None => request.await?,
    };

    Ok(())
}

pub fn render_page(page: &WordPage) -> (String, Option<InlineKeyboardMarkup>) {
    let mut text = format!(
        "Banned words ({} total, page {}/{}):\n",
        page.total_words,
        page.page + 1,
        page.total_pages
    );
    text.push_str(&page.words.join("\n"));

    let mut buttons = Vec::new();
    if page.has_previous() {
        buttons.push(InlineKeyboardButton::callback(
            "⏪ Previous",
            format!("{}{}", PAGE_CALLBACK_PREFIX, page.page - 1),
        ));
    }
    if page.has_next() {
        buttons.push(InlineKeyboardButton::callback(
            "Next ⏩",
            format!("{}{}", PAGE_CALLBACK_PREFIX, page.page + 1),
        ));
    }

    let keyboard = (!buttons.is_empty()).then(|| InlineKeyboardMarkup::new(vec![buttons]));
    (text, keyboard)
}

pub fn parse_page_callback(data: &str) -> Option<usize> {
    data.strip_prefix(PAGE_CALLBACK_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn page(page: usize, total_pages: usize) -> WordPage {
        WordPage {
            page,
            total_pages,
            total_words: 3,
            words: vec!["three".to_string(), "two".to_string()],
        }
    }

    fn callbacks(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
        keyboard.inline_keyboard[0]
            .iter()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_render_single_page() {
        let (text, keyboard) = render_page(&page(0, 1));

        assert_eq!(text, "Banned words (3 total, page 1/1):\nthree\ntwo");
        assert!(keyboard.is_none());
    }

    #[test]
    fn test_render_buttons() {
        let (_, keyboard) = render_page(&page(0, 3));
        assert_eq!(callbacks(&keyboard.unwrap()), vec!["words:1"]);

        let (_, keyboard) = render_page(&page(1, 3));
        assert_eq!(callbacks(&keyboard.unwrap()), vec!["words:0", "words:2"]);

        let (text, keyboard) = render_page(&page(2, 3));
        assert!(text.contains("page 3/3"));
        assert_eq!(callbacks(&keyboard.unwrap()), vec!["words:1"]);
    }

    #[test]
    fn test_parse_page_callback() {
        assert_eq!(parse_page_callback("words:4"), Some(4));
        assert_eq!(parse_page_callback("words:-1"), None);
        assert_eq!(parse_page_callback("other:1"), None);
        assert_eq!(parse_page_callback("words:"), None);
    }
}
